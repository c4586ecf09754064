//! The 52-card ring: suits, ranks, and the absolute index that ties them together.
//!
//! Absolute indices run Hearts 1–13, Clubs 14–26, Diamonds 27–39, Spades 40–52,
//! each suit in rank order Ace through King.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    Hearts,
    Clubs,
    Diamonds,
    Spades,
}

impl Suit {
    /// Suits in ring order.
    pub const RING: [Suit; 4] = [Suit::Hearts, Suit::Clubs, Suit::Diamonds, Suit::Spades];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hearts => "hearts",
            Self::Clubs => "clubs",
            Self::Diamonds => "diamonds",
            Self::Spades => "spades",
        }
    }

    /// Capitalised plural used in full card names ("Four of Clubs").
    pub fn title(&self) -> &'static str {
        match self {
            Self::Hearts => "Hearts",
            Self::Clubs => "Clubs",
            Self::Diamonds => "Diamonds",
            Self::Spades => "Spades",
        }
    }

    pub fn glyph(&self) -> char {
        match self {
            Self::Hearts => '♥',
            Self::Clubs => '♣',
            Self::Diamonds => '♦',
            Self::Spades => '♠',
        }
    }

    /// Zero-based block of thirteen this suit occupies on the ring.
    pub fn ring_offset(&self) -> u8 {
        match self {
            Self::Hearts => 0,
            Self::Clubs => 1,
            Self::Diamonds => 2,
            Self::Spades => 3,
        }
    }

    fn from_glyph(c: char) -> Option<Self> {
        match c {
            '♥' | '♡' | 'H' | 'h' => Some(Self::Hearts),
            '♣' | '♧' | 'C' | 'c' => Some(Self::Clubs),
            '♦' | '♢' | 'D' | 'd' => Some(Self::Diamonds),
            '♠' | '♤' | 'S' | 's' => Some(Self::Spades),
            _ => None,
        }
    }

    fn from_title(s: &str) -> Option<Self> {
        Self::RING
            .into_iter()
            .find(|suit| suit.title().eq_ignore_ascii_case(s) || suit.as_str().eq_ignore_ascii_case(s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    Ace = 1,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ];

    /// Numeric value, Ace = 1 through King = 13.
    pub fn value(&self) -> u8 {
        *self as u8
    }

    pub fn from_value(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value).checked_sub(1)?).copied()
    }

    /// Compact token used in symbols.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ace => "A",
            Self::Two => "2",
            Self::Three => "3",
            Self::Four => "4",
            Self::Five => "5",
            Self::Six => "6",
            Self::Seven => "7",
            Self::Eight => "8",
            Self::Nine => "9",
            Self::Ten => "10",
            Self::Jack => "J",
            Self::Queen => "Q",
            Self::King => "K",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Ace => "Ace",
            Self::Two => "Two",
            Self::Three => "Three",
            Self::Four => "Four",
            Self::Five => "Five",
            Self::Six => "Six",
            Self::Seven => "Seven",
            Self::Eight => "Eight",
            Self::Nine => "Nine",
            Self::Ten => "Ten",
            Self::Jack => "Jack",
            Self::Queen => "Queen",
            Self::King => "King",
        }
    }

    fn from_token(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|rank| rank.as_str().eq_ignore_ascii_case(s))
    }

    fn from_title(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|rank| rank.title().eq_ignore_ascii_case(s))
    }
}

/// A single card on the ring.
///
/// Serialises as its compact symbol (`"4♣"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Card {
    suit: Suit,
    rank: Rank,
}

impl Card {
    /// Number of cards on the ring.
    pub const COUNT: u8 = 52;

    pub fn new(suit: Suit, rank: Rank) -> Self {
        Self { suit, rank }
    }

    /// Decode an absolute ring index in `1..=52`.
    pub fn from_index(n: u32) -> Result<Self, CoreError> {
        if !(1..=u32::from(Self::COUNT)).contains(&n) {
            return Err(CoreError::IndexOutOfRange(n));
        }
        Ok(Self::from_ring_value(n))
    }

    /// Parse a compact symbol such as `"4♣"`, `"10♥"` or `"QS"`.
    pub fn from_symbol(symbol: &str) -> Result<Self, CoreError> {
        let trimmed = symbol.trim();
        let unknown = || CoreError::UnknownSymbol(symbol.to_string());
        let glyph = trimmed.chars().last().ok_or_else(unknown)?;
        let suit = Suit::from_glyph(glyph).ok_or_else(unknown)?;
        let rank_token = &trimmed[..trimmed.len() - glyph.len_utf8()];
        let rank = Rank::from_token(rank_token.trim()).ok_or_else(unknown)?;
        Ok(Self { suit, rank })
    }

    /// Parse a full name such as `"Four of Clubs"`.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        let unknown = || CoreError::UnknownName(name.to_string());
        let (rank, suit) = name.trim().split_once(" of ").ok_or_else(unknown)?;
        let rank = Rank::from_title(rank.trim()).ok_or_else(unknown)?;
        let suit = Suit::from_title(suit.trim()).ok_or_else(unknown)?;
        Ok(Self { suit, rank })
    }

    /// Card for a ring value already known to be in `1..=52`; larger values wrap.
    pub(crate) fn from_ring_value(v: u32) -> Self {
        let zero_based = (v.max(1) - 1) as usize % usize::from(Self::COUNT);
        Self {
            suit: Suit::RING[zero_based / 13],
            rank: Rank::ALL[zero_based % 13],
        }
    }

    pub fn suit(&self) -> Suit {
        self.suit
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// Absolute ring index in `1..=52`.
    pub fn index(&self) -> u8 {
        self.suit.ring_offset() * 13 + self.rank.value()
    }

    pub fn symbol(&self) -> String {
        format!("{}{}", self.rank.as_str(), self.suit.glyph())
    }

    pub fn name(&self) -> String {
        format!("{} of {}", self.rank.title(), self.suit.title())
    }

    /// Every card in ring order, `A♥` through `K♠`.
    pub fn all() -> impl Iterator<Item = Card> {
        Suit::RING
            .into_iter()
            .flat_map(|suit| Rank::ALL.into_iter().map(move |rank| Card::new(suit, rank)))
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.as_str(), self.suit.glyph())
    }
}

impl FromStr for Card {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_symbol(s)
    }
}

impl From<Card> for String {
    fn from(card: Card) -> Self {
        card.symbol()
    }
}

impl TryFrom<String> for Card {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_symbol(&value)
    }
}
