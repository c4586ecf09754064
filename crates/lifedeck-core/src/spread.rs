//! Age-indexed spreads and the 13-position window drawn from them.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::CoreError;
use crate::birth::fallback_year_card;
use crate::card::Card;
use crate::correlation::{PositionCorrelation, PositionCorrelationMapper};
use crate::reference::ReferenceDataSource;

/// Highest age with its own spread row.
pub const MAX_DIRECT_AGE: u32 = 45;

/// Cards in a positioned window.
pub const WINDOW_SIZE: usize = 13;

/// Map a requested age onto a spread row.
///
/// Ages `0..=45` map to themselves; anything older wraps to `(age % 46) + 1`,
/// which lands in `1..=46` and never on row 0.
pub fn effective_age(age: u32) -> u32 {
    if age <= MAX_DIRECT_AGE {
        age
    } else {
        age % (MAX_DIRECT_AGE + 1) + 1
    }
}

/// One row of the spread table: an ordered cycle of distinct cards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spread {
    age: u32,
    cards: Vec<Card>,
}

impl Spread {
    /// Build a row, rejecting empty rows and repeated cards.
    ///
    /// Shipped tables always hold all 52 cards; [`Spread::is_complete`]
    /// tells the two apart for loaders that insist on it.
    pub fn new(age: u32, cards: Vec<Card>) -> Result<Self, CoreError> {
        if cards.is_empty() {
            return Err(CoreError::DataUnavailable(format!("spread for age {age} is empty")));
        }
        let mut seen = HashSet::with_capacity(cards.len());
        if let Some(dup) = cards.iter().find(|c| !seen.insert(**c)) {
            return Err(CoreError::DataUnavailable(format!(
                "spread for age {age} repeats {dup}"
            )));
        }
        Ok(Self { age, cards })
    }

    pub fn from_symbols<S: AsRef<str>>(age: u32, symbols: &[S]) -> Result<Self, CoreError> {
        let cards = symbols
            .iter()
            .map(|s| Card::from_symbol(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(age, cards)
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// True when the row is a permutation of the whole ring.
    pub fn is_complete(&self) -> bool {
        self.cards.len() == usize::from(Card::COUNT)
    }

    pub fn index_of(&self, card: Card) -> Option<usize> {
        self.cards.iter().position(|c| *c == card)
    }

    /// Card at `index`, wrapping cyclically.
    pub fn card_at(&self, index: usize) -> Card {
        self.cards[index % self.cards.len()]
    }

    /// `WINDOW_SIZE` consecutive cards starting at `start`, wrapping.
    pub fn window(&self, start: usize) -> impl Iterator<Item = Card> + '_ {
        (0..WINDOW_SIZE).map(move |i| self.card_at(start + i))
    }
}

/// Age-indexed access to spread rows.
#[derive(Clone, Copy)]
pub struct SpreadTable<'a> {
    source: &'a dyn ReferenceDataSource,
}

impl<'a> SpreadTable<'a> {
    pub fn new(source: &'a dyn ReferenceDataSource) -> Self {
        Self { source }
    }

    pub fn get_spread(&self, age: u32) -> Result<&'a Spread, CoreError> {
        let effective_age = effective_age(age);
        self.source
            .spread(effective_age)
            .ok_or(CoreError::SpreadUnavailable { age, effective_age })
    }

    /// The natural, age-0 row.
    pub fn zero(&self) -> Result<&'a Spread, CoreError> {
        self.get_spread(0)
    }
}

/// The thirteen fixed position labels, in window order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Position {
    Sun,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
    Result,
    Peak,
    Moon,
    Earth,
}

impl Position {
    pub const ALL: [Position; WINDOW_SIZE] = [
        Position::Sun,
        Position::Mercury,
        Position::Venus,
        Position::Mars,
        Position::Jupiter,
        Position::Saturn,
        Position::Uranus,
        Position::Neptune,
        Position::Pluto,
        Position::Result,
        Position::Peak,
        Position::Moon,
        Position::Earth,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Sun => "Sun",
            Self::Mercury => "Mercury",
            Self::Venus => "Venus",
            Self::Mars => "Mars",
            Self::Jupiter => "Jupiter",
            Self::Saturn => "Saturn",
            Self::Uranus => "Uranus",
            Self::Neptune => "Neptune",
            Self::Pluto => "Pluto",
            Self::Result => "Result",
            Self::Peak => "Peak",
            Self::Moon => "Moon",
            Self::Earth => "Earth/Transformation",
        }
    }

    /// Offset of this position from the window start.
    pub fn offset(&self) -> usize {
        *self as usize
    }

    pub fn from_offset(offset: usize) -> Option<Self> {
        Self::ALL.get(offset).copied()
    }
}

/// How a lookup that misses its table is handled at a given call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupPolicy {
    /// A miss is an error.
    #[default]
    Strict,
    /// A miss substitutes the arithmetic fallback year card as the anchor.
    ArithmeticFallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PositionedCard {
    pub position: Position,
    pub card: Card,
    /// Where this card sits when the same window is laid over the age-0 row.
    pub natural_position: Option<Position>,
}

impl PositionedCard {
    pub fn is_aligned(&self) -> bool {
        self.natural_position == Some(self.position)
    }
}

/// A resolved 13-card window plus the card it displaces.
#[derive(Debug, Clone, Serialize)]
pub struct PositionedSpread {
    pub requested_age: u32,
    pub effective_age: u32,
    /// Card the caller asked to anchor on.
    pub subject_card: Card,
    /// Card actually found in the row; differs from `subject_card` only
    /// when a fallback anchor was substituted.
    pub anchor: Card,
    pub anchor_index: usize,
    pub cards: Vec<PositionedCard>,
    /// Card at `anchor_index` in the age-0 row.
    pub displacing_card: Card,
}

impl PositionedSpread {
    pub fn is_fallback(&self) -> bool {
        self.anchor != self.subject_card
    }

    pub fn card_at(&self, position: Position) -> Option<&PositionedCard> {
        self.cards.iter().find(|pc| pc.position == position)
    }

    /// Cards whose position falls in `from..=to`.
    pub fn range(&self, from: Position, to: Position) -> &[PositionedCard] {
        let end = (to.offset() + 1).min(self.cards.len());
        let start = from.offset().min(end);
        &self.cards[start..end]
    }

    pub fn correlations(&self) -> Vec<PositionCorrelation> {
        self.cards.iter().map(PositionCorrelation::from).collect()
    }
}

/// Draws positioned windows out of the spread table.
pub struct SpreadResolver<'a> {
    table: SpreadTable<'a>,
}

impl<'a> SpreadResolver<'a> {
    pub fn new(source: &'a dyn ReferenceDataSource) -> Self {
        Self {
            table: SpreadTable::new(source),
        }
    }

    pub fn table(&self) -> SpreadTable<'a> {
        self.table
    }

    /// Resolve the 13-card window anchored at `card` in the row for `age`.
    pub fn resolve(
        &self,
        card: Card,
        age: u32,
        policy: LookupPolicy,
    ) -> Result<PositionedSpread, CoreError> {
        let age_spread = self.table.get_spread(age)?;
        let zero_spread = self.table.zero()?;

        let (anchor, anchor_index) = match age_spread.index_of(card) {
            Some(idx) => (card, idx),
            None => match policy {
                LookupPolicy::Strict => return Err(CoreError::SpreadResolution { card, age }),
                LookupPolicy::ArithmeticFallback => {
                    let fallback = fallback_year_card(card, age);
                    let idx = age_spread
                        .index_of(fallback)
                        .ok_or(CoreError::SpreadResolution { card: fallback, age })?;
                    warn!(card = %card, fallback = %fallback, age, "card missing from spread, anchoring on fallback year card");
                    (fallback, idx)
                }
            },
        };

        let mapper = PositionCorrelationMapper::new(zero_spread, anchor_index);
        let cards: Vec<PositionedCard> = Position::ALL
            .into_iter()
            .zip(age_spread.window(anchor_index))
            .map(|(position, card)| {
                let mut positioned = PositionedCard {
                    position,
                    card,
                    natural_position: None,
                };
                positioned.natural_position = mapper.map(&positioned).natural;
                positioned
            })
            .collect();

        let resolved = PositionedSpread {
            requested_age: age,
            effective_age: age_spread.age(),
            subject_card: card,
            anchor,
            anchor_index,
            cards,
            displacing_card: zero_spread.card_at(anchor_index),
        };
        debug!(
            card = %card,
            age,
            effective_age = resolved.effective_age,
            index = anchor_index,
            displacing = %resolved.displacing_card,
            "resolved spread"
        );
        Ok(resolved)
    }

    /// Life spread: the age-0 window anchored at the birth card.
    pub fn life_spread(&self, birth_card: Card) -> Result<PositionedSpread, CoreError> {
        self.resolve(birth_card, 0, LookupPolicy::Strict)
    }

    /// Relationship spread: the age-0 window anchored at a combination card.
    pub fn relationship_spread(&self, combination: Card) -> Result<PositionedSpread, CoreError> {
        self.resolve(combination, 0, LookupPolicy::Strict)
    }
}
