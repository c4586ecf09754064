//! Birthdate handling and birth-card resolution.
//!
//! The date table is authoritative. A date it does not list, or lists with an
//! unreadable card name, is resolved by digit-sum arithmetic instead.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, warn};

use crate::CoreError;
use crate::card::{Card, Rank, Suit};
use crate::reference::ReferenceDataSource;

/// Suit order used by the arithmetic fallback, independent of ring order.
const FALLBACK_BIRTH_SUITS: [Suit; 4] = [Suit::Hearts, Suit::Clubs, Suit::Diamonds, Suit::Spades];

/// Suit order used when stepping a birth card forward by age.
const FALLBACK_YEAR_SUITS: [Suit; 4] = [Suit::Hearts, Suit::Diamonds, Suit::Clubs, Suit::Spades];

/// Parse a birthdate in `YYYY-MM-DD`, `MM/DD/YYYY`, or ISO timestamp form.
///
/// Only the calendar date is kept; any time or offset suffix is ignored.
pub fn parse_birthdate(input: &str) -> Result<NaiveDate, CoreError> {
    let s = input.trim();
    let date_part = s.split(['T', ' ']).next().unwrap_or(s);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%m/%d/%Y"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date()))
        .map_err(|_| CoreError::InvalidDate(input.to_string()))
}

/// Whole years between `birthdate` and `as_of`, one less if the birthday
/// has not yet come round in `as_of`'s year. Never negative.
pub fn age_on(birthdate: NaiveDate, as_of: NaiveDate) -> u32 {
    let mut years = as_of.year() - birthdate.year();
    if (as_of.month(), as_of.day()) < (birthdate.month(), birthdate.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

/// Table key for a month/day pair, unpadded: `"11/16"`.
pub fn date_key(month: u32, day: u32) -> String {
    format!("{month}/{day}")
}

/// Which path produced a birth card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BirthCardSource {
    Table,
    Arithmetic,
}

impl BirthCardSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Arithmetic => "arithmetic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BirthCard {
    pub card: Card,
    pub source: BirthCardSource,
}

/// Maps calendar dates to birth cards.
pub struct BirthCardResolver<'a> {
    source: &'a dyn ReferenceDataSource,
}

impl<'a> BirthCardResolver<'a> {
    pub fn new(source: &'a dyn ReferenceDataSource) -> Self {
        Self { source }
    }

    /// Resolve the birth card for `date`. Always yields exactly one card.
    pub fn resolve(&self, date: NaiveDate) -> BirthCard {
        let (month, day) = (date.month(), date.day());
        if let Some(name) = self.source.birth_card_name(month, day) {
            match Card::from_name(name) {
                Ok(card) => {
                    debug!(key = %date_key(month, day), card = %card, "birth card from table");
                    return BirthCard {
                        card,
                        source: BirthCardSource::Table,
                    };
                }
                Err(e) => warn!(key = %date_key(month, day), error = %e, "unreadable birth card entry"),
            }
        }

        let card = arithmetic_birth_card(date);
        warn!(key = %date_key(month, day), card = %card, "date missing from birth card table, using arithmetic fallback");
        BirthCard {
            card,
            source: BirthCardSource::Arithmetic,
        }
    }
}

/// Digit-sum birth card: month + day + sum of the year's digits, reduced into
/// `1..=52` by repeated subtraction.
pub fn arithmetic_birth_card(date: NaiveDate) -> Card {
    let year_digits: u32 = date
        .year()
        .unsigned_abs()
        .to_string()
        .chars()
        .filter_map(|c| c.to_digit(10))
        .sum();
    let mut sum = date.month() + date.day() + year_digits;
    while sum > u32::from(Card::COUNT) {
        sum -= u32::from(Card::COUNT);
    }
    let zero_based = (sum - 1) as usize;
    Card::new(
        FALLBACK_BIRTH_SUITS[zero_based / 13],
        Rank::ALL[zero_based % 13],
    )
}

/// Stand-in anchor for an age spread that does not contain the birth card.
///
/// Rank steps forward by `age` within Ace..King; suit steps forward by `age`
/// through hearts, diamonds, clubs, spades.
pub fn fallback_year_card(birth_card: Card, age: u32) -> Card {
    let rank_value = (u32::from(birth_card.rank().value()) + age) % 13;
    let rank_index = if rank_value == 0 { 12 } else { rank_value as usize - 1 };
    let suit_pos = FALLBACK_YEAR_SUITS
        .iter()
        .position(|s| *s == birth_card.suit())
        .unwrap_or(0);
    let suit = FALLBACK_YEAR_SUITS[(suit_pos + age as usize) % 4];
    Card::new(suit, Rank::ALL[rank_index])
}
