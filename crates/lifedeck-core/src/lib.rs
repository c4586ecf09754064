//! Card and spread arithmetic: the 52-card ring, birth cards, age spreads,
//! combination cards, and natural-position correlation.

mod error;
pub use error::CoreError;

pub mod birth;
pub mod card;
pub mod combine;
pub mod correlation;
pub mod reference;
pub mod spread;

pub use birth::{BirthCard, BirthCardResolver, BirthCardSource, age_on, parse_birthdate};
pub use card::{Card, Rank, Suit};
pub use combine::{Relationship, combine, point_of_view};
pub use correlation::{PositionCorrelation, PositionCorrelationMapper};
pub use reference::{CardMetadata, Karma, ReferenceData, ReferenceDataSource, metadata_for};
pub use spread::{
    LookupPolicy, Position, PositionedCard, PositionedSpread, Spread, SpreadResolver, SpreadTable,
    effective_age,
};
