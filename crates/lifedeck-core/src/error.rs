use std::path::PathBuf;

use thiserror::Error;

use crate::card::Card;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("card index {0} is outside 1..=52")]
    IndexOutOfRange(u32),

    #[error("unrecognised card symbol: {0:?}")]
    UnknownSymbol(String),

    #[error("unrecognised card name: {0:?}")]
    UnknownName(String),

    #[error("invalid birthdate {0:?}: expected YYYY-MM-DD or MM/DD/YYYY")]
    InvalidDate(String),

    #[error("no spread row for age {age} (effective age {effective_age})")]
    SpreadUnavailable { age: u32, effective_age: u32 },

    #[error("card {card} not found in spread for age {age}")]
    SpreadResolution { card: Card, age: u32 },

    #[error("reference data unavailable: {0}")]
    DataUnavailable(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),
}
