//! Read-only reference tables: date → birth card, age → spread, card → metadata.
//!
//! [`ReferenceData`] is the in-memory implementation. It loads from a data
//! directory, from the copy compiled into this crate, or from fixture parts.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use crate::CoreError;
use crate::birth::date_key;
use crate::card::Card;
use crate::spread::Spread;

pub const BIRTH_CARDS_FILE: &str = "birth_cards.json";
/// `Date,Card` table, read when `birth_cards.json` is absent.
pub const BIRTH_CARDS_CSV_FILE: &str = "Card_Births.csv";
pub const SPREADS_FILE: &str = "spreads.json";
pub const CARDS_FILE: &str = "cards.json";

const BUNDLED_BIRTH_CARDS: &str = include_str!("../../../data/birth_cards.json");
const BUNDLED_SPREADS: &str = include_str!("../../../data/spreads.json");
const BUNDLED_CARDS: &str = include_str!("../../../data/cards.json");

/// Injectable source of the three reference tables.
pub trait ReferenceDataSource: Send + Sync {
    /// Full card name the date table lists for `month`/`day`, if any.
    fn birth_card_name(&self, month: u32, day: u32) -> Option<&str>;

    /// Spread row for an already-reduced age.
    fn spread(&self, effective_age: u32) -> Option<&Spread>;

    /// Interpretive metadata keyed by full card name.
    fn card_metadata(&self, card_name: &str) -> Option<&CardMetadata>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Karma {
    #[serde(default, alias = "Positive Experiences")]
    pub positive: Vec<String>,
    #[serde(default, alias = "Negative Experiences")]
    pub negative: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardMetadata {
    /// Full card name, e.g. "Four of Clubs".
    #[serde(alias = "Card")]
    pub card: String,
    #[serde(default, alias = "Description")]
    pub description: String,
    #[serde(default, alias = "Keywords", deserialize_with = "keyword_list")]
    pub keywords: Vec<String>,
    #[serde(default, alias = "Daily Karma")]
    pub karma: Karma,
}

/// Keywords as a JSON list or a single comma-separated string.
fn keyword_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Keywords {
        List(Vec<String>),
        Text(String),
    }
    Ok(match Keywords::deserialize(deserializer)? {
        Keywords::List(list) => list,
        Keywords::Text(text) => text
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(String::from)
            .collect(),
    })
}

impl CardMetadata {
    /// Neutral metadata for a card the table does not describe.
    pub fn placeholder(card: Card) -> Self {
        Self {
            card: card.name(),
            description: format!("No description available for the {}.", card.name()),
            keywords: Vec::new(),
            karma: Karma::default(),
        }
    }

    pub fn karma_summary(&self) -> String {
        if self.karma.positive.is_empty() && self.karma.negative.is_empty() {
            return "No karma information available".to_string();
        }
        let mut parts = Vec::new();
        if !self.karma.positive.is_empty() {
            parts.push(format!("Positive: {}", self.karma.positive.join("; ")));
        }
        if !self.karma.negative.is_empty() {
            parts.push(format!("Negative: {}", self.karma.negative.join("; ")));
        }
        parts.join(". ")
    }
}

/// Metadata for `card` from `source`, or a placeholder when it is missing.
pub fn metadata_for(source: &dyn ReferenceDataSource, card: Card) -> CardMetadata {
    source
        .card_metadata(&card.name())
        .cloned()
        .unwrap_or_else(|| CardMetadata::placeholder(card))
}

#[derive(Deserialize)]
struct BirthCardEntry {
    #[serde(alias = "Date")]
    date: String,
    #[serde(alias = "Card")]
    card: String,
}

fn birth_cards_from_csv(text: &str) -> Result<Vec<BirthCardEntry>, CoreError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(text.as_bytes());
    let entries = reader
        .deserialize()
        .collect::<Result<Vec<BirthCardEntry>, _>>()?;
    Ok(entries)
}

/// In-memory reference tables.
#[derive(Debug, Default)]
pub struct ReferenceData {
    birth_cards: HashMap<String, String>,
    spreads: BTreeMap<u32, Spread>,
    metadata: HashMap<String, CardMetadata>,
}

impl ReferenceData {
    /// Tables compiled into the crate.
    pub fn bundled() -> Result<Self, CoreError> {
        Self::from_json(BUNDLED_BIRTH_CARDS, BUNDLED_SPREADS, BUNDLED_CARDS)
    }

    /// Load the birth-card table, `spreads.json`, and `cards.json` from `dir`.
    ///
    /// The birth-card table is `birth_cards.json` or, failing that,
    /// `Card_Births.csv` with `Date,Card` columns.
    pub fn load_dir(dir: &Path) -> Result<Self, CoreError> {
        let read = |name: &str| {
            let path = dir.join(name);
            std::fs::read_to_string(&path).map_err(|source| CoreError::Io { path, source })
        };
        let entries = if dir.join(BIRTH_CARDS_FILE).exists() {
            serde_json::from_str(&read(BIRTH_CARDS_FILE)?)?
        } else {
            birth_cards_from_csv(&read(BIRTH_CARDS_CSV_FILE)?)?
        };
        let data = Self::from_entries(entries, &read(SPREADS_FILE)?, &read(CARDS_FILE)?)?;
        info!(dir = %dir.display(), "loaded reference data");
        Ok(data)
    }

    /// Parse the three tables. Every spread row must be a full permutation.
    pub fn from_json(birth_cards: &str, spreads: &str, cards: &str) -> Result<Self, CoreError> {
        Self::from_entries(serde_json::from_str(birth_cards)?, spreads, cards)
    }

    fn from_entries(entries: Vec<BirthCardEntry>, spreads: &str, cards: &str) -> Result<Self, CoreError> {
        let rows: BTreeMap<String, Vec<String>> = serde_json::from_str(spreads)?;
        let metadata: Vec<CardMetadata> = serde_json::from_str(cards)?;

        let mut spread_rows = BTreeMap::new();
        for (key, symbols) in rows {
            let age = parse_age_key(&key)?;
            let spread = Spread::from_symbols(age, &symbols)?;
            if !spread.is_complete() {
                return Err(CoreError::DataUnavailable(format!(
                    "spread {key:?} has {} cards, expected {}",
                    spread.len(),
                    Card::COUNT
                )));
            }
            spread_rows.insert(age, spread);
        }
        if !spread_rows.contains_key(&0) {
            return Err(CoreError::DataUnavailable("spread table has no age 0 row".into()));
        }

        let data = Self {
            birth_cards: entries.into_iter().map(|e| (e.date.trim().to_string(), e.card)).collect(),
            spreads: spread_rows,
            metadata: metadata.into_iter().map(|m| (m.card.clone(), m)).collect(),
        };
        info!(
            dates = data.birth_cards.len(),
            spreads = data.spreads.len(),
            cards = data.metadata.len(),
            "parsed reference tables"
        );
        Ok(data)
    }

    /// Assemble tables directly, without validation beyond what [`Spread::new`] enforces.
    pub fn from_parts(
        birth_cards: impl IntoIterator<Item = ((u32, u32), String)>,
        spreads: Vec<Spread>,
        metadata: Vec<CardMetadata>,
    ) -> Self {
        Self {
            birth_cards: birth_cards
                .into_iter()
                .map(|((m, d), name)| (date_key(m, d), name))
                .collect(),
            spreads: spreads.into_iter().map(|s| (s.age(), s)).collect(),
            metadata: metadata.into_iter().map(|m| (m.card.clone(), m)).collect(),
        }
    }

    pub fn spread_ages(&self) -> impl Iterator<Item = u32> + '_ {
        self.spreads.keys().copied()
    }
}

impl ReferenceDataSource for ReferenceData {
    fn birth_card_name(&self, month: u32, day: u32) -> Option<&str> {
        self.birth_cards.get(&date_key(month, day)).map(String::as_str)
    }

    fn spread(&self, effective_age: u32) -> Option<&Spread> {
        self.spreads.get(&effective_age)
    }

    fn card_metadata(&self, card_name: &str) -> Option<&CardMetadata> {
        self.metadata.get(card_name)
    }
}

/// Accepts `"Age 30"` or a bare `"30"`.
fn parse_age_key(key: &str) -> Result<u32, CoreError> {
    let trimmed = key.trim();
    let digits = trimmed.strip_prefix("Age").map(str::trim).unwrap_or(trimmed);
    digits
        .parse()
        .map_err(|_| CoreError::DataUnavailable(format!("bad spread key {key:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_tables_are_complete() {
        let data = ReferenceData::bundled().unwrap();
        let ages: Vec<u32> = data.spread_ages().collect();
        assert_eq!(ages, (0..=46).collect::<Vec<_>>());
        for age in ages {
            assert!(data.spread(age).unwrap().is_complete());
        }
        for card in Card::all() {
            assert!(data.card_metadata(&card.name()).is_some(), "no metadata for {card}");
        }
        assert_eq!(data.birth_card_name(11, 16), Some("Four of Clubs"));
    }

    #[test]
    fn bundled_age_zero_is_ring_order() {
        let data = ReferenceData::bundled().unwrap();
        let zero: Vec<Card> = data.spread(0).unwrap().cards().to_vec();
        assert_eq!(zero, Card::all().collect::<Vec<_>>());
    }

    #[test]
    fn load_dir_reads_each_table() {
        let dir = tempfile::tempdir().unwrap();
        let ring: Vec<String> = Card::all().map(|c| c.symbol()).collect();
        std::fs::write(
            dir.path().join(BIRTH_CARDS_FILE),
            r#"[{"date": "11/16", "card": "Four of Clubs"}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join(SPREADS_FILE),
            serde_json::json!({ "Age 0": ring, "7": ring }).to_string(),
        )
        .unwrap();
        std::fs::write(
            dir.path().join(CARDS_FILE),
            r#"[{"card": "Four of Clubs", "description": "Stability", "keywords": ["Foundation"]}]"#,
        )
        .unwrap();

        let data = ReferenceData::load_dir(dir.path()).unwrap();
        assert_eq!(data.spread_ages().collect::<Vec<_>>(), vec![0, 7]);
        let meta = data.card_metadata("Four of Clubs").unwrap();
        assert_eq!(meta.keywords, vec!["Foundation"]);
        assert_eq!(meta.karma_summary(), "No karma information available");
    }

    #[test]
    fn load_dir_reads_csv_births_and_capitalised_card_keys() {
        let dir = tempfile::tempdir().unwrap();
        let ring: Vec<String> = Card::all().map(|c| c.symbol()).collect();
        std::fs::write(
            dir.path().join(BIRTH_CARDS_CSV_FILE),
            "Date,Card\n11/16,Four of Clubs\n7/7, Eight of Diamonds\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join(SPREADS_FILE),
            serde_json::json!({ "Age 0": ring }).to_string(),
        )
        .unwrap();
        std::fs::write(
            dir.path().join(CARDS_FILE),
            serde_json::json!([{
                "Card": "Four of Clubs",
                "Description": "Stability",
                "Keywords": "Foundation, Security",
                "Daily Karma": {
                    "Positive Experiences": ["Steady gains"],
                    "Negative Experiences": ["Stubbornness"]
                }
            }])
            .to_string(),
        )
        .unwrap();

        let data = ReferenceData::load_dir(dir.path()).unwrap();
        assert_eq!(data.birth_card_name(11, 16), Some("Four of Clubs"));
        assert_eq!(data.birth_card_name(7, 7), Some("Eight of Diamonds"));
        let meta = data.card_metadata("Four of Clubs").unwrap();
        assert_eq!(meta.description, "Stability");
        assert_eq!(meta.keywords, vec!["Foundation", "Security"]);
        assert_eq!(meta.karma_summary(), "Positive: Steady gains. Negative: Stubbornness");
    }

    #[test]
    fn load_dir_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ReferenceData::load_dir(dir.path()),
            Err(CoreError::Io { .. })
        ));
    }

    #[test]
    fn incomplete_spread_row_is_rejected() {
        let err = ReferenceData::from_json("[]", r#"{"Age 0": ["A♥", "2♥"]}"#, "[]").unwrap_err();
        assert!(matches!(err, CoreError::DataUnavailable(_)));
    }

    #[test]
    fn missing_metadata_uses_placeholder() {
        let data = ReferenceData::default();
        let card = Card::from_symbol("7♦").unwrap();
        let meta = metadata_for(&data, card);
        assert_eq!(meta.card, "Seven of Diamonds");
        assert!(meta.keywords.is_empty());
    }

    #[test]
    fn karma_summary_joins_both_sides() {
        let meta = CardMetadata {
            card: "Ace of Hearts".into(),
            description: String::new(),
            keywords: Vec::new(),
            karma: Karma {
                positive: vec!["Warmth".into()],
                negative: vec!["Impatience".into()],
            },
        };
        assert_eq!(meta.karma_summary(), "Positive: Warmth. Negative: Impatience");
    }

    #[test]
    fn age_keys() {
        assert_eq!(parse_age_key("Age 30").unwrap(), 30);
        assert_eq!(parse_age_key("12").unwrap(), 12);
        assert!(parse_age_key("Year 3").is_err());
    }
}
