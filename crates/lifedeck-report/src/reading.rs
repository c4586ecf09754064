//! Card data for one report: birth cards, the spread the report reads, and
//! the metadata every card in it needs.

use std::collections::HashMap;

use lifedeck_core::{
    BirthCard, BirthCardResolver, Card, CardMetadata, LookupPolicy, PositionedSpread,
    ReferenceDataSource, Relationship, SpreadResolver, metadata_for,
};
use serde::Serialize;
use tracing::info;

use crate::ReportError;
use crate::spec::{ReportKind, ReportSpecification, Subject};

#[derive(Debug, Clone, Serialize)]
pub struct SubjectReading {
    pub subject: Subject,
    pub birth: BirthCard,
}

#[derive(Debug, Clone)]
pub struct ReportData {
    pub spec: ReportSpecification,
    pub readings: Vec<SubjectReading>,
    pub spread: PositionedSpread,
    pub relationship: Option<Relationship>,
    metadata: HashMap<Card, CardMetadata>,
}

impl ReportData {
    /// Resolve every card the report needs.
    ///
    /// Age-specific reports anchor the age spread with
    /// [`LookupPolicy::ArithmeticFallback`]; life and relationship spreads
    /// read the age-0 row strictly.
    pub fn build(spec: ReportSpecification, source: &dyn ReferenceDataSource) -> Result<Self, ReportError> {
        let birth_resolver = BirthCardResolver::new(source);
        let spread_resolver = SpreadResolver::new(source);

        let readings: Vec<SubjectReading> = spec
            .subjects()
            .iter()
            .map(|subject| SubjectReading {
                subject: subject.clone(),
                birth: birth_resolver.resolve(subject.birthdate),
            })
            .collect();
        let primary = readings[0].birth.card;

        let (spread, relationship) = match spec.kind() {
            ReportKind::Yearly | ReportKind::Financial | ReportKind::Singles => {
                let spread = spread_resolver.resolve(primary, spec.report_age(), LookupPolicy::ArithmeticFallback)?;
                (spread, None)
            }
            ReportKind::Life | ReportKind::ChildrensLife => (spread_resolver.life_spread(primary)?, None),
            ReportKind::Relationship => {
                let relationship = Relationship::between(primary, readings[1].birth.card);
                let spread = spread_resolver.relationship_spread(relationship.combination)?;
                (spread, Some(relationship))
            }
        };

        let mut cards: Vec<Card> = readings.iter().map(|r| r.birth.card).collect();
        cards.extend(spread.cards.iter().map(|pc| pc.card));
        cards.push(spread.displacing_card);
        cards.push(spread.anchor);
        if let Some(rel) = &relationship {
            cards.extend([rel.combination, rel.first_point_of_view, rel.second_point_of_view]);
        }
        let metadata = cards
            .into_iter()
            .map(|card| (card, metadata_for(source, card)))
            .collect();

        info!(
            kind = spec.kind().as_str(),
            birth_card = %primary,
            age = spec.report_age(),
            anchor = %spread.anchor,
            "report cards resolved"
        );
        Ok(Self {
            spec,
            readings,
            spread,
            relationship,
            metadata,
        })
    }

    pub fn primary(&self) -> &SubjectReading {
        &self.readings[0]
    }

    pub fn metadata(&self, card: Card) -> CardMetadata {
        self.metadata
            .get(&card)
            .cloned()
            .unwrap_or_else(|| CardMetadata::placeholder(card))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use lifedeck_core::{Position, ReferenceData, combine};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn spec(kind: ReportKind, subjects: Vec<Subject>, age: Option<u32>) -> ReportSpecification {
        ReportSpecification::new(kind, subjects, age).unwrap()
    }

    fn jane() -> Subject {
        Subject::new("Jane Doe", date(1974, 11, 16), date(2005, 3, 1))
    }

    #[test]
    fn yearly_reads_age_spread() {
        let data = ReferenceData::bundled().unwrap();
        let built = ReportData::build(spec(ReportKind::Yearly, vec![jane()], None), &data).unwrap();
        assert_eq!(built.primary().birth.card.symbol(), "4♣");
        assert_eq!(built.spread.requested_age, 30);
        assert_eq!(built.spread.cards[0].card.symbol(), "4♣");
        assert!(built.relationship.is_none());
        assert!(!built.metadata(built.spread.displacing_card).keywords.is_empty());
    }

    #[test]
    fn life_reads_age_zero() {
        let data = ReferenceData::bundled().unwrap();
        let built = ReportData::build(spec(ReportKind::Life, vec![jane()], Some(12)), &data).unwrap();
        assert_eq!(built.spread.effective_age, 0);
        assert_eq!(built.spread.card_at(Position::Sun).unwrap().card.symbol(), "4♣");
        assert_eq!(built.spread.card_at(Position::Mercury).unwrap().card.symbol(), "5♣");
    }

    #[test]
    fn relationship_anchors_on_combination() {
        let data = ReferenceData::bundled().unwrap();
        let john = Subject::new("John Roe", date(1980, 7, 7), date(2005, 3, 1));
        let built = ReportData::build(spec(ReportKind::Relationship, vec![jane(), john], None), &data).unwrap();
        let rel = built.relationship.unwrap();
        assert_eq!(rel.combination, combine(rel.first, rel.second));
        assert_eq!(built.spread.anchor, rel.combination);
        assert_eq!(rel.first_point_of_view, combine(rel.first, rel.combination));
        assert_eq!(rel.second_point_of_view, combine(rel.second, rel.combination));
    }
}
