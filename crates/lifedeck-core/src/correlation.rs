//! Natural-versus-current position classification.
//!
//! A card's natural position is the label it would carry if the same window
//! (same anchor index) were laid over the age-0 row instead of the age row.

use serde::Serialize;

use crate::card::Card;
use crate::spread::{Position, PositionedCard, Spread};

pub struct PositionCorrelationMapper<'a> {
    zero: &'a Spread,
    anchor_index: usize,
}

impl<'a> PositionCorrelationMapper<'a> {
    pub fn new(zero: &'a Spread, anchor_index: usize) -> Self {
        Self { zero, anchor_index }
    }

    pub fn map(&self, positioned: &PositionedCard) -> PositionCorrelation {
        let len = self.zero.len();
        let natural = self.zero.index_of(positioned.card).and_then(|zero_index| {
            let offset = (zero_index + len - self.anchor_index % len) % len;
            Position::from_offset(offset)
        });
        PositionCorrelation {
            card: positioned.card,
            current: positioned.position,
            natural,
            aligned: natural == Some(positioned.position),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PositionCorrelation {
    pub card: Card,
    pub current: Position,
    /// `None` when the card falls outside the natural window.
    pub natural: Option<Position>,
    pub aligned: bool,
}

impl From<&PositionedCard> for PositionCorrelation {
    fn from(pc: &PositionedCard) -> Self {
        Self {
            card: pc.card,
            current: pc.position,
            natural: pc.natural_position,
            aligned: pc.is_aligned(),
        }
    }
}

impl PositionCorrelation {
    pub fn natural_label(&self) -> &'static str {
        self.natural.map(|p| p.label()).unwrap_or("Unknown")
    }

    /// Financial reading of the correlation, used by money-focused reports.
    pub fn implication(&self) -> String {
        let current = financial_meaning(Some(self.current));
        if self.aligned {
            return format!(
                "This card is in its natural position of {}, indicating strong alignment with {}. \
                 This points to a natural talent or strength in this financial area.",
                self.current.label(),
                current
            );
        }
        format!(
            "This card naturally belongs in the {} position ({}) but is currently in the {} position ({}). \
             The energy of the {} is redirected from its natural financial expression toward {}, \
             which can open opportunities and create friction as it adapts to a new context.",
            self.natural_label(),
            financial_meaning(self.natural),
            self.current.label(),
            current,
            self.card.name(),
            current.to_lowercase()
        )
    }
}

pub fn financial_meaning(position: Option<Position>) -> &'static str {
    match position {
        Some(Position::Sun) => "Core financial identity and purpose",
        Some(Position::Mercury) => "Financial communication and ideas",
        Some(Position::Venus) => "Financial values and resources",
        Some(Position::Mars) => "Financial action and drive",
        Some(Position::Jupiter) => "Financial growth and expansion",
        Some(Position::Saturn) => "Financial discipline and limitations",
        Some(Position::Uranus) => "Financial innovation and disruption",
        Some(Position::Neptune) => "Financial intuition and vision",
        Some(Position::Pluto) => "Financial transformation and power",
        Some(Position::Result) => "Financial outcome and manifestation",
        Some(Position::Peak) => "Financial peak potential",
        Some(Position::Moon) => "Financial emotions and patterns",
        Some(Position::Earth) => "Material financial reality",
        None => "Unknown financial aspect",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring() -> Spread {
        Spread::new(0, Card::all().collect()).unwrap()
    }

    fn positioned(symbol: &str, position: Position) -> PositionedCard {
        PositionedCard {
            position,
            card: Card::from_symbol(symbol).unwrap(),
            natural_position: None,
        }
    }

    #[test]
    fn aligned_when_offsets_match() {
        let zero = ring();
        // Anchor at index 16 (4♣); 6♣ sits two further along.
        let mapper = PositionCorrelationMapper::new(&zero, 16);
        let c = mapper.map(&positioned("6♣", Position::Venus));
        assert_eq!(c.natural, Some(Position::Venus));
        assert!(c.aligned);
        assert!(c.implication().starts_with("This card is in its natural position of Venus"));
    }

    #[test]
    fn displaced_card_reports_both_positions() {
        let zero = ring();
        let mapper = PositionCorrelationMapper::new(&zero, 16);
        let c = mapper.map(&positioned("6♣", Position::Saturn));
        assert_eq!(c.natural, Some(Position::Venus));
        assert!(!c.aligned);
        let text = c.implication();
        assert!(text.contains("naturally belongs in the Venus position"));
        assert!(text.contains("currently in the Saturn position"));
        assert!(text.contains("Six of Clubs"));
    }

    #[test]
    fn natural_window_wraps_around_the_ring() {
        let zero = ring();
        // Anchor at K♠ (index 51); A♥ is one step later after wrapping.
        let mapper = PositionCorrelationMapper::new(&zero, 51);
        let c = mapper.map(&positioned("A♥", Position::Mercury));
        assert_eq!(c.natural, Some(Position::Mercury));
        assert!(c.aligned);
    }

    #[test]
    fn card_outside_natural_window_is_unknown() {
        let zero = ring();
        let mapper = PositionCorrelationMapper::new(&zero, 0);
        let c = mapper.map(&positioned("K♠", Position::Sun));
        assert_eq!(c.natural, None);
        assert!(!c.aligned);
        assert_eq!(c.natural_label(), "Unknown");
        assert!(c.implication().contains("Unknown financial aspect"));
    }

    #[test]
    fn every_position_has_a_meaning() {
        for p in Position::ALL {
            assert_ne!(financial_meaning(Some(p)), financial_meaning(None));
        }
    }
}
