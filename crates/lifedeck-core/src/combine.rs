//! Ring arithmetic over pairs of cards.

use serde::Serialize;

use crate::card::Card;

/// Sum two cards' ring indices, wrapping once past 52.
pub fn combine(a: Card, b: Card) -> Card {
    let mut v = u32::from(a.index()) + u32::from(b.index());
    if v > u32::from(Card::COUNT) {
        v -= u32::from(Card::COUNT);
    }
    Card::from_ring_value(v)
}

/// A subject's view of a pairing: their own card combined with the pair's
/// combination card.
pub fn point_of_view(own: Card, combination: Card) -> Card {
    combine(own, combination)
}

/// The cards derived from two subjects' birth cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Relationship {
    pub first: Card,
    pub second: Card,
    pub combination: Card,
    pub first_point_of_view: Card,
    pub second_point_of_view: Card,
}

impl Relationship {
    pub fn between(first: Card, second: Card) -> Self {
        let combination = combine(first, second);
        Self {
            first,
            second,
            combination,
            first_point_of_view: point_of_view(first, combination),
            second_point_of_view: point_of_view(second, combination),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(s: &str) -> Card {
        Card::from_symbol(s).unwrap()
    }

    #[test]
    fn combine_without_wrap() {
        // 4♣ (17) + 9♦ (35) = 52
        assert_eq!(combine(card("4♣"), card("9♦")).symbol(), "K♠");
    }

    #[test]
    fn combine_wraps_once() {
        // K♠ (52) + K♠ (52) = 104 -> 52
        assert_eq!(combine(card("K♠"), card("K♠")).symbol(), "K♠");
        // K♠ (52) + A♥ (1) = 53 -> 1
        assert_eq!(combine(card("K♠"), card("A♥")).symbol(), "A♥");
        // Q♠ (51) + 3♥ (3) = 54 -> 2
        assert_eq!(combine(card("Q♠"), card("3♥")).symbol(), "2♥");
    }

    #[test]
    fn relationship_points_of_view_differ() {
        // 4♣ (17) + 7♥ (7) = 24 -> J♣
        let rel = Relationship::between(card("4♣"), card("7♥"));
        assert_eq!(rel.combination.symbol(), "J♣");
        // 17 + 24 = 41 -> 2♠; 7 + 24 = 31 -> 5♦
        assert_eq!(rel.first_point_of_view.symbol(), "2♠");
        assert_eq!(rel.second_point_of_view.symbol(), "5♦");
        assert_ne!(rel.first_point_of_view, rel.second_point_of_view);
        assert_eq!(rel.first_point_of_view, combine(rel.first, rel.combination));
    }
}
