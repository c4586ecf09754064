use lifedeck_core::{
    Card, LookupPolicy, Rank, ReferenceData, ReferenceDataSource, SpreadResolver, Suit, combine,
    effective_age,
};
use proptest::prelude::*;
use std::collections::HashSet;

fn suit_strategy() -> impl Strategy<Value = Suit> {
    prop::sample::select(Suit::RING.to_vec())
}

fn rank_strategy() -> impl Strategy<Value = Rank> {
    prop::sample::select(Rank::ALL.to_vec())
}

proptest! {
    #[test]
    fn suit_rank_survives_index_round_trip(suit in suit_strategy(), rank in rank_strategy()) {
        let card = Card::new(suit, rank);
        let back = Card::from_index(u32::from(card.index())).unwrap();
        prop_assert_eq!(back, card);
    }

    #[test]
    fn symbol_round_trip(n in 1u32..=52) {
        let card = Card::from_index(n).unwrap();
        prop_assert_eq!(Card::from_symbol(&card.symbol()).unwrap(), card);
    }

    #[test]
    fn combine_stays_on_ring(a in 1u32..=52, b in 1u32..=52) {
        let v = combine(Card::from_index(a).unwrap(), Card::from_index(b).unwrap()).index();
        prop_assert!((1..=52).contains(&v), "combined index {} off the ring", v);
    }

    #[test]
    fn combine_is_commutative(a in 1u32..=52, b in 1u32..=52) {
        let (ca, cb) = (Card::from_index(a).unwrap(), Card::from_index(b).unwrap());
        prop_assert_eq!(combine(ca, cb), combine(cb, ca));
    }

    #[test]
    fn effective_age_always_has_a_row(age in 0u32..10_000) {
        prop_assert!(effective_age(age) <= 46);
        if age > 45 {
            prop_assert!(effective_age(age) >= 1);
        }
    }

    #[test]
    fn resolved_window_is_contiguous_and_distinct(age in 0u32..200, n in 1u32..=52) {
        let data = ReferenceData::bundled().unwrap();
        let resolver = SpreadResolver::new(&data);
        let card = Card::from_index(n).unwrap();
        let resolved = resolver.resolve(card, age, LookupPolicy::Strict).unwrap();
        let row = data.spread(effective_age(age)).unwrap();

        prop_assert_eq!(resolved.cards.len(), 13);
        let distinct: HashSet<Card> = resolved.cards.iter().map(|pc| pc.card).collect();
        prop_assert_eq!(distinct.len(), 13);
        for (i, pc) in resolved.cards.iter().enumerate() {
            prop_assert_eq!(pc.card, row.card_at(resolved.anchor_index + i));
        }
        prop_assert_eq!(resolved.cards[0].card, card);
        prop_assert_eq!(resolved.displacing_card, data.spread(0).unwrap().card_at(resolved.anchor_index));
    }
}
