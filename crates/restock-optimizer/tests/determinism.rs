//! Optimizer determinism property.
//!
//! Given identical quotes and preferences, `optimize` must return the same
//! ranked list on repeated calls: no hidden randomness, no iteration-order
//! dependence.

use chrono::NaiveDate;
use proptest::prelude::*;
use restock_gateway::{QuoteLine, RetailerQuote};
use restock_model::{HouseholdId, ItemBundle, ItemId, Money, ReorderPreferences, RetailerId};
use restock_optimizer::{optimize, WeightProfile};
use std::str::FromStr;

fn retailer_name() -> impl Strategy<Value = String> {
    proptest::sample::select(vec![
        "acme".to_string(),
        "bulkbarn".to_string(),
        "quickmart".to_string(),
        "wipeco".to_string(),
        "zephyr".to_string(),
    ])
}

fn arb_quote() -> impl Strategy<Value = RetailerQuote> {
    (retailer_name(), 100_i64..20_000, 0_u32..14, 0.0_f64..1.0).prop_map(
        |(name, cents, eta, availability)| {
            RetailerQuote::new(
                RetailerId::from_str(&name).unwrap(),
                vec![QuoteLine::new(
                    ItemId::from_str("diapers-size4").unwrap(),
                    1,
                    Money::from_cents(cents),
                )],
                eta,
                availability,
            )
        },
    )
}

proptest! {
    #[test]
    fn repeated_calls_agree(quotes in proptest::collection::vec(arb_quote(), 1..8)) {
        let bundle = ItemBundle::single(ItemId::from_str("diapers-size4").unwrap(), 1);
        let prefs = ReorderPreferences::new(HouseholdId::new())
            .with_retailer_priority(vec![RetailerId::from_str("quickmart").unwrap()]);
        let as_of = NaiveDate::from_ymd_opt(2026, 8, 20).unwrap();

        let first = optimize(&bundle, &quotes, &prefs, &WeightProfile::standard(), as_of);
        let second = optimize(&bundle, &quotes, &prefs, &WeightProfile::standard(), as_of);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn ranking_is_total_and_stable(quotes in proptest::collection::vec(arb_quote(), 2..8)) {
        let bundle = ItemBundle::single(ItemId::from_str("diapers-size4").unwrap(), 1);
        let prefs = ReorderPreferences::new(HouseholdId::new());
        let as_of = NaiveDate::from_ymd_opt(2026, 8, 20).unwrap();

        let ranked = optimize(&bundle, &quotes, &prefs, &WeightProfile::expedited(), as_of);
        prop_assert_eq!(ranked.len(), quotes.len());
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].score <= pair[1].score);
        }
    }
}
