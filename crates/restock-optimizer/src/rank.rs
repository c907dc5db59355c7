//! Quote scoring and ranking

use crate::option::FulfillmentOption;
use crate::weights::WeightProfile;
use chrono::NaiveDate;
use restock_gateway::RetailerQuote;
use restock_model::{ItemBundle, ReorderPreferences};

/// Rank quotes into fulfillment options, best first
///
/// Excluded retailers are dropped. Everything else is scored and returned,
/// including options over the per-order cap (flagged, not filtered) and
/// partial-coverage options (penalized, not dropped). A degraded option the
/// household can see beats an invisible one.
#[must_use]
pub fn optimize(
    requested: &ItemBundle,
    quotes: &[RetailerQuote],
    preferences: &ReorderPreferences,
    profile: &WeightProfile,
    as_of: NaiveDate,
) -> Vec<FulfillmentOption> {
    let eligible: Vec<&RetailerQuote> = quotes
        .iter()
        .filter(|q| !preferences.is_excluded(&q.retailer_id))
        .collect();
    if eligible.is_empty() {
        return Vec::new();
    }

    let cheapest_split = cheapest_split_cents(requested, &eligible);

    // Partial quotes are priced as if their missing items were bought at the
    // cheapest price elsewhere, so every quote competes on a full-bundle
    // equivalent total.
    let effective_totals: Vec<i64> = eligible
        .iter()
        .map(|q| effective_total_cents(requested, q, &eligible))
        .collect();
    let min_effective = effective_totals.iter().copied().min().unwrap_or(1).max(1);

    let mut options: Vec<(FulfillmentOption, usize, u32)> = eligible
        .iter()
        .zip(effective_totals)
        .map(|(quote, effective_total)| {
            let scored = score_quote(
                requested,
                quote,
                preferences,
                profile,
                effective_total,
                min_effective,
                cheapest_split,
                as_of,
            );
            let rank = preferences
                .priority_rank(&quote.retailer_id)
                .unwrap_or(preferences.retailer_priority.len());
            (scored, rank, quote.eta_days)
        })
        .collect();

    // Tie-break chain: price, ETA, priority rank, retailer id.
    options.sort_by(|(a, rank_a, eta_a), (b, rank_b, eta_b)| {
        a.score
            .cmp(&b.score)
            .then(a.total_price.cmp(&b.total_price))
            .then(eta_a.cmp(eta_b))
            .then(rank_a.cmp(rank_b))
            .then(a.retailer_id.cmp(&b.retailer_id))
    });

    if let Some((best, _, _)) = options.first() {
        tracing::debug!(
            retailer = %best.retailer_id,
            price = %best.total_price,
            score = best.score,
            "optimizer ranked {} option(s)",
            options.len()
        );
    }
    options.into_iter().map(|(option, _, _)| option).collect()
}

#[allow(clippy::too_many_arguments)]
fn score_quote(
    requested: &ItemBundle,
    quote: &RetailerQuote,
    preferences: &ReorderPreferences,
    profile: &WeightProfile,
    effective_total: i64,
    min_effective: i64,
    cheapest_split: Option<i64>,
    as_of: NaiveDate,
) -> FulfillmentOption {
    let total = quote.total_price().cents();

    // Price, normalized so the cheapest full-bundle-equivalent scores 1000.
    let price_milli = effective_total.saturating_mul(1000) / min_effective;

    // ETA against the preferred window; days past the window cost extra.
    let latest = i64::from(preferences.delivery_window.latest_days.max(1));
    let eta = i64::from(quote.eta_days);
    let late = (eta - latest).max(0);
    let eta_milli = eta * 1000 / latest + late * 1000;

    // Priority list position; unlisted retailers score as worst-listed.
    let list_len = preferences.retailer_priority.len();
    let rank = preferences
        .priority_rank(&quote.retailer_id)
        .unwrap_or(list_len);
    let priority_milli = if list_len == 0 {
        0
    } else {
        (rank as i64).saturating_mul(1000) / list_len as i64
    };

    let availability = quote.availability_confidence.clamp(0.0, 1.0);
    let availability_milli = ((1.0 - availability) * 1000.0).round() as i64;

    let covers = quote.covers(requested);
    let missing = requested
        .item_ids()
        .filter(|item| quote.price_for(item).is_none())
        .count() as i64;
    let coverage_milli = missing * 1000;

    // Consolidation: a full-bundle quote that undercuts the cheapest
    // per-item split earns a bonus proportional to the savings fraction.
    let bulk_milli = match cheapest_split {
        Some(split) if covers && requested.len() > 1 && total < split => {
            ((split - total).saturating_mul(1000) / split.max(1)).min(1000)
        }
        _ => 0,
    };

    let score = profile.price * price_milli
        + profile.eta * eta_milli
        + profile.priority * priority_milli
        + profile.availability * availability_milli
        + profile.coverage * coverage_milli
        - profile.bulk * bulk_milli;

    let total_price = quote.total_price();
    FulfillmentOption {
        retailer_id: quote.retailer_id.clone(),
        item_bundle: quote.covered_bundle(),
        total_price,
        estimated_delivery_date: quote.delivery_date(as_of),
        confidence_of_availability: availability,
        covers_request: covers,
        exceeds_cap: preferences
            .per_order_cap
            .is_some_and(|cap| total_price > cap),
        score,
    }
}

/// Quote total plus the cheapest available price for each item it misses
fn effective_total_cents(
    requested: &ItemBundle,
    quote: &RetailerQuote,
    quotes: &[&RetailerQuote],
) -> i64 {
    let mut total = quote.total_price().cents();
    for item in requested.item_ids() {
        if quote.price_for(item).is_none() {
            if let Some(best) = quotes.iter().filter_map(|q| q.price_for(item)).min() {
                total += best.cents();
            }
        }
    }
    total
}

/// Cheapest cross-retailer split: per item, the lowest quoted line price.
/// `None` when some requested item is quoted by no retailer.
fn cheapest_split_cents(requested: &ItemBundle, quotes: &[&RetailerQuote]) -> Option<i64> {
    let mut total = 0_i64;
    for item in requested.item_ids() {
        let best = quotes
            .iter()
            .filter_map(|q| q.price_for(item))
            .min()?;
        total += best.cents();
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use restock_gateway::QuoteLine;
    use restock_model::{BundleLine, HouseholdId, ItemId, Money, RetailerId};
    use std::str::FromStr;

    fn item(s: &str) -> ItemId {
        ItemId::from_str(s).unwrap()
    }

    fn retailer(s: &str) -> RetailerId {
        RetailerId::from_str(s).unwrap()
    }

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 20).unwrap()
    }

    fn single_bundle() -> ItemBundle {
        ItemBundle::single(item("diapers-size4"), 1)
    }

    fn quote(name: &str, cents: i64, eta: u32) -> RetailerQuote {
        RetailerQuote::new(
            retailer(name),
            vec![QuoteLine::new(item("diapers-size4"), 1, Money::from_cents(cents))],
            eta,
            0.95,
        )
    }

    fn prefs() -> ReorderPreferences {
        ReorderPreferences::new(HouseholdId::new())
    }

    #[test]
    fn cheapest_quote_wins_under_standard_profile() {
        let quotes = vec![
            quote("pricey", 3200, 2),
            quote("cheap", 2400, 2),
        ];
        let ranked = optimize(
            &single_bundle(),
            &quotes,
            &prefs(),
            &WeightProfile::standard(),
            as_of(),
        );
        assert_eq!(ranked[0].retailer_id, retailer("cheap"));
        assert_eq!(ranked[0].total_price, Money::from_cents(2400));
    }

    #[test]
    fn expedited_profile_prefers_faster_delivery() {
        let quotes = vec![
            quote("cheap-slow", 1800, 4),
            quote("fast-dear", 2600, 1),
        ];

        let standard = optimize(
            &single_bundle(),
            &quotes,
            &prefs(),
            &WeightProfile::standard(),
            as_of(),
        );
        let expedited = optimize(
            &single_bundle(),
            &quotes,
            &prefs(),
            &WeightProfile::expedited(),
            as_of(),
        );

        assert_eq!(standard[0].retailer_id, retailer("cheap-slow"));
        assert_eq!(expedited[0].retailer_id, retailer("fast-dear"));
    }

    #[test]
    fn identical_quotes_tie_break_on_retailer_id() {
        let quotes = vec![quote("zephyr", 2400, 2), quote("acme", 2400, 2)];
        let ranked = optimize(
            &single_bundle(),
            &quotes,
            &prefs(),
            &WeightProfile::standard(),
            as_of(),
        );
        assert_eq!(ranked[0].retailer_id, retailer("acme"));
        assert_eq!(ranked[1].retailer_id, retailer("zephyr"));
    }

    #[test]
    fn priority_list_breaks_price_ties() {
        let quotes = vec![quote("zephyr", 2400, 2), quote("acme", 2400, 2)];
        let prefs = prefs().with_retailer_priority(vec![retailer("zephyr")]);
        let ranked = optimize(
            &single_bundle(),
            &quotes,
            &prefs,
            &WeightProfile::standard(),
            as_of(),
        );
        assert_eq!(ranked[0].retailer_id, retailer("zephyr"));
    }

    #[test]
    fn excluded_retailers_are_dropped() {
        let quotes = vec![quote("banned", 1000, 1), quote("acme", 2400, 2)];
        let prefs = prefs().with_retailer_excludes(vec![retailer("banned")]);
        let ranked = optimize(
            &single_bundle(),
            &quotes,
            &prefs,
            &WeightProfile::standard(),
            as_of(),
        );
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].retailer_id, retailer("acme"));
    }

    #[test]
    fn over_cap_option_is_flagged_not_filtered() {
        let quotes = vec![quote("pricey", 12_000, 2)];
        let prefs = prefs().with_per_order_cap(Money::from_dollars(100));
        let ranked = optimize(
            &single_bundle(),
            &quotes,
            &prefs,
            &WeightProfile::standard(),
            as_of(),
        );
        assert_eq!(ranked.len(), 1);
        assert!(ranked[0].exceeds_cap);
    }

    #[test]
    fn bundle_discount_beats_cheapest_split() {
        let bundle = ItemBundle::new([
            BundleLine::new(item("diapers-size4"), 1),
            BundleLine::new(item("wipes"), 2),
        ]);
        // Split across specialists: 1900 + 700 = 2600.
        let diaper_specialist = RetailerQuote::new(
            retailer("diaperco"),
            vec![QuoteLine::new(item("diapers-size4"), 1, Money::from_cents(1900))],
            2,
            0.95,
        );
        let wipe_specialist = RetailerQuote::new(
            retailer("wipeco"),
            vec![QuoteLine::new(item("wipes"), 2, Money::from_cents(700))],
            2,
            0.95,
        );
        // One-stop shop: 2000 + 800 - 400 = 2400, under the split.
        let consolidated = RetailerQuote::new(
            retailer("bulkbarn"),
            vec![
                QuoteLine::new(item("diapers-size4"), 1, Money::from_cents(2000)),
                QuoteLine::new(item("wipes"), 2, Money::from_cents(800)),
            ],
            2,
            0.95,
        )
        .with_bundle_discount(Money::from_cents(400));

        let ranked = optimize(
            &bundle,
            &[diaper_specialist, wipe_specialist, consolidated],
            &prefs(),
            &WeightProfile::standard(),
            as_of(),
        );
        assert_eq!(ranked[0].retailer_id, retailer("bulkbarn"));
        assert!(ranked[0].covers_request);
    }

    #[test]
    fn partial_coverage_ranks_below_full_coverage() {
        let bundle = ItemBundle::new([
            BundleLine::new(item("diapers-size4"), 1),
            BundleLine::new(item("wipes"), 2),
        ]);
        let partial = RetailerQuote::new(
            retailer("wipeco"),
            vec![QuoteLine::new(item("wipes"), 2, Money::from_cents(500))],
            1,
            0.99,
        );
        let full = RetailerQuote::new(
            retailer("bulkbarn"),
            vec![
                QuoteLine::new(item("diapers-size4"), 1, Money::from_cents(2000)),
                QuoteLine::new(item("wipes"), 2, Money::from_cents(800)),
            ],
            3,
            0.9,
        );

        let ranked = optimize(
            &bundle,
            &[partial, full],
            &prefs(),
            &WeightProfile::standard(),
            as_of(),
        );
        assert_eq!(ranked[0].retailer_id, retailer("bulkbarn"));
        assert!(!ranked[1].covers_request);
    }
}
