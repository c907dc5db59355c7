//! Recommendations awaiting manual approval
//!
//! Pending-manual-approval states are terminal for the engine; they resume
//! only through an explicit external approval or cancellation call. The
//! store keeps what that call needs: the forecast, the ranked options, and
//! the cycle id that makes a later placement idempotent.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use restock_forecast::ConsumptionForecast;
use restock_model::{CycleId, HouseholdId, ItemBundle, RecommendationId};
use restock_optimizer::FulfillmentOption;
use serde::{Deserialize, Serialize};

/// Lifecycle of a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStatus {
    /// Waiting for an external decision
    Pending,
    /// Approved; an order was placed
    Approved,
    /// Cancelled before any order was placed
    Cancelled,
}

/// A reorder the engine proposes but will not place on its own
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub recommendation_id: RecommendationId,
    pub household_id: HouseholdId,
    /// Decision cycle that produced this recommendation; reused as the
    /// idempotency scope if the recommendation is approved
    pub cycle_id: CycleId,
    pub bundle: ItemBundle,
    /// Forecast behind the recommendation; emergency escalations have none
    pub forecast: Option<ConsumptionForecast>,
    /// Ranked options, best first; never empty
    pub options: Vec<FulfillmentOption>,
    /// Display-ready reason the order was not auto-placed
    pub reason: String,
    /// Set for emergency-path recommendations
    pub urgent: bool,
    pub created_at: DateTime<Utc>,
    pub status: RecommendationStatus,
}

impl Recommendation {
    /// The option an approval would act on
    #[must_use]
    pub fn chosen(&self) -> Option<&FulfillmentOption> {
        self.options.first()
    }
}

/// Concurrent recommendation store
#[derive(Debug, Default)]
pub struct RecommendationStore {
    inner: DashMap<RecommendationId, Recommendation>,
}

impl RecommendationStore {
    /// Create an empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new pending recommendation
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &self,
        household_id: HouseholdId,
        cycle_id: CycleId,
        bundle: ItemBundle,
        forecast: Option<ConsumptionForecast>,
        options: Vec<FulfillmentOption>,
        reason: impl Into<String>,
        urgent: bool,
    ) -> RecommendationId {
        let recommendation_id = RecommendationId::new();
        self.inner.insert(
            recommendation_id,
            Recommendation {
                recommendation_id,
                household_id,
                cycle_id,
                bundle,
                forecast,
                options,
                reason: reason.into(),
                urgent,
                created_at: Utc::now(),
                status: RecommendationStatus::Pending,
            },
        );
        recommendation_id
    }

    /// Snapshot of a recommendation
    #[must_use]
    pub fn get(&self, recommendation_id: RecommendationId) -> Option<Recommendation> {
        self.inner.get(&recommendation_id).map(|r| r.clone())
    }

    /// Latest pending recommendation for a household
    #[must_use]
    pub fn latest_pending(&self, household_id: HouseholdId) -> Option<Recommendation> {
        self.inner
            .iter()
            .filter(|r| {
                r.household_id == household_id && r.status == RecommendationStatus::Pending
            })
            .max_by_key(|r| (r.created_at, r.recommendation_id))
            .map(|r| r.clone())
    }

    /// Move a pending recommendation to a settled status
    ///
    /// Returns `false` when the recommendation is missing or already
    /// settled; the caller turns that into the right facade error.
    pub fn settle(&self, recommendation_id: RecommendationId, status: RecommendationStatus) -> bool {
        match self.inner.get_mut(&recommendation_id) {
            Some(mut r) if r.status == RecommendationStatus::Pending => {
                r.status = status;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use restock_model::ItemId;
    use std::str::FromStr;

    fn forecast(household: HouseholdId) -> ConsumptionForecast {
        ConsumptionForecast {
            item_id: ItemId::from_str("wipes").unwrap(),
            household_id: household,
            generated_at: Utc.with_ymd_and_hms(2026, 8, 20, 0, 0, 0).unwrap(),
            daily_rate: 2.0,
            weekly_rate: 14.0,
            predicted_depletion_date: chrono::NaiveDate::from_ymd_opt(2026, 8, 25).unwrap(),
            confidence: 0.8,
            model_version: "test/1".to_string(),
            data_quality_issue: false,
        }
    }

    fn create(store: &RecommendationStore, household: HouseholdId) -> RecommendationId {
        store.create(
            household,
            CycleId::new(),
            ItemBundle::single(ItemId::from_str("wipes").unwrap(), 1),
            Some(forecast(household)),
            Vec::new(),
            "auto-approval disabled",
            false,
        )
    }

    #[test]
    fn latest_pending_ignores_settled_recommendations() {
        let store = RecommendationStore::new();
        let household = HouseholdId::new();
        let first = create(&store, household);
        let second = create(&store, household);
        assert!(store.settle(second, RecommendationStatus::Cancelled));

        let latest = store.latest_pending(household).unwrap();
        assert_eq!(latest.recommendation_id, first);
    }

    #[test]
    fn settle_is_single_shot() {
        let store = RecommendationStore::new();
        let id = create(&store, HouseholdId::new());
        assert!(store.settle(id, RecommendationStatus::Approved));
        assert!(!store.settle(id, RecommendationStatus::Cancelled));
    }
}
