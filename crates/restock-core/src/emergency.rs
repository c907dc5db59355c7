//! Emergency escalation
//!
//! An emergency trigger skips the depletion-timing check entirely and goes
//! straight to evaluation with the expedited weight profile. The budget
//! ledger still applies unless the trigger carries an explicit override;
//! an override authorizes that single reservation up to its own limit,
//! leaving the monthly cap for ordinary reservations untouched.

use crate::error::EngineError;
use crate::events::{NotificationEvent, NotificationSink as _};
use crate::scheduler::{CycleOutcome, CycleState, ReorderScheduler};
use chrono::{DateTime, NaiveDate, Utc};
use restock_model::{HouseholdId, HouseholdLocation, ItemBundle, Money, ReorderPreferences};
use restock_model::CycleId;
use restock_optimizer::WeightProfile;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How badly the household needs the items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Urgent,
    Critical,
}

/// A household-declared emergency need
///
/// Short-lived: consumed by the handler and discarded after resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyTrigger {
    pub household_id: HouseholdId,
    pub items: ItemBundle,
    pub urgency: Urgency,
    /// Authorizes this order's reservation up to the given amount even if
    /// the monthly cap is exhausted
    pub max_budget_override: Option<Money>,
    pub declared_at: DateTime<Utc>,
}

impl EmergencyTrigger {
    /// Declare an emergency now
    #[must_use]
    pub fn new(household_id: HouseholdId, items: ItemBundle, urgency: Urgency) -> Self {
        Self {
            household_id,
            items,
            urgency,
            max_budget_override: None,
            declared_at: Utc::now(),
        }
    }

    /// With a budget override
    #[inline]
    #[must_use]
    pub fn with_budget_override(mut self, cap: Money) -> Self {
        self.max_budget_override = Some(cap);
        self
    }
}

/// Handles emergency triggers outside the scheduled cadence
pub struct EmergencyEscalationHandler {
    scheduler: Arc<ReorderScheduler>,
}

impl EmergencyEscalationHandler {
    /// Create a handler over the shared scheduler
    #[inline]
    #[must_use]
    pub fn new(scheduler: Arc<ReorderScheduler>) -> Self {
        Self { scheduler }
    }

    /// Process one trigger to an order or a pending recommendation
    ///
    /// Delivery speed outranks price here (expedited weight profile), and
    /// a budget miss without an override routes to manual approval with
    /// urgency flagged, exactly as in the scheduled path.
    ///
    /// # Errors
    /// Same fault surface as [`ReorderScheduler::run_cycle`]; budget misses
    /// and absent retailers resolve into the outcome instead.
    pub async fn escalate(
        &self,
        trigger: EmergencyTrigger,
        prefs: &ReorderPreferences,
        location: &HouseholdLocation,
        as_of: NaiveDate,
    ) -> Result<CycleOutcome, EngineError> {
        let cycle_id = CycleId::new();
        tracing::warn!(
            household = %trigger.household_id,
            urgency = ?trigger.urgency,
            budget_override = ?trigger.max_budget_override,
            "emergency escalation"
        );

        let outcome = self
            .scheduler
            .evaluate(
                CycleState::Evaluating,
                trigger.household_id,
                cycle_id,
                trigger.items.clone(),
                None,
                prefs,
                location,
                as_of,
                &WeightProfile::expedited(),
                true,
                trigger.max_budget_override,
            )
            .await?;

        let resolution = match &outcome {
            CycleOutcome::Ordered { order_id, .. } => format!("order {order_id} placed"),
            CycleOutcome::PendingApproval { reason, .. } | CycleOutcome::Failed { reason, .. } => {
                format!("pending approval: {reason}")
            }
            CycleOutcome::Skipped { reason } => format!("skipped: {reason}"),
            CycleOutcome::NoActionNeeded { .. } => "no action needed".to_string(),
        };
        self.scheduler
            .sink
            .notify(&NotificationEvent::EmergencyEscalated {
                household_id: trigger.household_id,
                urgency: trigger.urgency,
                resolution,
            });
        Ok(outcome)
    }
}
