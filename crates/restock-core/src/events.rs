//! Notification events
//!
//! The engine never blocks on user interaction; anything a person should
//! see leaves through a [`NotificationSink`]. Delivery (push, email, SMS)
//! is the dispatcher's problem, not ours.

use crate::emergency::Urgency;
use restock_model::{HouseholdId, Money, OrderId, RecommendationId, RetailerId};
use serde::{Deserialize, Serialize};

/// Structured event for the external notification dispatcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// A recommendation is waiting for manual approval
    PendingApproval {
        household_id: HouseholdId,
        recommendation_id: RecommendationId,
        /// Display-ready reason, e.g. "monthly budget exceeded"
        reason: String,
        /// Set for emergency-path recommendations
        urgent: bool,
    },
    /// A due reorder could not be evaluated; degraded service
    Skipped {
        household_id: HouseholdId,
        reason: String,
    },
    /// An order was placed automatically
    OrderPlaced {
        household_id: HouseholdId,
        order_id: OrderId,
        retailer_id: RetailerId,
        price: Money,
    },
    /// An emergency trigger was processed
    EmergencyEscalated {
        household_id: HouseholdId,
        urgency: Urgency,
        /// What the escalation resolved to, display-ready
        resolution: String,
    },
}

impl NotificationEvent {
    /// Household the event concerns
    #[must_use]
    pub fn household_id(&self) -> HouseholdId {
        match self {
            Self::PendingApproval { household_id, .. }
            | Self::Skipped { household_id, .. }
            | Self::OrderPlaced { household_id, .. }
            | Self::EmergencyEscalated { household_id, .. } => *household_id,
        }
    }
}

/// Destination for engine notifications
pub trait NotificationSink: Send + Sync {
    /// Deliver one event; must not block the decision cycle
    fn notify(&self, event: &NotificationEvent);
}

/// Default sink: structured log records
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, event: &NotificationEvent) {
        match event {
            NotificationEvent::PendingApproval {
                household_id,
                recommendation_id,
                reason,
                urgent,
            } => tracing::info!(
                household = %household_id,
                recommendation = %recommendation_id,
                urgent,
                reason,
                "recommendation pending approval"
            ),
            NotificationEvent::Skipped {
                household_id,
                reason,
            } => tracing::warn!(household = %household_id, reason, "reorder cycle skipped"),
            NotificationEvent::OrderPlaced {
                household_id,
                order_id,
                retailer_id,
                price,
            } => tracing::info!(
                household = %household_id,
                order = %order_id,
                retailer = %retailer_id,
                %price,
                "order placed"
            ),
            NotificationEvent::EmergencyEscalated {
                household_id,
                urgency,
                resolution,
            } => tracing::warn!(
                household = %household_id,
                ?urgency,
                resolution,
                "emergency escalation handled"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn household_id_is_uniform_across_variants() {
        let household = HouseholdId::new();
        let event = NotificationEvent::Skipped {
            household_id: household,
            reason: "no retailer responded".to_string(),
        };
        assert_eq!(event.household_id(), household);
    }
}
