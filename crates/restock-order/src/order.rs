//! Orders and idempotency keys

use crate::state::{validate_transition, OrderState};
use crate::OrderError;
use chrono::{DateTime, Utc};
use restock_gateway::OrderConfirmation;
use restock_model::{CycleId, HouseholdId, ItemBundle, Money, OrderId, RetailerId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::{self, Display, Formatter};

/// Deterministic key preventing duplicate placement on retry
///
/// Derived from household + canonical bundle + decision cycle: the same
/// decision retried always produces the same key, while a new decision
/// cycle for the same items produces a fresh one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Derive the key for one decision
    #[must_use]
    pub fn derive(household_id: HouseholdId, bundle: &ItemBundle, cycle_id: CycleId) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(household_id.to_string().as_bytes());
        hasher.update([0]);
        // Bundle lines are canonically sorted, so equal bundles hash equal.
        for line in bundle.lines() {
            hasher.update(line.item_id.as_str().as_bytes());
            hasher.update(line.quantity.to_le_bytes());
            hasher.update([0]);
        }
        hasher.update(cycle_id.to_string().as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// The key as a string for forwarding to retailers
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for IdempotencyKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One placed (or placing) order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub household_id: HouseholdId,
    pub bundle: ItemBundle,
    pub retailer_id: RetailerId,
    pub price: Money,
    pub created_at: DateTime<Utc>,
    pub state: OrderState,
    pub idempotency_key: IdempotencyKey,
    /// Submission attempts so far
    pub attempts: u32,
    /// Retailer confirmation once submission succeeds
    pub confirmation: Option<OrderConfirmation>,
}

impl Order {
    /// Create a new order in `Created`
    #[must_use]
    pub fn new(
        household_id: HouseholdId,
        bundle: ItemBundle,
        retailer_id: RetailerId,
        price: Money,
        idempotency_key: IdempotencyKey,
    ) -> Self {
        Self {
            order_id: OrderId::new(),
            household_id,
            bundle,
            retailer_id,
            price,
            created_at: Utc::now(),
            state: OrderState::Created,
            idempotency_key,
            attempts: 0,
            confirmation: None,
        }
    }

    /// Move to a new state, validating the transition
    ///
    /// # Errors
    /// `OrderError::IllegalTransition` if the lifecycle does not allow it.
    pub fn transition(&mut self, to: OrderState) -> Result<(), OrderError> {
        validate_transition(self.state, to)?;
        tracing::debug!(order = %self.order_id, from = ?self.state, to = ?to, "order transition");
        self.state = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restock_model::{BundleLine, ItemId};
    use std::str::FromStr;

    fn bundle() -> ItemBundle {
        ItemBundle::new([
            BundleLine::new(ItemId::from_str("wipes").unwrap(), 2),
            BundleLine::new(ItemId::from_str("diapers-size4").unwrap(), 1),
        ])
    }

    #[test]
    fn key_is_stable_for_same_decision() {
        let household = HouseholdId::new();
        let cycle = CycleId::new();
        let a = IdempotencyKey::derive(household, &bundle(), cycle);
        let b = IdempotencyKey::derive(household, &bundle(), cycle);
        assert_eq!(a, b);
    }

    #[test]
    fn key_differs_across_cycles() {
        let household = HouseholdId::new();
        let a = IdempotencyKey::derive(household, &bundle(), CycleId::new());
        let b = IdempotencyKey::derive(household, &bundle(), CycleId::new());
        assert_ne!(a, b);
    }

    #[test]
    fn key_ignores_line_ordering() {
        let household = HouseholdId::new();
        let cycle = CycleId::new();
        let reversed = ItemBundle::new([
            BundleLine::new(ItemId::from_str("diapers-size4").unwrap(), 1),
            BundleLine::new(ItemId::from_str("wipes").unwrap(), 2),
        ]);
        assert_eq!(
            IdempotencyKey::derive(household, &bundle(), cycle),
            IdempotencyKey::derive(household, &reversed, cycle),
        );
    }

    #[test]
    fn new_orders_start_created() {
        let household = HouseholdId::new();
        let key = IdempotencyKey::derive(household, &bundle(), CycleId::new());
        let order = Order::new(
            household,
            bundle(),
            RetailerId::from_str("quickmart").unwrap(),
            Money::from_cents(2400),
            key,
        );
        assert_eq!(order.state, OrderState::Created);
        assert_eq!(order.attempts, 0);
    }
}
