//! Household reorder preferences
//!
//! Owned by the household and mutated only through explicit user action.
//! Every optional behavior is a named, typed field with a documented default;
//! there is deliberately no loosely-typed settings map.

use crate::ids::{HouseholdId, RetailerId};
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// Preferred delivery timing, in days from order placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryWindow {
    /// Deliveries sooner than this are acceptable but earn no extra score
    pub earliest_days: u32,
    /// Deliveries later than this are penalized by the optimizer
    pub latest_days: u32,
}

impl Default for DeliveryWindow {
    fn default() -> Self {
        Self {
            earliest_days: 1,
            latest_days: 4,
        }
    }
}

/// Per-household reorder configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderPreferences {
    pub household_id: HouseholdId,
    /// Whether the engine may place orders without manual approval
    pub auto_approve_enabled: bool,
    /// Lead time before predicted depletion at which a reorder triggers
    pub buffer_days: u32,
    /// Monthly spend ceiling across all orders; `None` disables the cap
    pub monthly_budget_cap: Option<Money>,
    /// Per-order spend ceiling; `None` disables the cap
    pub per_order_cap: Option<Money>,
    /// Preferred retailers, best first
    pub retailer_priority: Vec<RetailerId>,
    /// Retailers never to order from
    pub retailer_excludes: Vec<RetailerId>,
    /// Preferred delivery timing
    pub delivery_window: DeliveryWindow,
}

impl ReorderPreferences {
    /// Defaults: manual approval, 3 buffer days, no caps
    #[must_use]
    pub fn new(household_id: HouseholdId) -> Self {
        Self {
            household_id,
            auto_approve_enabled: false,
            buffer_days: 3,
            monthly_budget_cap: None,
            per_order_cap: None,
            retailer_priority: Vec::new(),
            retailer_excludes: Vec::new(),
            delivery_window: DeliveryWindow::default(),
        }
    }

    /// Enable or disable auto-approval
    #[inline]
    #[must_use]
    pub fn with_auto_approve(mut self, enabled: bool) -> Self {
        self.auto_approve_enabled = enabled;
        self
    }

    /// With buffer days
    #[inline]
    #[must_use]
    pub fn with_buffer_days(mut self, days: u32) -> Self {
        self.buffer_days = days;
        self
    }

    /// With monthly budget cap
    #[inline]
    #[must_use]
    pub fn with_monthly_cap(mut self, cap: Money) -> Self {
        self.monthly_budget_cap = Some(cap);
        self
    }

    /// With per-order cap
    #[inline]
    #[must_use]
    pub fn with_per_order_cap(mut self, cap: Money) -> Self {
        self.per_order_cap = Some(cap);
        self
    }

    /// With retailer priority list, best first
    #[inline]
    #[must_use]
    pub fn with_retailer_priority(mut self, priority: Vec<RetailerId>) -> Self {
        self.retailer_priority = priority;
        self
    }

    /// With excluded retailers
    #[inline]
    #[must_use]
    pub fn with_retailer_excludes(mut self, excludes: Vec<RetailerId>) -> Self {
        self.retailer_excludes = excludes;
        self
    }

    /// With delivery window
    #[inline]
    #[must_use]
    pub fn with_delivery_window(mut self, window: DeliveryWindow) -> Self {
        self.delivery_window = window;
        self
    }

    /// Position of a retailer in the priority list, if present
    #[must_use]
    pub fn priority_rank(&self, retailer: &RetailerId) -> Option<usize> {
        self.retailer_priority.iter().position(|r| r == retailer)
    }

    /// Whether the retailer is excluded
    #[inline]
    #[must_use]
    pub fn is_excluded(&self, retailer: &RetailerId) -> bool {
        self.retailer_excludes.contains(retailer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn defaults_are_conservative() {
        let prefs = ReorderPreferences::new(HouseholdId::new());
        assert!(!prefs.auto_approve_enabled);
        assert_eq!(prefs.buffer_days, 3);
        assert!(prefs.monthly_budget_cap.is_none());
        assert!(prefs.per_order_cap.is_none());
    }

    #[test]
    fn priority_rank_and_excludes() {
        let quickmart = RetailerId::from_str("quickmart").unwrap();
        let bulkbarn = RetailerId::from_str("bulkbarn").unwrap();
        let banned = RetailerId::from_str("banned").unwrap();

        let prefs = ReorderPreferences::new(HouseholdId::new())
            .with_retailer_priority(vec![quickmart.clone(), bulkbarn.clone()])
            .with_retailer_excludes(vec![banned.clone()]);

        assert_eq!(prefs.priority_rank(&quickmart), Some(0));
        assert_eq!(prefs.priority_rank(&bulkbarn), Some(1));
        assert_eq!(prefs.priority_rank(&banned), None);
        assert!(prefs.is_excluded(&banned));
        assert!(!prefs.is_excluded(&quickmart));
    }
}
