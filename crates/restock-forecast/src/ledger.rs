//! Append-only usage ledger
//!
//! Stores observed consumption events per `(household, item)`. Entries are
//! never mutated or removed. Suspect data (negative quantities) is still
//! recorded; data quality is judged at forecast time, where it degrades
//! confidence rather than being rejected at the door. Only non-finite
//! quantities are refused, since they cannot mean anything downstream.

use dashmap::DashMap;
use restock_model::{HouseholdId, ItemId, UsageDataPoint};

/// Errors recording usage
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    /// Quantity was NaN or infinite
    #[error("non-finite quantity {0} for item {1}")]
    NonFiniteQuantity(f64, ItemId),
}

/// Append-only store of usage observations
#[derive(Debug, Default)]
pub struct UsageLedger {
    entries: DashMap<(HouseholdId, ItemId), Vec<UsageDataPoint>>,
}

impl UsageLedger {
    /// Create an empty ledger
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observation
    ///
    /// # Errors
    /// `LedgerError::NonFiniteQuantity` if the quantity is NaN or infinite.
    pub fn record(&self, point: UsageDataPoint) -> Result<(), LedgerError> {
        if !point.quantity.is_finite() {
            return Err(LedgerError::NonFiniteQuantity(
                point.quantity,
                point.item_id.clone(),
            ));
        }
        let key = (point.household_id, point.item_id.clone());
        self.entries.entry(key).or_default().push(point);
        Ok(())
    }

    /// History for one household/item, sorted by recording time
    #[must_use]
    pub fn history(&self, household_id: HouseholdId, item_id: &ItemId) -> Vec<UsageDataPoint> {
        let mut points = self
            .entries
            .get(&(household_id, item_id.clone()))
            .map(|e| e.value().clone())
            .unwrap_or_default();
        points.sort_by_key(|p| p.recorded_at);
        points
    }

    /// Number of observations for one household/item
    #[must_use]
    pub fn point_count(&self, household_id: HouseholdId, item_id: &ItemId) -> usize {
        self.entries
            .get(&(household_id, item_id.clone()))
            .map_or(0, |e| e.value().len())
    }

    /// Item ids with any history for a household
    #[must_use]
    pub fn items_for(&self, household_id: HouseholdId) -> Vec<ItemId> {
        let mut items: Vec<ItemId> = self
            .entries
            .iter()
            .filter(|e| e.key().0 == household_id)
            .map(|e| e.key().1.clone())
            .collect();
        items.sort();
        items
    }
}
