//! Fulfillment options
//!
//! A fulfillment option is one priced, retailer-specific way to satisfy a
//! bundle. Options are ephemeral: computed per decision cycle and persisted
//! only in the decision audit trail.

use chrono::NaiveDate;
use restock_model::{ItemBundle, Money, RetailerId};
use serde::{Deserialize, Serialize};

/// One ranked way to fulfill a bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FulfillmentOption {
    pub retailer_id: RetailerId,
    /// The items this option delivers; may be a subset of the request
    pub item_bundle: ItemBundle,
    pub total_price: Money,
    pub estimated_delivery_date: NaiveDate,
    /// Retailer-reported stock confidence, in `[0, 1]`
    pub confidence_of_availability: f64,
    /// Whether the option covers the full requested bundle
    pub covers_request: bool,
    /// Set when `total_price` exceeds the household's per-order cap.
    /// Flagged here, enforced by the scheduler.
    pub exceeds_cap: bool,
    /// Weighted score in milli-points; lower ranks earlier
    pub score: i64,
}
