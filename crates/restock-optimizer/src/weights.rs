//! Scoring weight profiles
//!
//! Weights are integer per-mille multipliers over milli-point score terms.
//! Two profiles ship: the standard one, price-led, and the expedited one
//! used by emergency escalation, where delivery ETA dominates price.

use serde::{Deserialize, Serialize};

/// Weighted-score multipliers (per-mille)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightProfile {
    /// Total price, normalized against the cheapest quote
    pub price: i64,
    /// Delivery ETA against the preferred window
    pub eta: i64,
    /// Position in the household's retailer priority list
    pub priority: i64,
    /// Retailer-reported availability confidence
    pub availability: i64,
    /// Items of the request the quote cannot fulfill
    pub coverage: i64,
    /// Consolidation bonus for one retailer beating the cheapest split
    pub bulk: i64,
}

impl WeightProfile {
    /// Price-led profile for scheduled reordering
    #[must_use]
    pub fn standard() -> Self {
        Self {
            price: 500,
            eta: 200,
            priority: 150,
            availability: 100,
            coverage: 800,
            bulk: 150,
        }
    }

    /// ETA-led profile for emergency escalation
    #[must_use]
    pub fn expedited() -> Self {
        Self {
            price: 150,
            eta: 600,
            priority: 100,
            availability: 150,
            coverage: 800,
            bulk: 50,
        }
    }
}

impl Default for WeightProfile {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expedited_weights_eta_over_price() {
        let expedited = WeightProfile::expedited();
        assert!(expedited.eta > expedited.price);

        let standard = WeightProfile::standard();
        assert!(standard.price > standard.eta);
    }
}
