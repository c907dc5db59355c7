//! Gateway error taxonomy
//!
//! Single-retailer failures (`Timeout`, `Unavailable`, `Rejected`,
//! `CircuitOpen`) are absorbed by the pool. `NoRetailerAvailable` is the one
//! pool-level failure and must be surfaced to the caller.

use restock_model::RetailerId;

/// Errors from retailer integrations and the pool
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Retailer did not respond within its timeout
    #[error("retailer {retailer} timed out")]
    Timeout { retailer: RetailerId },

    /// Retailer responded with a transport or availability failure
    #[error("retailer {retailer} unavailable: {reason}")]
    Unavailable { retailer: RetailerId, reason: String },

    /// Retailer accepted the query but rejected the order
    #[error("retailer {retailer} rejected order: {reason}")]
    Rejected { retailer: RetailerId, reason: String },

    /// Circuit breaker for the retailer is open
    #[error("retailer {retailer} circuit open")]
    CircuitOpen { retailer: RetailerId },

    /// No gateway configured for the retailer
    #[error("unknown retailer {0}")]
    UnknownRetailer(RetailerId),

    /// Every configured retailer failed or was skipped
    #[error("no retailer available")]
    NoRetailerAvailable,
}

impl GatewayError {
    /// Whether this failure counts against the retailer's circuit breaker
    ///
    /// Order rejections are business outcomes, not integration faults.
    #[inline]
    #[must_use]
    pub fn is_integration_fault(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Unavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn rejections_do_not_trip_the_breaker() {
        let retailer = RetailerId::from_str("quickmart").unwrap();
        assert!(GatewayError::Timeout {
            retailer: retailer.clone()
        }
        .is_integration_fault());
        assert!(!GatewayError::Rejected {
            retailer,
            reason: "out of stock".to_string()
        }
        .is_integration_fault());
    }
}
