//! Retailer gateway pool
//!
//! A uniform async interface over heterogeneous retailer integrations:
//! - [`RetailerGateway`]: the adapter trait (quote + order submission);
//!   provider-specific auth and rate limiting live behind it.
//! - [`CircuitBreaker`]: per-retailer Closed/Open/HalfOpen fault isolation.
//! - [`GatewayPool`]: concurrent fan-out across all configured retailers
//!   with independent per-call timeouts and an overall deadline.
//!
//! A single retailer failing or timing out never fails a pool query; it is
//! recorded as absent. Zero responders is the explicit
//! [`GatewayError::NoRetailerAvailable`], a reportable degraded-service
//! condition, never a silent empty result.

#![allow(missing_docs)]

pub mod breaker;
pub mod error;
pub mod pool;
pub mod quote;

pub use breaker::{BreakerState, CircuitBreaker};
pub use error::GatewayError;
pub use pool::{GatewayPool, PoolConfig};
pub use quote::{OrderConfirmation, QuoteLine, RetailerQuote};

use async_trait::async_trait;
use restock_model::{HouseholdLocation, ItemBundle, RetailerId};

/// One retailer integration
///
/// Adapters own provider-specific authentication, request shaping, and rate
/// limits. The pool owns timeouts and circuit breaking; implementations
/// should simply surface their provider's failures as [`GatewayError`]s.
#[async_trait]
pub trait RetailerGateway: Send + Sync {
    /// Stable identifier for this retailer
    fn retailer_id(&self) -> RetailerId;

    /// Price and availability for a bundle delivered to `location`
    async fn quote(
        &self,
        bundle: &ItemBundle,
        location: &HouseholdLocation,
    ) -> Result<RetailerQuote, GatewayError>;

    /// Submit an order
    ///
    /// `idempotency_key` is forwarded to the provider; submitting twice with
    /// the same key must not create a second order.
    async fn submit_order(
        &self,
        bundle: &ItemBundle,
        idempotency_key: &str,
    ) -> Result<OrderConfirmation, GatewayError>;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
