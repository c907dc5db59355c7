//! Order lifecycle
//!
//! Owns a placed order from creation through its terminal state:
//! `Created → Submitted → Confirmed → Shipped → Delivered`, with the
//! `Submitted → SubmissionFailed → Retrying → (Submitted | Abandoned)`
//! side branch for unreliable retailer submission.
//!
//! Idempotency keys are derived from household + canonical bundle +
//! decision cycle, so a retried submission can never create a duplicate
//! order at the retailer.

#![allow(missing_docs)]

pub mod book;
pub mod order;
pub mod placement;
pub mod state;

pub use book::OrderBook;
pub use order::{IdempotencyKey, Order};
pub use placement::{OrderPlacer, RetryPolicy};
pub use state::{allowed_transitions, validate_transition, OrderState};

use restock_gateway::GatewayError;
use restock_model::OrderId;

/// Order lifecycle errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrderError {
    /// Transition not allowed by the lifecycle state machine
    #[error("illegal order transition: {from:?} -> {to:?}")]
    IllegalTransition { from: OrderState, to: OrderState },

    /// No order with the given id
    #[error("unknown order {0}")]
    UnknownOrder(OrderId),

    /// Retailer kept rejecting the submission; order abandoned
    #[error("submission failed after {attempts} attempt(s): {last}")]
    SubmissionFailed { attempts: u32, last: GatewayError },
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
