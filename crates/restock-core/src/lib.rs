//! Reorder decision engine
//!
//! Ties the replenishment subsystems together:
//! - [`ReorderScheduler`]: one decision cycle per household per cadence,
//!   walking the cycle state machine from forecast to order.
//! - [`EmergencyEscalationHandler`]: out-of-cadence escalation that skips
//!   the timing check but still respects the budget ledger.
//! - [`DecisionAuditLog`]: hash-chained record of every decision.
//! - [`ReplenishmentEngine`]: the facade collaborators call.
//!
//! The engine resolves expected conditions (budget refusal, low forecast
//! confidence, absent retailers) into cycle outcomes, and reserves its
//! error type for genuine faults.

#![allow(missing_docs)]

pub mod audit;
pub mod config;
pub mod emergency;
pub mod engine;
pub mod error;
pub mod events;
pub mod recommendation;
pub mod scheduler;

pub use audit::{AuditError, DecisionAuditLog, DecisionRecord};
pub use config::EngineConfig;
pub use emergency::{EmergencyEscalationHandler, EmergencyTrigger, Urgency};
pub use engine::ReplenishmentEngine;
pub use error::EngineError;
pub use events::{NotificationEvent, NotificationSink, TracingSink};
pub use recommendation::{Recommendation, RecommendationStatus, RecommendationStore};
pub use scheduler::{
    allowed_transitions, validate_transition, CycleOutcome, CycleState, ReorderScheduler,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
