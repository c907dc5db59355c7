//! Engine error taxonomy
//!
//! Conditions with a well-defined fallback (data quality, single-retailer
//! failure, budget refusal) never reach this enum: they are resolved into a
//! cycle outcome locally. What remains here are genuine faults and misuse of
//! the facade.

use crate::scheduler::CycleState;
use restock_budget::BudgetError;
use restock_forecast::LedgerError;
use restock_gateway::GatewayError;
use restock_model::{HouseholdId, RecommendationId};
use restock_order::OrderError;

/// Errors surfaced by the engine facade
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Household was never registered with the engine
    #[error("unknown household {0}")]
    UnknownHousehold(HouseholdId),

    /// No recommendation with the given id
    #[error("unknown recommendation {0}")]
    UnknownRecommendation(RecommendationId),

    /// Recommendation already approved or cancelled
    #[error("recommendation {0} is not pending")]
    RecommendationNotPending(RecommendationId),

    /// Cycle state machine violation; indicates an engine bug
    #[error("illegal cycle transition: {from:?} -> {to:?}")]
    IllegalCycleTransition { from: CycleState, to: CycleState },

    /// Gateway pool fault
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Budget ledger fault
    #[error(transparent)]
    Budget(#[from] BudgetError),

    /// Order lifecycle fault
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Usage ledger rejected a data point
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Audit log fault
    #[error(transparent)]
    Audit(#[from] crate::audit::AuditError),
}

impl EngineError {
    /// Whether the condition needs human attention rather than retry
    ///
    /// A household due for reorder must never be dropped silently; these
    /// conditions have no safe automated fallback left.
    #[must_use]
    pub fn requires_attention(&self) -> bool {
        matches!(
            self,
            Self::Gateway(GatewayError::NoRetailerAvailable)
                | Self::Order(OrderError::SubmissionFailed { .. })
        )
    }
}
