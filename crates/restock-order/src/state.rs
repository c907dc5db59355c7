//! Order state machine

use crate::OrderError;
use serde::{Deserialize, Serialize};

/// Lifecycle states of a placed order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    Created,
    Submitted,
    SubmissionFailed,
    Retrying,
    Confirmed,
    Shipped,
    Delivered,
    Abandoned,
}

impl OrderState {
    /// Whether the state is terminal
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Abandoned)
    }

    /// Whether the order has reached the retailer
    ///
    /// Cancellation before this point is a local operation; after it, only
    /// best-effort cancellation with the retailer remains.
    #[inline]
    #[must_use]
    pub fn is_submitted(self) -> bool {
        !matches!(self, Self::Created)
    }
}

/// States reachable from `from`
#[must_use]
pub fn allowed_transitions(from: OrderState) -> Vec<OrderState> {
    use OrderState::*;
    match from {
        Created => vec![Submitted],
        Submitted => vec![Confirmed, SubmissionFailed],
        SubmissionFailed => vec![Retrying, Abandoned],
        Retrying => vec![Submitted, Abandoned],
        Confirmed => vec![Shipped],
        Shipped => vec![Delivered],
        Delivered => vec![],
        Abandoned => vec![],
    }
}

/// Validate a state transition
///
/// # Errors
/// `OrderError::IllegalTransition` if the lifecycle does not allow it.
pub fn validate_transition(from: OrderState, to: OrderState) -> Result<(), OrderError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(OrderError::IllegalTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_is_legal() {
        use OrderState::*;
        let path = [Created, Submitted, Confirmed, Shipped, Delivered];
        for pair in path.windows(2) {
            validate_transition(pair[0], pair[1]).unwrap();
        }
    }

    #[test]
    fn retry_branch_is_legal() {
        use OrderState::*;
        validate_transition(Submitted, SubmissionFailed).unwrap();
        validate_transition(SubmissionFailed, Retrying).unwrap();
        validate_transition(Retrying, Submitted).unwrap();
        validate_transition(Retrying, Abandoned).unwrap();
    }

    #[test]
    fn terminal_states_have_no_exits() {
        assert!(allowed_transitions(OrderState::Delivered).is_empty());
        assert!(allowed_transitions(OrderState::Abandoned).is_empty());
        assert!(OrderState::Delivered.is_terminal());
        assert!(OrderState::Abandoned.is_terminal());
    }

    #[test]
    fn skipping_states_is_illegal() {
        let err = validate_transition(OrderState::Created, OrderState::Delivered).unwrap_err();
        assert!(matches!(err, OrderError::IllegalTransition { .. }));
    }
}
