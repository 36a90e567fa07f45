//! Request lifecycle
//!
//! A request moves `Received -> Model -> [Runtime] -> Verify -> Committed`.
//! Every non-terminal state may fall to `RolledBack`.

use crate::error::ControllerError;
use serde::Serialize;

/// Lifecycle state of one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionState {
    /// Accepted, no step run yet
    Received,
    /// Validating parameters and writing the tree
    Model,
    /// Installing or removing services
    Runtime,
    /// Re-checking the rebased tree under the commit lock
    Verify,
    /// Published
    Committed,
    /// Undone
    RolledBack,
}

/// Stage a step is queued for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// Model stage
    Model,
    /// Runtime stage
    Runtime,
    /// Verify stage
    Verify,
}

impl Stage {
    /// All stages in execution order
    pub const ALL: [Stage; 3] = [Stage::Model, Stage::Runtime, Stage::Verify];

    /// Lifecycle state while the stage runs
    #[must_use]
    pub fn state(self) -> TransactionState {
        match self {
            Stage::Model => TransactionState::Model,
            Stage::Runtime => TransactionState::Runtime,
            Stage::Verify => TransactionState::Verify,
        }
    }
}

/// States reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: TransactionState) -> Vec<TransactionState> {
    use TransactionState::*;
    match from {
        Received => vec![Model, RolledBack],
        Model => vec![Runtime, Verify, RolledBack],
        Runtime => vec![Verify, RolledBack],
        Verify => vec![Committed, RolledBack],
        Committed | RolledBack => vec![],
    }
}

/// Validate a lifecycle transition
///
/// # Errors
/// [`ControllerError::IllegalTransition`] if `to` is not reachable from `from`.
pub fn validate_transition(
    from: TransactionState,
    to: TransactionState,
) -> Result<(), ControllerError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(ControllerError::IllegalTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use TransactionState::*;

    fn any_state() -> impl Strategy<Value = TransactionState> {
        prop_oneof![
            Just(Received),
            Just(Model),
            Just(Runtime),
            Just(Verify),
            Just(Committed),
            Just(RolledBack),
        ]
    }

    #[test]
    fn runtime_stage_is_optional() {
        assert!(validate_transition(Model, Verify).is_ok());
        assert!(validate_transition(Model, Runtime).is_ok());
        assert!(validate_transition(Received, Verify).is_err());
        assert!(validate_transition(Committed, RolledBack).is_err());
    }

    proptest! {
        #[test]
        fn prop_transitions_are_subset_of_allowed(from in any_state(), to in any_state()) {
            let res = validate_transition(from, to);
            let allowed = allowed_transitions(from);
            prop_assert_eq!(res.is_ok(), allowed.contains(&to));
        }

        #[test]
        fn prop_every_live_state_can_roll_back(from in any_state()) {
            let terminal = matches!(from, Committed | RolledBack);
            prop_assert_eq!(validate_transition(from, RolledBack).is_ok(), !terminal);
        }
    }
}
