//! State machine trait for status enums.
//!
//! Statuses that only move forward (deposit requests, payment settlement)
//! implement this so every mutation goes through a checked transition.

use super::ValidationError;

/// Forward-only status enum.
///
/// ```ignore
/// let next = request.status.transition_to(BalanceRequestStatus::Approved)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Whether `target` is reachable in one step.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Every status reachable in one step.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Returns `target`, or a validation error naming both statuses.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "status",
                format!("cannot move from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Resolved statuses have no outgoing edges.
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
