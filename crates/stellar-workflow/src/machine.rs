//! The constellation state machine.
//!
//! ```text
//! draft --submit(owner, non-empty)--> work
//! work  --approve(moderator)-->       completed
//! work  --reject(moderator)-->        rejected
//! draft --delete(owner)-->            deleted
//! ```
//!
//! `completed`, `rejected` and `deleted` are terminal.

use chrono::{DateTime, Utc};
use stellar_core::{
    Actor, Constellation, ConstellationPatch, ConstellationStatus, Result, Role, StellarError,
};

/// A legal edge of the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Owner sends a non-empty draft for review.
    Submit,
    /// Moderator accepts a submitted constellation.
    Approve,
    /// Moderator turns down a submitted constellation.
    Reject,
    /// Owner discards a draft.
    Delete,
}

impl Transition {
    /// Status a row must be in for this transition.
    pub fn from(&self) -> ConstellationStatus {
        match self {
            Transition::Submit | Transition::Delete => ConstellationStatus::Draft,
            Transition::Approve | Transition::Reject => ConstellationStatus::Work,
        }
    }

    /// Status a row is in afterwards.
    pub fn to(&self) -> ConstellationStatus {
        match self {
            Transition::Submit => ConstellationStatus::Work,
            Transition::Approve => ConstellationStatus::Completed,
            Transition::Reject => ConstellationStatus::Rejected,
            Transition::Delete => ConstellationStatus::Deleted,
        }
    }

    /// Returns true if this is a review decision, reserved for moderators.
    /// Owner edges are never taken by a moderator.
    pub fn is_review(&self) -> bool {
        matches!(self, Transition::Approve | Transition::Reject)
    }

    /// Resolve a status-change request into a transition the role may perform.
    ///
    /// `draft` and `deleted` cannot be requested as targets; deletion has its own
    /// operation.
    pub fn requested(role: Role, target: ConstellationStatus) -> Result<Transition> {
        let transition = match target {
            ConstellationStatus::Work => Transition::Submit,
            ConstellationStatus::Completed => Transition::Approve,
            ConstellationStatus::Rejected => Transition::Reject,
            ConstellationStatus::Draft | ConstellationStatus::Deleted => {
                return Err(StellarError::Forbidden(format!(
                    "status '{target}' cannot be requested"
                )));
            }
        };

        if transition.is_review() != role.can_moderate() {
            return Err(StellarError::Forbidden(format!(
                "a {role} cannot move a constellation to '{target}'"
            )));
        }
        Ok(transition)
    }

    /// Check `row` may take this edge and build the resulting patch.
    pub fn apply(
        &self,
        row: &Constellation,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<ConstellationPatch> {
        if row.status != self.from() {
            return Err(StellarError::InvalidTransition {
                from: row.status,
                to: self.to(),
            });
        }

        let mut patch = ConstellationPatch {
            status: Some(self.to()),
            ..Default::default()
        };
        match self {
            Transition::Submit => patch.formed_at = Some(now),
            Transition::Approve | Transition::Reject => {
                patch.confirmed_at = Some(now);
                patch.moderator_id = Some(actor.id);
            }
            Transition::Delete => {}
        }
        Ok(patch)
    }
}
