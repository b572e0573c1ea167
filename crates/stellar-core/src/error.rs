//! Error types for stellar operations.

use thiserror::Error;

use crate::types::{ConstellationId, ConstellationStatus, PlanetId, UserId};

/// Main error type for stellar operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StellarError {
    /// The calling identity carries a non-positive id.
    #[error("invalid actor id {0}")]
    InvalidActor(UserId),

    /// A path or body id is non-positive.
    #[error("invalid {resource} id {id}")]
    InvalidId { resource: &'static str, id: i64 },

    /// Resource is absent, deleted, or hidden from the caller.
    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: i64 },

    /// The constellation exists but belongs to another user.
    #[error("constellation {constellation_id} does not belong to user {user_id}")]
    NotOwned {
        constellation_id: ConstellationId,
        user_id: UserId,
    },

    /// The planet is not part of a draft owned by the caller.
    #[error("planet {planet_id} is not in a draft owned by user {user_id}")]
    NotOwnedOrNotDraft { planet_id: PlanetId, user_id: UserId },

    /// The current status does not allow the requested change.
    #[error("cannot move constellation from '{from}' to '{to}'")]
    InvalidTransition {
        from: ConstellationStatus,
        to: ConstellationStatus,
    },

    /// The caller's role lacks permission for the request.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Field edits are not allowed in the constellation's current status.
    #[error("constellation {id} is '{status}' and can no longer be edited")]
    NotEditable {
        id: ConstellationId,
        status: ConstellationStatus,
    },

    /// Submit was requested for a draft without planets.
    #[error("draft {0} has no planets")]
    EmptyDraft(ConstellationId),

    /// Submit was requested but the user has no draft.
    #[error("user {0} has no draft constellation")]
    NoDraft(UserId),

    /// The planet is already a member of the draft.
    #[error("planet {planet_id} is already in constellation {constellation_id}")]
    DuplicateMembership {
        constellation_id: ConstellationId,
        planet_id: PlanetId,
    },

    /// A second draft would be created for the same user.
    #[error("user {0} already has a draft constellation")]
    DraftConflict(UserId),

    /// An account with this email already exists.
    #[error("email '{0}' is already registered")]
    EmailTaken(String),

    /// Login failed. Unknown email and wrong password are not told apart.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Request data failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Relational store failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Object store failure.
    #[error("object store error: {0}")]
    ObjectStore(String),
}

/// Coarse classification used by delivery layers to pick a response code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Forbidden,
    NotFound,
    Conflict,
    Unauthenticated,
    Internal,
}

impl StellarError {
    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StellarError::InvalidActor(_)
            | StellarError::InvalidId { .. }
            | StellarError::NotOwned { .. }
            | StellarError::NotOwnedOrNotDraft { .. }
            | StellarError::InvalidTransition { .. }
            | StellarError::NotEditable { .. }
            | StellarError::EmptyDraft(_)
            | StellarError::NoDraft(_)
            | StellarError::DuplicateMembership { .. }
            | StellarError::Validation(_) => ErrorKind::Validation,
            StellarError::Forbidden(_) => ErrorKind::Forbidden,
            StellarError::NotFound { .. } => ErrorKind::NotFound,
            StellarError::DraftConflict(_) | StellarError::EmailTaken(_) => ErrorKind::Conflict,
            StellarError::InvalidCredentials => ErrorKind::Unauthenticated,
            StellarError::Storage(_) | StellarError::ObjectStore(_) => ErrorKind::Internal,
        }
    }

    /// Shorthand for a missing constellation.
    pub fn constellation_not_found(id: ConstellationId) -> Self {
        StellarError::NotFound {
            resource: "constellation",
            id,
        }
    }

    /// Shorthand for a missing or inactive planet.
    pub fn planet_not_found(id: PlanetId) -> Self {
        StellarError::NotFound {
            resource: "planet",
            id,
        }
    }
}

/// Convenience Result type for stellar operations.
pub type Result<T> = std::result::Result<T, StellarError>;

impl From<serde_json::Error> for StellarError {
    fn from(err: serde_json::Error) -> Self {
        StellarError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(StellarError::EmptyDraft(3).kind(), ErrorKind::Validation);
        assert_eq!(
            StellarError::Forbidden("moderators only".into()).kind(),
            ErrorKind::Forbidden
        );
        assert_eq!(StellarError::constellation_not_found(7).kind(), ErrorKind::NotFound);
        assert_eq!(StellarError::DraftConflict(1).kind(), ErrorKind::Conflict);
        assert_eq!(
            StellarError::EmailTaken("ada@example.org".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            StellarError::InvalidCredentials.kind(),
            ErrorKind::Unauthenticated
        );
        assert_eq!(StellarError::Storage("gone".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_transition_message() {
        let err = StellarError::InvalidTransition {
            from: ConstellationStatus::Completed,
            to: ConstellationStatus::Rejected,
        };
        assert_eq!(
            err.to_string(),
            "cannot move constellation from 'completed' to 'rejected'"
        );
    }
}
