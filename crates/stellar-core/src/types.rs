//! Common types used across the stellar workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StellarError;

/// Identifier of a constellation row.
pub type ConstellationId = i64;

/// Identifier of a catalog planet.
pub type PlanetId = i64;

/// Identifier of a user (owner or moderator).
pub type UserId = i64;

/// Status of a constellation in the approval workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstellationStatus {
    /// Mutable pre-submission collection. At most one per user.
    Draft,
    /// Submitted by the owner, awaiting a moderator decision.
    Work,
    /// Approved by a moderator.
    Completed,
    /// Rejected by a moderator.
    Rejected,
    /// Removed by its owner while still a draft.
    Deleted,
}

impl ConstellationStatus {
    /// Every status value, in workflow order.
    pub const ALL: [ConstellationStatus; 5] = [
        ConstellationStatus::Draft,
        ConstellationStatus::Work,
        ConstellationStatus::Completed,
        ConstellationStatus::Rejected,
        ConstellationStatus::Deleted,
    ];

    /// Returns true if no transition may leave this status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConstellationStatus::Completed
                | ConstellationStatus::Rejected
                | ConstellationStatus::Deleted
        )
    }

    /// Returns true if rows in this status are visible through reads.
    pub fn is_visible(&self) -> bool {
        *self != ConstellationStatus::Deleted
    }

    /// Stable lowercase name, as stored and serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstellationStatus::Draft => "draft",
            ConstellationStatus::Work => "work",
            ConstellationStatus::Completed => "completed",
            ConstellationStatus::Rejected => "rejected",
            ConstellationStatus::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ConstellationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog status of a planet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlanetStatus {
    /// Listed in the catalog and addable to drafts.
    #[default]
    Active,
    /// Soft-deleted from the catalog.
    Deleted,
}

/// Role of the calling identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Plain user; owns drafts and submits them.
    #[default]
    User,
    /// Approves or rejects submitted constellations and curates the catalog.
    Moderator,
}

impl Role {
    /// Returns true if this role may approve or reject submitted constellations.
    pub fn can_moderate(&self) -> bool {
        matches!(self, Role::Moderator)
    }

    /// Returns true if this role may create, edit and delete catalog planets.
    pub fn can_curate_catalog(&self) -> bool {
        matches!(self, Role::Moderator)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Moderator => f.write_str("moderator"),
        }
    }
}

/// The authenticated caller of an operation, resolved upstream by the access guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// User id of the caller.
    pub id: UserId,
    /// Role of the caller.
    pub role: Role,
}

impl Actor {
    /// A plain user.
    pub fn user(id: UserId) -> Self {
        Self { id, role: Role::User }
    }

    /// A moderator.
    pub fn moderator(id: UserId) -> Self {
        Self {
            id,
            role: Role::Moderator,
        }
    }

    /// Fails with `InvalidActor` unless the id is positive.
    pub fn validate(&self) -> crate::Result<()> {
        if self.id <= 0 {
            return Err(StellarError::InvalidActor(self.id));
        }
        Ok(())
    }
}
