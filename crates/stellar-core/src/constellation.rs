//! Constellation records, filters and patches.
//!
//! A constellation is a user-assembled collection of catalog planets that moves
//! through the approval workflow `draft -> work -> completed | rejected`, or
//! `draft -> deleted`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StellarError};
use crate::planet::PlanetSummary;
use crate::types::{ConstellationId, ConstellationStatus, UserId};

/// Name given to a draft created implicitly by the first planet addition.
pub const DEFAULT_DRAFT_NAME: &str = "Constellation";

/// A persisted constellation row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constellation {
    /// Unique identifier.
    pub id: ConstellationId,

    /// Display name chosen by the owner.
    pub name: String,

    /// Observation window start.
    pub start_date: DateTime<Utc>,

    /// Observation window end.
    pub end_date: DateTime<Utc>,

    /// When the draft was created.
    pub created_at: DateTime<Utc>,

    /// When the owner submitted the draft.
    pub formed_at: Option<DateTime<Utc>>,

    /// When a moderator approved or rejected it.
    pub confirmed_at: Option<DateTime<Utc>>,

    /// Current workflow status.
    pub status: ConstellationStatus,

    /// Owning user.
    pub user_id: UserId,

    /// Moderator who made the final decision.
    pub moderator_id: Option<UserId>,
}

impl Constellation {
    /// Returns true if `user_id` owns this constellation.
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}

/// Values for inserting a new constellation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewConstellation {
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub status: ConstellationStatus,
    pub user_id: UserId,
}

impl NewConstellation {
    /// A fresh placeholder draft for `user_id`, stamped with `now`.
    pub fn draft(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            name: DEFAULT_DRAFT_NAME.to_string(),
            start_date: now,
            end_date: now,
            created_at: now,
            status: ConstellationStatus::Draft,
            user_id,
        }
    }
}

/// Partial update of a constellation row. `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstellationPatch {
    pub name: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<ConstellationStatus>,
    pub formed_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub moderator_id: Option<UserId>,
}

impl ConstellationPatch {
    /// Apply this patch to `row` in place.
    pub fn apply(self, row: &mut Constellation) {
        if let Some(name) = self.name {
            row.name = name;
        }
        if let Some(start_date) = self.start_date {
            row.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            row.end_date = end_date;
        }
        if let Some(status) = self.status {
            row.status = status;
        }
        if self.formed_at.is_some() {
            row.formed_at = self.formed_at;
        }
        if self.confirmed_at.is_some() {
            row.confirmed_at = self.confirmed_at;
        }
        if self.moderator_id.is_some() {
            row.moderator_id = self.moderator_id;
        }
    }
}

/// Owner-editable fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstellationFields {
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl ConstellationFields {
    /// Check the fields are internally consistent.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(StellarError::Validation(
                "constellation name must not be empty".to_string(),
            ));
        }
        if self.start_date > self.end_date {
            return Err(StellarError::Validation(
                "start_date must not be after end_date".to_string(),
            ));
        }
        Ok(())
    }

    /// Convert into a row patch.
    pub fn into_patch(self) -> ConstellationPatch {
        ConstellationPatch {
            name: Some(self.name.trim().to_string()),
            start_date: Some(self.start_date),
            end_date: Some(self.end_date),
            ..Default::default()
        }
    }
}

/// Caller-supplied list filters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstellationQuery {
    /// Case-insensitive name prefix.
    pub name_prefix: Option<String>,

    /// Case-insensitive status prefix.
    pub status_prefix: Option<String>,

    /// Inclusive lower bound on the formation timestamp.
    pub formed_from: Option<DateTime<Utc>>,

    /// Inclusive upper bound on the formation timestamp.
    pub formed_to: Option<DateTime<Utc>>,
}

/// Ordering by creation timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Store-level filter. Deleted rows never match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstellationFilter {
    /// Restrict to a single owner.
    pub owner: Option<UserId>,

    /// Caller-supplied filters.
    pub query: ConstellationQuery,

    /// Ordering by `created_at`.
    pub order: SortOrder,
}

impl ConstellationFilter {
    /// Returns true if `row` passes every filter.
    pub fn matches(&self, row: &Constellation) -> bool {
        if !row.status.is_visible() {
            return false;
        }
        if let Some(owner) = self.owner {
            if row.user_id != owner {
                return false;
            }
        }
        if let Some(prefix) = non_blank(&self.query.name_prefix) {
            if !starts_with_ignore_case(&row.name, prefix) {
                return false;
            }
        }
        if let Some(prefix) = non_blank(&self.query.status_prefix) {
            if !starts_with_ignore_case(row.status.as_str(), prefix) {
                return false;
            }
        }
        // The range applies only when both bounds are given.
        if let (Some(from), Some(to)) = (self.query.formed_from, self.query.formed_to) {
            match row.formed_at {
                Some(formed) if formed >= from && formed <= to => {}
                _ => return false,
            }
        }
        true
    }

    /// Sort `rows` according to `order`, breaking ties by id.
    pub fn sort(&self, rows: &mut [Constellation]) {
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        if self.order == SortOrder::Descending {
            rows.reverse();
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Case-insensitive prefix test.
pub fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack.to_lowercase().starts_with(&prefix.to_lowercase())
}

/// A constellation row with its owner's display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstellationListing {
    #[serde(flatten)]
    pub constellation: Constellation,
    /// Full name of the owner; absent when the owner has no account row.
    pub owner_name: Option<String>,
}

/// A constellation together with its current planet membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstellationDetail {
    #[serde(flatten)]
    pub constellation: Constellation,
    pub owner_name: Option<String>,
    pub planets: Vec<PlanetSummary>,
}
