//! # Stellar Core
//!
//! Domain types for the planet catalog and the constellation approval workflow.
//!
//! This crate provides the fundamental building blocks:
//! - [`Constellation`] - a user's collection of planets moving through review
//! - [`Planet`] - a catalog entry that can be added to a draft
//! - [`Actor`] - the caller identity and [`Role`]
//! - [`User`] - a registered account
//! - [`StellarError`] - the error taxonomy shared by every layer

pub mod constellation;
pub mod error;
pub mod planet;
pub mod types;
pub mod user;

// Re-exports for convenience
pub use constellation::{
    Constellation, ConstellationDetail, ConstellationFields, ConstellationFilter,
    ConstellationListing, ConstellationPatch, ConstellationQuery, NewConstellation, SortOrder,
    DEFAULT_DRAFT_NAME,
};
pub use error::{ErrorKind, Result, StellarError};
pub use planet::{Planet, PlanetFields, PlanetSummary};
pub use types::*;
pub use user::{Credentials, NewUser, Registration, User, UserAccount};
