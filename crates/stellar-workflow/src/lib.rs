//! # Stellar Workflow
//!
//! The constellation approval workflow and the catalog service.
//!
//! - [`WorkflowEngine`] - state transitions, ownership checks, draft membership
//! - [`Transition`] - the state machine edges
//! - [`CatalogService`] - planet listing, curation and image upload
//! - [`AccountService`] - registration and login checks

pub mod accounts;
pub mod catalog;
pub mod engine;
pub mod machine;

pub use accounts::AccountService;
pub use catalog::{CatalogService, Page, DEFAULT_MAX_IMAGE_BYTES, MAX_PAGE_SIZE};
pub use engine::{DraftSummary, EditPolicy, WorkflowEngine};
pub use machine::Transition;
