//! HTTP API handlers.

pub mod constellation;
pub mod error;
pub mod extract;
pub mod health;
pub mod planet;
pub mod user;
