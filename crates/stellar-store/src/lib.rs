//! # Stellar Store
//!
//! Storage collaborators for the constellation workflow: a transactional
//! relational store for constellations, memberships, catalog planets and user
//! accounts, and an object store for planet images.

pub mod image;
pub mod memory;
pub mod repo;

pub use image::{ImageStore, InMemoryImageStore};
pub use memory::InMemoryStore;
pub use repo::{CatalogRepo, ConstellationRepo, Store, Transaction, UserRepo};
