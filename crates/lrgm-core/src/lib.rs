//! Core types and the data store for LRGM, a local relationship manager.
//!
//! This crate holds the domain model (contacts, campaigns, activities), the
//! [`LrgmStore`](store::LrgmStore) that owns them, and the [`Storage`]
//! abstraction the store persists through. It has no database or CSV
//! dependencies; those live in `lrgm-store-sqlite` and `lrgm-csv`.

pub mod activity;
pub mod campaign;
pub mod contact;
pub mod data;
pub mod error;
pub mod id;
pub mod storage;
pub mod store;
pub mod summary;
pub mod timestamp;

pub use error::{Error, Result};
pub use storage::{MemoryStorage, Storage};
pub use store::LrgmStore;

#[cfg(test)]
mod tests;
