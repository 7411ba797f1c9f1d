//! SQLite storage backend for LRGM.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. The store's aggregate is kept as one
//! JSON document in a key/value table.

mod schema;
mod storage;

pub mod error;

pub use error::{Error, Result};
pub use storage::SqliteStorage;
