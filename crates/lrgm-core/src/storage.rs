//! The `Storage` trait: durable key/value storage for the aggregate.
//!
//! [`crate::store::LrgmStore`] writes the whole serialized aggregate under a
//! single key after every mutation and reads it back on open. Backends only
//! move strings; serialization and schema versioning stay in this crate.
//! `lrgm-store-sqlite` provides the on-disk backend; [`MemoryStorage`] is the
//! in-process stand-in used by tests.

use std::{
  collections::HashMap,
  future::Future,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use thiserror::Error;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a durable storage backend.
///
/// Implementations are moved into the store's background writer task, so they
/// must be `Send + Sync + 'static` and return `Send` futures.
pub trait Storage: Send + Sync + 'static {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read the value stored under `key`. Returns `None` if nothing was ever
  /// written.
  fn load(
    &self,
    key: &'static str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + '_;

  /// Replace the value stored under `key`.
  fn save(
    &self,
    key: &'static str,
    value: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── MemoryStorage ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum MemoryStorageError {
  #[error("memory storage is rejecting writes")]
  WriteRejected,
}

#[derive(Debug, Default)]
struct MemoryInner {
  entries:     HashMap<String, String>,
  fail_writes: bool,
  writes:      usize,
}

/// In-process storage. Clones share the same entries, so a test can keep a
/// handle to inspect what the store wrote, or reopen a store on the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
  inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStorage {
  pub fn new() -> Self { Self::default() }

  fn lock(&self) -> MutexGuard<'_, MemoryInner> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  pub fn get(&self, key: &str) -> Option<String> {
    self.lock().entries.get(key).cloned()
  }

  pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
    self.lock().entries.insert(key.into(), value.into());
  }

  /// Make every subsequent `save` fail (or succeed again).
  pub fn set_fail_writes(&self, fail: bool) { self.lock().fail_writes = fail; }

  /// Number of successful writes so far.
  pub fn write_count(&self) -> usize { self.lock().writes }
}

impl Storage for MemoryStorage {
  type Error = MemoryStorageError;

  async fn load(&self, key: &'static str) -> Result<Option<String>, Self::Error> {
    Ok(self.get(key))
  }

  async fn save(&self, key: &'static str, value: String) -> Result<(), Self::Error> {
    let mut inner = self.lock();
    if inner.fail_writes {
      return Err(MemoryStorageError::WriteRejected);
    }
    inner.entries.insert(key.to_owned(), value);
    inner.writes += 1;
    Ok(())
  }
}
