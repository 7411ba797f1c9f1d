//! Error types for `lrgm-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid timestamp: {0:?}")]
  InvalidTimestamp(String),

  #[error("unsupported persisted schema version {found} (expected {expected})")]
  UnsupportedSchemaVersion { found: u32, expected: u32 },

  /// A background write of the aggregate failed. The in-memory state is
  /// unaffected.
  #[error("failed to persist data: {0}")]
  Persist(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
