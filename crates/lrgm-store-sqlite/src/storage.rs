//! [`SqliteStorage`]: the SQLite implementation of [`Storage`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use tracing::debug;

use lrgm_core::{storage::Storage, timestamp};

use crate::{Result, schema::SCHEMA};

/// Key/value storage backed by a single SQLite file.
///
/// Clones share one connection.
#[derive(Clone)]
pub struct SqliteStorage {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStorage {
  /// Open (or create) a database at `path` and run schema initialisation.
  /// Missing parent directories are created.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      tokio::fs::create_dir_all(parent).await?;
    }
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let storage = Self { conn };
    storage.init_schema().await?;
    debug!(path = %path.display(), "opened sqlite storage");
    Ok(storage)
  }

  /// Open an in-memory database.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let storage = Self { conn };
    storage.init_schema().await?;
    Ok(storage)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

impl Storage for SqliteStorage {
  type Error = crate::Error;

  async fn load(&self, key: &'static str) -> Result<Option<String>> {
    let value: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT value FROM kv_store WHERE key = ?1",
              rusqlite::params![key],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(value)
  }

  async fn save(&self, key: &'static str, value: String) -> Result<()> {
    let updated_at = timestamp::format(&timestamp::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
           ON CONFLICT(key) DO UPDATE SET
             value      = excluded.value,
             updated_at = excluded.updated_at",
          rusqlite::params![key, value, updated_at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
