//! `lrgm`: command-line front end for the LRGM store.
//!
//! Reads `lrgm.toml` (or the path given with `--config`) layered under
//! `LRGM_*` environment variables, opens the SQLite-backed store, runs one
//! command, and waits for every write to land before exiting.
//!
//! # Usage
//!
//! ```text
//! lrgm contact add --category CLIENT --first Jane --last Doe
//! lrgm campaign add --title "Winter dinner" --channel DINNER --date 2024-12-05
//! lrgm export --out ~/backups
//! lrgm import ~/backups/lrgm-data-20241205.zip
//! ```

mod args;
mod commands;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use args::Cli;
use clap::Parser;
use lrgm_core::LrgmStore;
use lrgm_store_sqlite::SqliteStorage;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── Config ───────────────────────────────────────────────────────────────────

/// Settings read from the config file and `LRGM_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
  /// SQLite database file. A leading `~/` is expanded.
  pub store_path: PathBuf,
  /// Prefix of exported archive names.
  pub product:    String,
}

const DEFAULT_STORE_PATH: &str = "~/.local/share/lrgm/lrgm.db";

fn load_config(path: &Path) -> anyhow::Result<CliConfig> {
  let settings = config::Config::builder()
    .set_default("store_path", DEFAULT_STORE_PATH)?
    .set_default("product", lrgm_csv::DEFAULT_PRODUCT)?
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix("LRGM"))
    .build()
    .context("failed to read config file")?;

  let mut cfg: CliConfig = settings
    .try_deserialize()
    .context("failed to deserialise CliConfig")?;
  cfg.store_path = expand_tilde(&cfg.store_path);
  Ok(cfg)
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let cfg = load_config(&cli.config)?;

  let storage = SqliteStorage::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;
  let mut store = LrgmStore::open(storage)
    .await
    .context("failed to load stored data")?;

  let result = commands::run(&mut store, &cfg, cli.command).await;

  // Writes are queued in the background; a command only succeeded once they
  // have all landed.
  store.flush().await.context("failed to persist changes")?;
  result
}
