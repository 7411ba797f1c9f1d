//! CSV and zip-archive codec for LRGM.
//!
//! Export flattens the aggregate into three CSV tables (one per entity kind)
//! and bundles them into a zip archive. Import classifies uploaded files by
//! name, maps their columns by header, and merges the parsed records into one
//! [`LrgmFragment`](lrgm_core::data::LrgmFragment) for
//! [`LrgmStore::import_data`](lrgm_core::LrgmStore::import_data).
//!
//! # Quick start
//!
//! ```no_run
//! # async fn demo(data: lrgm_core::data::LrgmData) -> lrgm_csv::Result<()> {
//! use chrono::Utc;
//!
//! let archive = lrgm_csv::export_archive(&data, "lrgm", Utc::now().date_naive())?;
//! let files = lrgm_csv::unpack_archive(&archive.bytes)?;
//! let report = lrgm_csv::import_files(files).await;
//! println!("{} records, {} failed files", report.fragment.len(), report.failed_files().count());
//! # Ok(())
//! # }
//! ```

pub mod error;
mod archive;
mod export;
mod import;

use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::NaiveDate;
use lrgm_core::data::LrgmData;
use tracing::info;

pub use error::{Error, Result};
pub use import::{
  FileKind, FileOutcome, FileReport, ImportReport, RowError, expand_archives,
  import_file, import_files, import_paths,
};

// ─── Table layout ────────────────────────────────────────────────────────────

/// Joins campaign audience ids inside a single cell. Generated ids never
/// contain it.
pub const AUDIENCE_SEPARATOR: &str = ";";

pub const CONTACT_COLUMNS: [&str; 8] = [
  "id",
  "category",
  "firstName",
  "lastName",
  "org",
  "email",
  "phone",
  "notes",
];

pub const CAMPAIGN_COLUMNS: [&str; 7] = [
  "id",
  "title",
  "channel",
  "datePlanned",
  "status",
  "audienceIds",
  "notes",
];

pub const ACTIVITY_COLUMNS: [&str; 6] =
  ["id", "contactId", "date", "type", "summary", "details"];

pub const CONTACTS_FILE: &str = "contacts.csv";
pub const CAMPAIGNS_FILE: &str = "campaigns.csv";
pub const ACTIVITIES_FILE: &str = "activities.csv";

/// Product name used in archive file names when none is configured.
pub const DEFAULT_PRODUCT: &str = "lrgm";

// ─── Public types ────────────────────────────────────────────────────────────

/// The three exported tables as CSV text (header row first, CRLF endings).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTables {
  pub contacts:   String,
  pub campaigns:  String,
  pub activities: String,
}

impl CsvTables {
  /// `(file name, contents)` for each table, in archive order.
  pub fn files(&self) -> [(&'static str, &str); 3] {
    [
      (CONTACTS_FILE, self.contacts.as_str()),
      (CAMPAIGNS_FILE, self.campaigns.as_str()),
      (ACTIVITIES_FILE, self.activities.as_str()),
    ]
  }

  /// The tables as uploads, ready for [`import_files`].
  pub fn into_uploads(self) -> Vec<UploadedFile> {
    vec![
      UploadedFile::new(CONTACTS_FILE, self.contacts),
      UploadedFile::new(CAMPAIGNS_FILE, self.campaigns),
      UploadedFile::new(ACTIVITIES_FILE, self.activities),
    ]
  }
}

/// A named file handed to the importer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
  /// File name only; classification looks at this, never at a directory.
  pub name: String,
  pub data: Bytes,
}

impl UploadedFile {
  pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
    Self { name: name.into(), data: data.into() }
  }

  /// Read a file from disk, keeping only its file name.
  pub async fn read(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let data = tokio::fs::read(path).await?;
    let name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();
    Ok(Self::new(name, data))
  }

  pub fn is_zip(&self) -> bool {
    self.name.to_ascii_lowercase().ends_with(".zip")
  }
}

/// A compressed export, ready to be written or downloaded.
#[derive(Debug, Clone)]
pub struct ExportArchive {
  /// `<product>-data-<YYYYMMDD>.zip`
  pub file_name: String,
  pub bytes:     Bytes,
}

impl ExportArchive {
  /// Write the archive into `dir` under its own file name.
  pub async fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(&self.file_name);
    tokio::fs::write(&path, &self.bytes).await?;
    info!(path = %path.display(), bytes = self.bytes.len(), "wrote export archive");
    Ok(path)
  }
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Render the three CSV tables for `data`.
pub fn export_tables(data: &LrgmData) -> Result<CsvTables> {
  Ok(CsvTables {
    contacts:   export::contacts(&data.contacts)?,
    campaigns:  export::campaigns(&data.campaigns)?,
    activities: export::activities(&data.activities)?,
  })
}

/// Render the tables and bundle them into a deflate-compressed zip named
/// after `product` and `today`.
pub fn export_archive(
  data: &LrgmData,
  product: &str,
  today: NaiveDate,
) -> Result<ExportArchive> {
  let tables = export_tables(data)?;
  let bytes = archive::pack(&tables)?;
  Ok(ExportArchive {
    file_name: archive_file_name(product, today),
    bytes:     Bytes::from(bytes),
  })
}

pub fn archive_file_name(product: &str, today: NaiveDate) -> String {
  format!("{product}-data-{}.zip", today.format("%Y%m%d"))
}

/// Expand a zip archive into uploads, one per file entry. Directory entries
/// are skipped and nested paths are reduced to their file name.
pub fn unpack_archive(bytes: &[u8]) -> Result<Vec<UploadedFile>> {
  archive::unpack(bytes)
}

// ─── Round-trip tests ────────────────────────────────────────────────────────
