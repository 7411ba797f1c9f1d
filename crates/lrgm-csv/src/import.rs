//! CSV import.
//!
//! Pipeline:
//!   UploadedFile
//!     └─ FileKind::classify()   → which entity the file holds (by name)
//!          └─ parse_rows()       → header-mapped rows
//!               └─ *_from_row()  → typed records, or a per-row error
//!                    └─ ImportReport (fragment + per-file outcomes)
//!
//! Files are independent: a malformed file contributes nothing and is reported
//! as failed; a bad row is reported and skipped; everything else is imported.

use std::{collections::HashMap, path::PathBuf, str::FromStr};

use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, StringRecord};
use lrgm_core::{
  activity::Activity, campaign::Campaign, contact::Contact,
  data::LrgmFragment, id::generate_id, timestamp,
};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::{AUDIENCE_SEPARATOR, Error, Result, UploadedFile, unpack_archive};

// ─── Classification ──────────────────────────────────────────────────────────

/// The entity kind a file holds, decided from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
  Contacts,
  Campaigns,
  Activities,
}

impl FileKind {
  /// Case-insensitive substring match on the file name: `contact`, then
  /// `campaign`, then `activit`. Anything else is not importable.
  pub fn classify(file_name: &str) -> Option<Self> {
    let name = file_name.to_lowercase();
    if name.contains("contact") {
      Some(Self::Contacts)
    } else if name.contains("campaign") {
      Some(Self::Campaigns)
    } else if name.contains("activit") {
      Some(Self::Activities)
    } else {
      None
    }
  }
}

// ─── Reports ─────────────────────────────────────────────────────────────────

/// A row that was skipped, with its 1-based line in the file.
#[derive(Debug)]
pub struct RowError {
  pub line:  u64,
  pub error: Error,
}

#[derive(Debug)]
pub enum FileOutcome {
  /// The name matched no entity kind; the file was ignored.
  Skipped,
  Imported {
    records:  usize,
    rejected: Vec<RowError>,
  },
  /// The file could not be read or parsed; it contributed nothing.
  Failed(Error),
}

#[derive(Debug)]
pub struct FileReport {
  pub name:    String,
  pub kind:    Option<FileKind>,
  pub outcome: FileOutcome,
}

impl FileReport {
  pub fn is_failed(&self) -> bool { matches!(self.outcome, FileOutcome::Failed(_)) }
}

/// Everything a batch produced: the merged fragment, plus one report per input
/// file in input order.
#[derive(Debug, Default)]
pub struct ImportReport {
  pub fragment: LrgmFragment,
  pub files:    Vec<FileReport>,
}

impl ImportReport {
  pub fn failed_files(&self) -> impl Iterator<Item = &FileReport> {
    self.files.iter().filter(|f| f.is_failed())
  }

  pub fn rejected_rows(&self) -> usize {
    self
      .files
      .iter()
      .map(|f| match &f.outcome {
        FileOutcome::Imported { rejected, .. } => rejected.len(),
        _ => 0,
      })
      .sum()
  }

  /// No file failed and no row was rejected. Skipped files do not count.
  pub fn is_clean(&self) -> bool {
    self.failed_files().next().is_none() && self.rejected_rows() == 0
  }

  fn absorb(&mut self, report: FileReport, table: Option<Table>) {
    match table {
      Some(Table::Contacts(contacts)) => self.fragment.extend_contacts(contacts),
      Some(Table::Campaigns(campaigns)) => {
        self.fragment.extend_campaigns(campaigns)
      }
      Some(Table::Activities(activities)) => {
        self.fragment.extend_activities(activities)
      }
      None => {}
    }
    self.files.push(report);
  }
}

enum Table {
  Contacts(Vec<Contact>),
  Campaigns(Vec<Campaign>),
  Activities(Vec<Activity>),
}

impl Table {
  fn len(&self) -> usize {
    match self {
      Self::Contacts(v) => v.len(),
      Self::Campaigns(v) => v.len(),
      Self::Activities(v) => v.len(),
    }
  }
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Parse a batch of files concurrently and merge the results.
///
/// Every file is parsed on its own blocking task; the batch resolves once all
/// of them have finished, whatever their outcome. Records are merged in input
/// order, so two files of the same kind concatenate.
pub async fn import_files(files: Vec<UploadedFile>) -> ImportReport {
  let labels: Vec<(String, Option<FileKind>)> = files
    .iter()
    .map(|f| (f.name.clone(), FileKind::classify(&f.name)))
    .collect();

  let mut tasks = JoinSet::new();
  for (index, file) in files.into_iter().enumerate() {
    tasks.spawn_blocking(move || (index, parse_file(&file)));
  }

  let mut parsed: Vec<Option<(FileReport, Option<Table>)>> =
    labels.iter().map(|_| None).collect();
  while let Some(joined) = tasks.join_next().await {
    match joined {
      Ok((index, result)) => parsed[index] = Some(result),
      Err(e) => warn!(error = %e, "import task did not complete"),
    }
  }

  let mut report = ImportReport::default();
  for ((name, kind), result) in labels.into_iter().zip(parsed) {
    let (file_report, table) = result.unwrap_or_else(|| {
      let outcome =
        FileOutcome::Failed(Error::Task(format!("parsing {name} did not complete")));
      (FileReport { name, kind, outcome }, None)
    });
    report.absorb(file_report, table);
  }

  info!(
    files = report.files.len(),
    records = report.fragment.len(),
    failed = report.failed_files().count(),
    rejected_rows = report.rejected_rows(),
    "import batch finished"
  );
  report
}

/// Read `paths` from disk and import them as one batch.
///
/// Exported `.zip` archives are expanded in place. A path that cannot be read
/// or unpacked is reported as a failed file and the rest of the batch is
/// still imported.
pub async fn import_paths(paths: &[PathBuf]) -> ImportReport {
  let mut uploads = Vec::with_capacity(paths.len());
  let mut failed = Vec::new();
  for path in paths {
    match UploadedFile::read(path).await {
      Ok(file) => uploads.push(file),
      Err(error) => {
        let name = path.display().to_string();
        warn!(file = %name, error = %error, "failed to read file");
        let kind = FileKind::classify(&name);
        failed.push(FileReport { name, kind, outcome: FileOutcome::Failed(error) });
      }
    }
  }

  let (uploads, unpack_failures) = expand_archives(uploads);
  failed.extend(unpack_failures);

  let mut report = import_files(uploads).await;
  report.files.splice(0..0, failed);
  report
}

/// Replace every zip upload with the files inside it. An archive that cannot
/// be unpacked becomes a failed [`FileReport`].
pub fn expand_archives(
  files: Vec<UploadedFile>,
) -> (Vec<UploadedFile>, Vec<FileReport>) {
  let mut expanded = Vec::with_capacity(files.len());
  let mut failed = Vec::new();
  for file in files {
    if !file.is_zip() {
      expanded.push(file);
      continue;
    }
    match unpack_archive(&file.data) {
      Ok(entries) => expanded.extend(entries),
      Err(error) => {
        warn!(file = %file.name, error = %error, "failed to unpack archive");
        failed.push(FileReport {
          name:    file.name,
          kind:    None,
          outcome: FileOutcome::Failed(error),
        });
      }
    }
  }
  (expanded, failed)
}

/// Parse a single file synchronously.
pub fn import_file(file: &UploadedFile) -> ImportReport {
  let (file_report, table) = parse_file(file);
  let mut report = ImportReport::default();
  report.absorb(file_report, table);
  report
}

fn parse_file(file: &UploadedFile) -> (FileReport, Option<Table>) {
  let name = file.name.clone();
  let Some(kind) = FileKind::classify(&name) else {
    debug!(file = %name, "skipping file with unrecognised name");
    let report = FileReport { name, kind: None, outcome: FileOutcome::Skipped };
    return (report, None);
  };

  let parsed = match kind {
    FileKind::Contacts => {
      parse_rows(&file.data, contact_from_row).map(|(v, r)| (Table::Contacts(v), r))
    }
    FileKind::Campaigns => {
      parse_rows(&file.data, campaign_from_row).map(|(v, r)| (Table::Campaigns(v), r))
    }
    FileKind::Activities => parse_rows(&file.data, activity_from_row)
      .map(|(v, r)| (Table::Activities(v), r)),
  };

  match parsed {
    Ok((table, rejected)) => {
      for row in &rejected {
        warn!(file = %name, line = row.line, error = %row.error, "skipping row");
      }
      let outcome = FileOutcome::Imported { records: table.len(), rejected };
      (FileReport { name, kind: Some(kind), outcome }, Some(table))
    }
    Err(error) => {
      warn!(file = %name, error = %error, "failed to parse file");
      let report =
        FileReport { name, kind: Some(kind), outcome: FileOutcome::Failed(error) };
      (report, None)
    }
  }
}

// ─── Row mapping ─────────────────────────────────────────────────────────────

/// Column positions by normalised (trimmed, lower-cased) header name. The
/// first occurrence of a repeated header wins.
struct Header {
  columns: HashMap<String, usize>,
}

impl Header {
  fn new(record: &StringRecord) -> Self {
    let mut columns = HashMap::new();
    for (index, name) in record.iter().enumerate() {
      columns.entry(name.trim().to_lowercase()).or_insert(index);
    }
    Self { columns }
  }

  fn index(&self, column: &str) -> Option<usize> {
    self.columns.get(&column.to_lowercase()).copied()
  }
}

struct Row<'r> {
  header: &'r Header,
  record: &'r StringRecord,
}

impl<'r> Row<'r> {
  /// The raw cell, if the column exists and this row reaches it.
  fn cell(&self, column: &str) -> Option<&'r str> {
    self.header.index(column).and_then(|i| self.record.get(i))
  }

  fn optional(&self, column: &str) -> Option<String> {
    self
      .cell(column)
      .filter(|v| !v.is_empty())
      .map(str::to_owned)
  }

  fn required(&self, column: &'static str) -> Result<&'r str> {
    self
      .cell(column)
      .filter(|v| !v.trim().is_empty())
      .ok_or(Error::MissingField(column))
  }

  fn text(&self, column: &'static str) -> Result<String> {
    self.required(column).map(str::to_owned)
  }

  /// The row's id, or a fresh one when the column is missing or blank.
  fn id(&self) -> String {
    self
      .cell("id")
      .filter(|v| !v.is_empty())
      .map_or_else(generate_id, str::to_owned)
  }

  fn parse<T: FromStr>(&self, column: &'static str) -> Result<T> {
    let raw = self.required(column)?;
    raw.trim().parse().map_err(|_| Error::InvalidValue {
      column,
      value: raw.to_owned(),
    })
  }

  /// Like [`Row::parse`], but a missing column or blank cell yields the
  /// type's default.
  fn parse_or_default<T: FromStr + Default>(
    &self,
    column: &'static str,
  ) -> Result<T> {
    match self.cell(column).filter(|v| !v.trim().is_empty()) {
      Some(_) => self.parse(column),
      None => Ok(T::default()),
    }
  }

  fn timestamp(&self, column: &'static str) -> Result<DateTime<Utc>> {
    let raw = self.required(column)?;
    timestamp::parse(raw).map_err(|_| Error::InvalidValue {
      column,
      value: raw.to_owned(),
    })
  }
}

/// Read `data` as a header-first CSV table and map every non-blank row.
///
/// Fails as a whole only when the input is not readable CSV; rows that fail
/// `map_row` are collected as [`RowError`]s.
fn parse_rows<T>(
  data: &[u8],
  map_row: fn(&Row<'_>) -> Result<T>,
) -> Result<(Vec<T>, Vec<RowError>)> {
  let text = std::str::from_utf8(data)?;
  let text = text.strip_prefix('\u{feff}').unwrap_or(text);

  let mut reader = ReaderBuilder::new()
    .flexible(true)
    .from_reader(text.as_bytes());
  let header = Header::new(reader.headers()?);

  let mut records = Vec::new();
  let mut rejected = Vec::new();
  for result in reader.records() {
    let record = result?;
    if record.iter().all(|cell| cell.trim().is_empty()) {
      continue;
    }
    let line = record.position().map_or(0, csv::Position::line);
    match map_row(&Row { header: &header, record: &record }) {
      Ok(value) => records.push(value),
      Err(error) => rejected.push(RowError { line, error }),
    }
  }

  Ok((records, rejected))
}

fn contact_from_row(row: &Row<'_>) -> Result<Contact> {
  Ok(Contact {
    id:         row.id(),
    category:   row.parse_or_default("category")?,
    first_name: row.text("firstName")?,
    last_name:  row.text("lastName")?,
    org:        row.optional("org"),
    email:      row.optional("email"),
    phone:      row.optional("phone"),
    notes:      row.optional("notes"),
  })
}

fn campaign_from_row(row: &Row<'_>) -> Result<Campaign> {
  let audience_ids = row
    .cell("audienceIds")
    .map(|cell| {
      cell
        .split(AUDIENCE_SEPARATOR)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
        .collect()
    })
    .unwrap_or_default();

  Ok(Campaign {
    id: row.id(),
    title: row.text("title")?,
    channel: row.parse("channel")?,
    date_planned: row.timestamp("datePlanned")?,
    status: row.parse("status")?,
    audience_ids,
    notes: row.optional("notes"),
  })
}

fn activity_from_row(row: &Row<'_>) -> Result<Activity> {
  Ok(Activity {
    id:         row.id(),
    contact_id: row.text("contactId")?,
    date:       row.timestamp("date")?,
    kind:       row.parse("type")?,
    summary:    row.text("summary")?,
    details:    row.optional("details"),
  })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
