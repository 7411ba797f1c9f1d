//! Error types for the lrgm-csv codec.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("archive error: {0}")]
  Zip(#[from] zip::result::ZipError),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("file is not valid UTF-8: {0}")]
  Utf8(#[from] std::str::Utf8Error),

  #[error("missing required field {0:?}")]
  MissingField(&'static str),

  #[error("invalid value in {column:?}: {value:?}")]
  InvalidValue { column: &'static str, value: String },

  #[error("parse task failed: {0}")]
  Task(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
