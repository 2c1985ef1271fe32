//! Error taxonomy shared by every fitlog crate.

use std::{io, path::PathBuf};

use chrono::NaiveDate;
use thiserror::Error;

use crate::validate::ValidationErrors;

#[derive(Debug, Error)]
pub enum Error {
  /// One or more fields failed their type, range or format check.
  #[error("validation failed: {0}")]
  Validation(ValidationErrors),

  /// An entry for this calendar date is already stored.
  #[error("entry already exists for date {0}")]
  DuplicateDate(NaiveDate),

  #[error("persistence error: {0}")]
  Persistence(#[from] PersistenceError),

  /// The request payload could not be understood at all.
  #[error("malformed request: {0}")]
  MalformedRequest(String),

  #[error("internal error: {0}")]
  Internal(String),
}

/// Local I/O failures while reading or replacing the stored document.
///
/// Each variant leaves the canonical file untouched.
#[derive(Debug, Error)]
pub enum PersistenceError {
  /// The document exists but could not be read.
  #[error("failed to read {}: {source}", path.display())]
  ReadFailed {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to encode document: {0}")]
  EncodeFailed(#[source] serde_json::Error),

  #[error("failed to write {}: {source}", path.display())]
  WriteFailed {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to rename {} over {}: {source}", from.display(), to.display())]
  RenameFailed {
    from:   PathBuf,
    to:     PathBuf,
    #[source]
    source: io::Error,
  },
}

impl From<ValidationErrors> for Error {
  fn from(errors: ValidationErrors) -> Self { Self::Validation(errors) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
