//! Error type for `lostdoc-store-sqlite`.

use lostdoc_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[source] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[source] rusqlite::Error),

  /// A `UNIQUE` or primary-key constraint rejected the write.
  #[error("uniqueness conflict: {0}")]
  Conflict(#[source] rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored enum or number could not be read back.
  #[error("decode error: {0}")]
  Decode(String),
}

impl From<rusqlite::Error> for Error {
  fn from(e: rusqlite::Error) -> Self {
    if is_unique_violation(&e) {
      Error::Conflict(e)
    } else {
      Error::Sqlite(e)
    }
  }
}

impl From<tokio_rusqlite::Error> for Error {
  fn from(e: tokio_rusqlite::Error) -> Self {
    match e {
      tokio_rusqlite::Error::Rusqlite(inner) => inner.into(),
      other => Error::Database(other),
    }
  }
}

impl StoreError for Error {
  fn is_conflict(&self) -> bool { matches!(self, Error::Conflict(_)) }
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        || f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
  )
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
