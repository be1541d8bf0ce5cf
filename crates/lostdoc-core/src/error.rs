//! Error types for `lostdoc-core`.
//!
//! Every layer above the store speaks this taxonomy; the API maps each
//! variant to exactly one HTTP status.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// Malformed or missing input. `field` names the offending request field.
  #[error("invalid {field}: {message}")]
  Validation {
    field:   &'static str,
    message: String,
  },

  /// The actor exists but lacks ownership or role for the resource.
  #[error("access denied: user {actor} may not access {resource}")]
  AccessDenied { actor: Uuid, resource: String },

  /// Entity absent or soft-deleted.
  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: Uuid },

  /// Uniqueness violation that survived the bounded retry.
  #[error("conflict: {0}")]
  Conflict(String),

  /// Stored settings cannot be interpreted (bad template, timezone, ...).
  #[error("configuration error: {0}")]
  Configuration(String),

  #[error("persistence error: {0}")]
  Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
    Self::Validation { field, message: message.into() }
  }

  pub fn document_not_found(id: Uuid) -> Self {
    Self::NotFound { entity: "document", id }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
