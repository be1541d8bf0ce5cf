//! Append-only audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// The kind of state change an audit entry records.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuditAction {
  DocumentCreated,
  DocumentUpdated,
  DocumentDeleted,
  SettingsUpdated,
  UserCreated,
  UserDeactivated,
  UserActivated,
}

/// A persisted audit record. Never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
  pub entry_id:    Uuid,
  pub actor_id:    Uuid,
  pub action:      AuditAction,
  pub detail:      String,
  pub recorded_at: DateTime<Utc>,
}

/// Input to [`crate::store::DocumentStore::record_audit`].
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
  pub actor_id: Uuid,
  pub action:   AuditAction,
  pub detail:   String,
}
