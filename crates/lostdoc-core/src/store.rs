//! The `DocumentStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `lostdoc-store-sqlite`).
//! Higher layers (`lostdoc-service`, `lostdoc-api`) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
  audit::{AuditEntry, NewAuditEntry},
  document::{DocumentDraft, LostDocument},
  numbering::{NumberFormat, NumberingPeriod},
  resident::Resident,
  settings::SettingsMap,
  stats::ItemCount,
  user::{NewUser, User},
};

// ─── Error classification ────────────────────────────────────────────────────

/// Lets the orchestrator tell a retryable uniqueness conflict from any other
/// storage failure without knowing the engine.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn is_conflict(&self) -> bool;
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Parameters for [`DocumentStore::search_documents`] and
/// [`DocumentStore::count_documents`]. Soft-deleted documents are never
/// returned. Results are ordered newest report first.
#[derive(Debug, Clone, Default)]
pub struct DocumentQuery {
  /// Substring of the reference number or the resident's full name.
  pub text:            Option<String>,
  /// Restrict to documents recorded by this operator.
  pub operator_id:     Option<Uuid>,
  /// Inclusive lower bound on `reported_at`.
  pub reported_from:   Option<DateTime<Utc>>,
  /// Exclusive upper bound on `reported_at`.
  pub reported_before: Option<DateTime<Utc>>,
  pub limit:           Option<usize>,
  pub offset:          Option<usize>,
}

/// Everything one issuance transaction needs. Resident resolution, sequence
/// allocation and the document + item inserts all happen inside a single
/// write transaction; either all of it commits or none of it does.
#[derive(Debug, Clone)]
pub struct IssuePlan {
  pub draft:       DocumentDraft,
  pub operator_id: Uuid,
  /// Becomes the report date and creation timestamp.
  pub issued_at:   DateTime<Utc>,
  pub period:      NumberingPeriod,
  pub numbering:   NumberFormat,
  /// Base for the first sequence of a period with no documents yet.
  pub seed:        u32,
}

/// A full replacement of a document's editable content.
#[derive(Debug, Clone)]
pub struct Revision {
  pub document_id: Uuid,
  pub draft:       DocumentDraft,
  pub actor_id:    Uuid,
  pub revised_at:  DateTime<Utc>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a document registry backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait DocumentStore: Send + Sync {
  type Error: StoreError;

  // ── Users ─────────────────────────────────────────────────────────────

  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Retrieve a user by UUID, active or not.
  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn find_user_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  fn list_users(
    &self,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// Flip the active flag. Returns `false` if no such user exists.
  fn set_user_active(
    &self,
    id: Uuid,
    active: bool,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Settings ──────────────────────────────────────────────────────────

  fn load_settings(
    &self,
  ) -> impl Future<Output = Result<SettingsMap, Self::Error>> + Send + '_;

  /// Upsert the given keys; keys not mentioned are left alone.
  fn save_settings(
    &self,
    changes: SettingsMap,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Residents ─────────────────────────────────────────────────────────

  /// Point lookup on the dedup key, ignoring soft-deleted rows.
  fn find_resident<'a>(
    &'a self,
    full_name: &'a str,
    birth_date: NaiveDate,
  ) -> impl Future<Output = Result<Option<Resident>, Self::Error>> + Send + 'a;

  // ── Documents ─────────────────────────────────────────────────────────

  /// Run one issuance transaction and return the new document's id.
  ///
  /// A racing writer that wins the same sequence number or resident
  /// identity surfaces as an error whose [`StoreError::is_conflict`] is
  /// true; nothing is left behind.
  fn issue_document(
    &self,
    plan: IssuePlan,
  ) -> impl Future<Output = Result<Uuid, Self::Error>> + Send + '_;

  /// Replace a document's content. Re-resolves the resident only when the
  /// identity fields changed; replaces the whole item list. Returns `false`
  /// if the document does not exist or is soft-deleted.
  fn revise_document(
    &self,
    revision: Revision,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Mark a document deleted. The row and its number are kept. Returns
  /// `false` if it was absent or already deleted.
  fn soft_delete_document(
    &self,
    id: Uuid,
    deleted_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Load a non-deleted document joined with resident, items and personnel.
  fn get_document(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<LostDocument>, Self::Error>> + Send + '_;

  fn search_documents<'a>(
    &'a self,
    query: &'a DocumentQuery,
  ) -> impl Future<Output = Result<Vec<LostDocument>, Self::Error>> + Send + 'a;

  /// Number of documents matching `query`; `limit` and `offset` are ignored.
  fn count_documents<'a>(
    &'a self,
    query: &'a DocumentQuery,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Item names across non-deleted documents with their counts, most
  /// frequent first.
  fn item_composition(
    &self,
  ) -> impl Future<Output = Result<Vec<ItemCount>, Self::Error>> + Send + '_;

  // ── Audit ─────────────────────────────────────────────────────────────

  fn record_audit(
    &self,
    entry: NewAuditEntry,
  ) -> impl Future<Output = Result<AuditEntry, Self::Error>> + Send + '_;

  /// Newest first.
  fn list_audit(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<AuditEntry>, Self::Error>> + Send + '_;
}
