//! Document issuance orchestration for the lost-document registry.
//!
//! [`DocumentService`] sits between the HTTP layer and any
//! [`lostdoc_core::store::DocumentStore`]. It owns validation, the access
//! policy, conflict retry and best-effort audit recording. Settings are read
//! through [`ConfigProvider`], which caches the parsed configuration.

mod admin;
mod config;
mod documents;
mod stats;

use std::{future::Future, sync::Arc};

use chrono::{DateTime, Utc};
use lostdoc_core::{
  Error, Result,
  audit::{AuditAction, NewAuditEntry},
  store::{DocumentStore, StoreError},
  user::Actor,
};

pub use admin::MAX_AUDIT_PAGE;
pub use config::ConfigProvider;
pub use documents::{ExpiringDocument, ListFilter, PrintPreview};

/// Source of the current instant. Swapped out in tests.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Attempts made for one issuance or revision before a uniqueness conflict
/// is given up on.
pub const MAX_ISSUE_ATTEMPTS: u32 = 3;

// ─── Service ─────────────────────────────────────────────────────────────────

pub struct DocumentService<S> {
  store:  Arc<S>,
  config: ConfigProvider<S>,
  clock:  Clock,
}

impl<S> Clone for DocumentService<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      config: self.config.clone(),
      clock:  Arc::clone(&self.clock),
    }
  }
}

impl<S: DocumentStore> DocumentService<S> {
  pub fn new(store: Arc<S>, config: ConfigProvider<S>) -> Self {
    Self { store, config, clock: Arc::new(Utc::now) }
  }

  pub fn with_clock(mut self, clock: Clock) -> Self {
    self.clock = clock;
    self
  }

  pub fn config(&self) -> &ConfigProvider<S> { &self.config }

  fn now(&self) -> DateTime<Utc> { (self.clock)() }

  /// Run a store write, repeating it while it reports a uniqueness conflict.
  /// A conflict on the last attempt becomes a server-side
  /// [`Error::Persistence`]; any other failure is returned at once.
  async fn with_retry<T, F, Fut>(&self, operation: &'static str, mut attempt_once: F) -> Result<T>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, S::Error>>,
  {
    let mut attempt = 1;
    loop {
      match attempt_once().await {
        Ok(value) => return Ok(value),
        Err(e) if e.is_conflict() && attempt < MAX_ISSUE_ATTEMPTS => {
          tracing::warn!(operation, attempt, error = %e, "write conflicted, retrying");
          attempt += 1;
        }
        Err(e) if e.is_conflict() => {
          tracing::error!(operation, attempt, error = %e, "write conflicted on every attempt");
          return Err(Error::Persistence(Box::new(e)));
        }
        Err(e) => return Err(store_err(e)),
      }
    }
  }

  /// Append an audit entry. Failures are logged and swallowed.
  async fn audit(&self, actor: &Actor, action: AuditAction, detail: String) {
    let entry = NewAuditEntry { actor_id: actor.user_id, action, detail };
    if let Err(e) = self.store.record_audit(entry).await {
      tracing::warn!(error = %e, %action, actor = %actor.user_id, "failed to record audit entry");
    }
  }
}

/// Lift a backend error into the core taxonomy. Engine text never ends up
/// in a `Conflict` message.
pub(crate) fn store_err<E: StoreError>(e: E) -> Error {
  if e.is_conflict() {
    tracing::debug!(error = %e, "store reported a uniqueness conflict");
    Error::Conflict("the record was modified concurrently; retry".to_owned())
  } else {
    Error::Persistence(Box::new(e))
  }
}
