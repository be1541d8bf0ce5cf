//! Issue, revise, delete and read documents.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use lostdoc_core::{
  Error, Result,
  archive::{ArchiveStatus, ClassifiedDocument, EXPIRY_NOTICE_DAYS},
  audit::AuditAction,
  document::{DocumentDraft, LostDocument},
  numbering::NumberingPeriod,
  policy,
  settings::Letterhead,
  store::{DocumentQuery, DocumentStore, IssuePlan, Revision},
  user::{Actor, User},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{DocumentService, store_err};

/// Listing parameters for one archive partition.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
  pub status: ArchiveStatus,
  pub text:   Option<String>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// An active document about to cross the retention threshold.
#[derive(Debug, Clone, Serialize)]
pub struct ExpiringDocument {
  #[serde(flatten)]
  pub document:    LostDocument,
  pub archives_at: DateTime<Utc>,
}

/// Everything needed to render a document for printing.
#[derive(Debug, Clone, Serialize)]
pub struct PrintPreview {
  pub document:     ClassifiedDocument,
  pub letterhead:   Letterhead,
  /// Calendar date of the preview in the office timezone.
  pub printed_on:   NaiveDate,
  pub generated_at: DateTime<Utc>,
}

impl<S: DocumentStore> DocumentService<S> {
  // ─── Issuance ──────────────────────────────────────────────────────────────

  /// Issue a new document on behalf of `actor`, who becomes its operator.
  pub async fn create(
    &self,
    actor: &Actor,
    draft: DocumentDraft,
  ) -> Result<ClassifiedDocument> {
    draft.validate()?;
    self.check_personnel(actor, &draft).await?;

    let config = self.config.current().await?;
    let issued_at = self.now();
    let period = NumberingPeriod::at(issued_at, config.timezone);

    let document_id = self
      .with_retry("issue document", || {
        self.store.issue_document(IssuePlan {
          draft:       draft.clone(),
          operator_id: actor.user_id,
          issued_at,
          period,
          numbering:   config.numbering.clone(),
          seed:        config.last_number,
        })
      })
      .await?;

    let document = self.load(document_id).await?;
    tracing::info!(
      document = %document.document_id,
      reference = %document.reference_number,
      operator = %actor.user_id,
      "document issued"
    );
    self
      .audit(
        actor,
        AuditAction::DocumentCreated,
        format!(
          "issued {} for {}",
          document.reference_number, document.resident.full_name
        ),
      )
      .await;

    Ok(ClassifiedDocument::new(document, config.retention, issued_at))
  }

  /// Replace a document's content. The reference number, report date and
  /// operator never change.
  pub async fn update(
    &self,
    actor: &Actor,
    id: Uuid,
    draft: DocumentDraft,
  ) -> Result<ClassifiedDocument> {
    let existing = self.load(id).await?;
    policy::authorize(&existing, actor)?;
    draft.validate()?;
    self.check_personnel(actor, &draft).await?;

    let revised_at = self.now();
    let revised = self
      .with_retry("revise document", || {
        self.store.revise_document(Revision {
          document_id: id,
          draft:       draft.clone(),
          actor_id:    actor.user_id,
          revised_at,
        })
      })
      .await?;
    if !revised {
      return Err(Error::document_not_found(id));
    }

    let document = self.load(id).await?;
    tracing::info!(document = %id, actor = %actor.user_id, "document updated");
    self
      .audit(
        actor,
        AuditAction::DocumentUpdated,
        format!("updated {}", document.reference_number),
      )
      .await;

    self.classify(document, revised_at).await
  }

  /// Soft-delete. The row stays and its number is never reissued.
  pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<()> {
    let existing = self.load(id).await?;
    policy::authorize(&existing, actor)?;

    if !self
      .store
      .soft_delete_document(id, self.now())
      .await
      .map_err(store_err)?
    {
      return Err(Error::document_not_found(id));
    }

    tracing::info!(document = %id, actor = %actor.user_id, "document deleted");
    self
      .audit(
        actor,
        AuditAction::DocumentDeleted,
        format!("deleted {}", existing.reference_number),
      )
      .await;
    Ok(())
  }

  // ─── Reads ─────────────────────────────────────────────────────────────────

  pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<ClassifiedDocument> {
    let document = self.load(id).await?;
    policy::authorize(&document, actor)?;
    self.classify(document, self.now()).await
  }

  /// One archive partition, newest report first.
  pub async fn list(&self, filter: ListFilter) -> Result<Vec<ClassifiedDocument>> {
    let config = self.config.current().await?;
    let now = self.now();
    let cutoff = config.retention.cutoff(now);

    let mut query = DocumentQuery {
      text: filter.text,
      limit: filter.limit,
      offset: filter.offset,
      ..Default::default()
    };
    match filter.status {
      ArchiveStatus::Active => query.reported_from = Some(cutoff),
      ArchiveStatus::Archived => query.reported_before = Some(cutoff),
    }

    let documents = self.store.search_documents(&query).await.map_err(store_err)?;
    Ok(
      documents
        .into_iter()
        .map(|d| ClassifiedDocument::new(d, config.retention, now))
        .collect(),
    )
  }

  /// Text search across both partitions.
  pub async fn search(&self, text: &str) -> Result<Vec<ClassifiedDocument>> {
    let config = self.config.current().await?;
    let now = self.now();
    let query = DocumentQuery { text: Some(text.to_owned()), ..Default::default() };
    let documents = self.store.search_documents(&query).await.map_err(store_err)?;
    Ok(
      documents
        .into_iter()
        .map(|d| ClassifiedDocument::new(d, config.retention, now))
        .collect(),
    )
  }

  /// The actor's own active documents that archive within the notice window.
  pub async fn expiring(&self, actor: &Actor) -> Result<Vec<ExpiringDocument>> {
    let config = self.config.current().await?;
    let now = self.now();
    let window = Duration::days(EXPIRY_NOTICE_DAYS);
    let cutoff = config.retention.cutoff(now);

    let query = DocumentQuery {
      operator_id: Some(actor.user_id),
      reported_from: Some(cutoff),
      reported_before: Some(cutoff + window),
      ..Default::default()
    };
    let documents = self.store.search_documents(&query).await.map_err(store_err)?;

    Ok(
      documents
        .into_iter()
        .filter(|d| config.retention.expires_within(d.reported_at, now, window))
        .map(|document| ExpiringDocument {
          archives_at: document.reported_at + config.retention.duration(),
          document,
        })
        .collect(),
    )
  }

  pub async fn print_preview(&self, actor: &Actor, id: Uuid) -> Result<PrintPreview> {
    let document = self.load(id).await?;
    policy::authorize(&document, actor)?;

    let config = self.config.current().await?;
    let now = self.now();
    Ok(PrintPreview {
      document:     ClassifiedDocument::new(document, config.retention, now),
      letterhead:   config.letterhead.clone(),
      printed_on:   now.with_timezone(&config.timezone).date_naive(),
      generated_at: now,
    })
  }

  // ─── Helpers ───────────────────────────────────────────────────────────────

  async fn load(&self, id: Uuid) -> Result<LostDocument> {
    self
      .store
      .get_document(id)
      .await
      .map_err(store_err)?
      .ok_or_else(|| Error::document_not_found(id))
  }

  async fn classify(
    &self,
    document: LostDocument,
    now: DateTime<Utc>,
  ) -> Result<ClassifiedDocument> {
    let config = self.config.current().await?;
    Ok(ClassifiedDocument::new(document, config.retention, now))
  }

  /// The actor and reporting officer must be existing active users; the
  /// approving official, when given, must exist.
  async fn check_personnel(&self, actor: &Actor, draft: &DocumentDraft) -> Result<()> {
    let operator = self.user(actor.user_id).await?;
    if !operator.as_ref().is_some_and(|u| u.active) {
      return Err(Error::validation("operator_id", "operator is not an active user"));
    }

    match self.user(draft.reporting_officer_id).await? {
      Some(u) if u.active => {}
      Some(_) => {
        return Err(Error::validation(
          "reporting_officer_id",
          format!("user {} is inactive", draft.reporting_officer_id),
        ));
      }
      None => {
        return Err(Error::validation(
          "reporting_officer_id",
          format!("user {} does not exist", draft.reporting_officer_id),
        ));
      }
    }

    if let Some(official) = draft.approving_official_id
      && self.user(official).await?.is_none()
    {
      return Err(Error::validation(
        "approving_official_id",
        format!("user {official} does not exist"),
      ));
    }
    Ok(())
  }

  pub(crate) async fn user(&self, id: Uuid) -> Result<Option<User>> {
    self.store.get_user(id).await.map_err(store_err)
  }
}
