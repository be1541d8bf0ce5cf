//! Archival classification, derived at read time and never stored.
//!
//! A document is archived once its age strictly exceeds the configured
//! retention. A document exactly `retention_days` old is still active.
//! Changing the retention reclassifies every document immediately.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::document::LostDocument;

/// Lookahead for near-expiry notifications.
pub const EXPIRY_NOTICE_DAYS: i64 = 3;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ArchiveStatus {
  #[default]
  Active,
  Archived,
}

/// Retention window in whole days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Retention {
  days: u32,
}

impl Retention {
  pub fn days(days: u32) -> Self { Self { days } }

  pub fn as_days(&self) -> u32 { self.days }

  pub fn duration(&self) -> Duration { Duration::days(i64::from(self.days)) }

  /// Reports strictly before this instant are archived as of `now`.
  pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
    now - self.duration()
  }

  pub fn classify(
    &self,
    reported_at: DateTime<Utc>,
    now: DateTime<Utc>,
  ) -> ArchiveStatus {
    if now - reported_at > self.duration() {
      ArchiveStatus::Archived
    } else {
      ArchiveStatus::Active
    }
  }

  /// Active now, and will cross the threshold in less than `window`.
  pub fn expires_within(
    &self,
    reported_at: DateTime<Utc>,
    now: DateTime<Utc>,
    window: Duration,
  ) -> bool {
    self.classify(reported_at, now) == ArchiveStatus::Active
      && reported_at + self.duration() - now < window
  }
}

/// `now - document.reported_at > retention_days`.
pub fn is_archived(
  document: &LostDocument,
  now: DateTime<Utc>,
  retention_days: u32,
) -> bool {
  Retention::days(retention_days).classify(document.reported_at, now)
    == ArchiveStatus::Archived
}

/// A loaded document annotated with its read-time classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedDocument {
  #[serde(flatten)]
  pub document:       LostDocument,
  pub archive_status: ArchiveStatus,
}

impl ClassifiedDocument {
  pub fn new(
    document: LostDocument,
    retention: Retention,
    now: DateTime<Utc>,
  ) -> Self {
    let archive_status = if is_archived(&document, now, retention.as_days()) {
      ArchiveStatus::Archived
    } else {
      ArchiveStatus::Active
    };
    Self { document, archive_status }
  }
}
