//! Lost-document reports and their item lists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{
  Error, Result,
  resident::{Resident, ResidentIdentity},
  user::UserSummary,
};

/// Stored lifecycle status. Archival is *not* a status; see
/// [`crate::archive`].
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DocumentStatus {
  #[default]
  Issued,
}

/// One lost item, owned by exactly one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LostItem {
  pub item_id:     Uuid,
  pub name:        String,
  pub description: Option<String>,
}

/// An item as submitted by a request, before it is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLostItem {
  pub name:        String,
  #[serde(default)]
  pub description: Option<String>,
}

/// A document fully joined with its resident, items and personnel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LostDocument {
  pub document_id:        Uuid,
  /// Formatted reference number; immutable once assigned.
  pub reference_number:   String,
  /// Position within the numbering period.
  pub sequence:           u32,
  /// Numbering period (the calendar year in the office timezone).
  pub period:             i32,
  pub reported_at:        DateTime<Utc>,
  pub status:             DocumentStatus,
  pub loss_location:      String,
  pub resident:           Resident,
  pub items:              Vec<LostItem>,
  pub reporting_officer:  UserSummary,
  pub approving_official: Option<UserSummary>,
  /// The user who created the document. Never changes.
  pub operator:           UserSummary,
  pub last_updated_by:    Option<UserSummary>,
  pub approved_at:        Option<DateTime<Utc>>,
  pub created_at:         DateTime<Utc>,
  pub updated_at:         DateTime<Utc>,
}

/// The caller-supplied content of a document, used both for creation and
/// for full replacement on update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentDraft {
  pub resident:              ResidentIdentity,
  pub items:                 Vec<NewLostItem>,
  pub loss_location:         String,
  pub reporting_officer_id:  Uuid,
  pub approving_official_id: Option<Uuid>,
}

impl DocumentDraft {
  /// Shape checks that need no store access.
  pub fn validate(&self) -> Result<()> {
    self.resident.validate()?;
    if self.items.is_empty() {
      return Err(Error::validation("items", "at least one item is required"));
    }
    if let Some(pos) = self.items.iter().position(|i| i.name.trim().is_empty()) {
      return Err(Error::validation(
        "items",
        format!("item {pos} has an empty name"),
      ));
    }
    if self.loss_location.trim().is_empty() {
      return Err(Error::validation("loss_location", "must not be empty"));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn draft() -> DocumentDraft {
    DocumentDraft {
      resident:              ResidentIdentity {
        full_name:   "Budi Santoso".into(),
        birth_place: "Jakarta".into(),
        birth_date:  NaiveDate::from_ymd_opt(1990, 1, 15).unwrap(),
        gender:      "male".into(),
        religion:    "Islam".into(),
        occupation:  "Clerk".into(),
        address:     "Jl. Merdeka 10".into(),
      },
      items:                 vec![NewLostItem {
        name:        "ID card".into(),
        description: None,
      }],
      loss_location:         "Senen market".into(),
      reporting_officer_id:  Uuid::new_v4(),
      approving_official_id: None,
    }
  }

  #[test]
  fn valid_draft_passes() { assert!(draft().validate().is_ok()); }

  #[test]
  fn empty_item_list_is_rejected() {
    let mut d = draft();
    d.items.clear();
    assert!(matches!(
      d.validate(),
      Err(Error::Validation { field: "items", .. })
    ));
  }

  #[test]
  fn blank_item_name_is_rejected() {
    let mut d = draft();
    d.items.push(NewLostItem { name: "  ".into(), description: None });
    assert!(matches!(
      d.validate(),
      Err(Error::Validation { field: "items", .. })
    ));
  }

  #[test]
  fn blank_resident_name_is_rejected() {
    let mut d = draft();
    d.resident.full_name = String::new();
    assert!(matches!(
      d.validate(),
      Err(Error::Validation { field: "full_name", .. })
    ));
  }
}
