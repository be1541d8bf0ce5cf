//! Residents: the people on whose behalf documents are issued.
//!
//! Residents are shared records. They are created on first reference and
//! deduplicated on `(full_name, birth_date)`; the descriptive fields of a
//! later request never overwrite an existing row.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resident {
  pub resident_id:  Uuid,
  pub full_name:    String,
  pub birth_place:  String,
  pub birth_date:   NaiveDate,
  pub gender:       String,
  pub religion:     String,
  pub occupation:   String,
  pub address:      String,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

impl Resident {
  /// True when `identity` names this same person under the dedup rule.
  pub fn matches(&self, identity: &ResidentIdentity) -> bool {
    self.full_name == identity.full_name && self.birth_date == identity.birth_date
  }
}

/// Identity and descriptive fields carried by a create/update request.
///
/// Only `full_name` and `birth_date` participate in lookup. Matching is
/// exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidentIdentity {
  pub full_name:   String,
  pub birth_place: String,
  pub birth_date:  NaiveDate,
  pub gender:      String,
  pub religion:    String,
  pub occupation:  String,
  pub address:     String,
}

impl ResidentIdentity {
  pub fn validate(&self) -> Result<()> {
    if self.full_name.trim().is_empty() {
      return Err(Error::validation("full_name", "must not be empty"));
    }
    Ok(())
  }
}
