//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings (microsecond
//! precision, `Z` suffix) so that string comparison in SQL orders them
//! chronologically. Dates are `YYYY-MM-DD`. UUIDs are hyphenated lowercase.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use lostdoc_core::{
  audit::{AuditAction, AuditEntry},
  document::{DocumentStatus, LostItem},
  resident::Resident,
  user::{Role, User, UserSummary},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

fn decode_enum<T: FromStr>(what: &str, s: &str) -> Result<T> {
  T::from_str(s).map_err(|_| Error::Decode(format!("unknown {what}: {s:?}")))
}

// ─── LIKE patterns ───────────────────────────────────────────────────────────

/// `%text%` with LIKE metacharacters escaped; pair with `ESCAPE '\'`.
pub fn like_pattern(text: &str) -> String {
  let mut out = String::with_capacity(text.len() + 2);
  out.push('%');
  for c in text.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out.push('%');
  out
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "user_id, username, full_name, rank, position, role, \
                                password_hash, active, created_at, updated_at";

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:       String,
  pub username:      String,
  pub full_name:     String,
  pub rank:          Option<String>,
  pub position:      Option<String>,
  pub role:          String,
  pub password_hash: String,
  pub active:        bool,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      username:      row.get(1)?,
      full_name:     row.get(2)?,
      rank:          row.get(3)?,
      position:      row.get(4)?,
      role:          row.get(5)?,
      password_hash: row.get(6)?,
      active:        row.get(7)?,
      created_at:    row.get(8)?,
      updated_at:    row.get(9)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:       decode_uuid(&self.user_id)?,
      username:      self.username,
      full_name:     self.full_name,
      rank:          self.rank,
      position:      self.position,
      role:          decode_enum::<Role>("role", &self.role)?,
      password_hash: self.password_hash,
      active:        self.active,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }

  pub fn into_summary(self) -> Result<UserSummary> {
    Ok(UserSummary {
      user_id:   decode_uuid(&self.user_id)?,
      username:  self.username,
      full_name: self.full_name,
      rank:      self.rank,
      position:  self.position,
    })
  }
}

pub const RESIDENT_COLUMNS: &str = "resident_id, full_name, birth_place, birth_date, \
                                    gender, religion, occupation, address, \
                                    created_at, updated_at";

/// Raw values read directly from a `residents` row.
pub struct RawResident {
  pub resident_id: String,
  pub full_name:   String,
  pub birth_place: String,
  pub birth_date:  String,
  pub gender:      String,
  pub religion:    String,
  pub occupation:  String,
  pub address:     String,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawResident {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      resident_id: row.get(0)?,
      full_name:   row.get(1)?,
      birth_place: row.get(2)?,
      birth_date:  row.get(3)?,
      gender:      row.get(4)?,
      religion:    row.get(5)?,
      occupation:  row.get(6)?,
      address:     row.get(7)?,
      created_at:  row.get(8)?,
      updated_at:  row.get(9)?,
    })
  }

  pub fn into_resident(self) -> Result<Resident> {
    Ok(Resident {
      resident_id: decode_uuid(&self.resident_id)?,
      full_name:   self.full_name,
      birth_place: self.birth_place,
      birth_date:  decode_date(&self.birth_date)?,
      gender:      self.gender,
      religion:    self.religion,
      occupation:  self.occupation,
      address:     self.address,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

pub const DOCUMENT_COLUMNS: &str = "document_id, reference_number, period, sequence, \
                                    reported_at, status, loss_location, resident_id, \
                                    reporting_officer_id, approving_official_id, \
                                    operator_id, last_updated_by_id, approved_at, \
                                    created_at, updated_at";

/// Raw values read directly from a `lost_documents` row. Foreign keys are
/// resolved separately.
pub struct RawDocument {
  pub document_id:           String,
  pub reference_number:      String,
  pub period:                i32,
  pub sequence:              u32,
  pub reported_at:           String,
  pub status:                String,
  pub loss_location:         String,
  pub resident_id:           String,
  pub reporting_officer_id:  String,
  pub approving_official_id: Option<String>,
  pub operator_id:           String,
  pub last_updated_by_id:    Option<String>,
  pub approved_at:           Option<String>,
  pub created_at:            String,
  pub updated_at:            String,
}

impl RawDocument {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      document_id:           row.get(0)?,
      reference_number:      row.get(1)?,
      period:                row.get(2)?,
      sequence:              row.get(3)?,
      reported_at:           row.get(4)?,
      status:                row.get(5)?,
      loss_location:         row.get(6)?,
      resident_id:           row.get(7)?,
      reporting_officer_id:  row.get(8)?,
      approving_official_id: row.get(9)?,
      operator_id:           row.get(10)?,
      last_updated_by_id:    row.get(11)?,
      approved_at:           row.get(12)?,
      created_at:            row.get(13)?,
      updated_at:            row.get(14)?,
    })
  }

  pub fn status(&self) -> Result<DocumentStatus> {
    decode_enum("document status", &self.status)
  }
}

/// Raw values read directly from a `lost_items` row.
pub struct RawItem {
  pub item_id:     String,
  pub name:        String,
  pub description: Option<String>,
}

impl RawItem {
  pub fn into_item(self) -> Result<LostItem> {
    Ok(LostItem {
      item_id:     decode_uuid(&self.item_id)?,
      name:        self.name,
      description: self.description,
    })
  }
}

/// Raw values read directly from an `audit_log` row.
pub struct RawAuditEntry {
  pub entry_id:    String,
  pub actor_id:    String,
  pub action:      String,
  pub detail:      String,
  pub recorded_at: String,
}

impl RawAuditEntry {
  pub fn into_entry(self) -> Result<AuditEntry> {
    Ok(AuditEntry {
      entry_id:    decode_uuid(&self.entry_id)?,
      actor_id:    decode_uuid(&self.actor_id)?,
      action:      decode_enum::<AuditAction>("audit action", &self.action)?,
      detail:      self.detail,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}
