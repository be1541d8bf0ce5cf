//! Office personnel: the users who operate the system and whose names are
//! printed on issued documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// A user's role. Closed set; every access decision matches exhaustively.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
  /// Unrestricted access across all documents, users and settings.
  Admin,
  /// May create documents and manage the ones they created.
  Operator,
}

/// A stored user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:       Uuid,
  /// Login name (the personnel registration number in practice).
  pub username:      String,
  pub full_name:     String,
  /// Rank or grade printed under the name on documents.
  pub rank:          Option<String>,
  /// Position, e.g. "head of the service unit".
  pub position:      Option<String>,
  pub role:          Role,
  /// argon2 PHC string. Never serialised.
  #[serde(skip_serializing, default)]
  pub password_hash: String,
  pub active:        bool,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl User {
  pub fn summary(&self) -> UserSummary {
    UserSummary {
      user_id:   self.user_id,
      username:  self.username.clone(),
      full_name: self.full_name.clone(),
      rank:      self.rank.clone(),
      position:  self.position.clone(),
    }
  }

  pub fn actor(&self) -> Actor {
    Actor { user_id: self.user_id, role: self.role }
  }
}

/// Input to [`crate::store::DocumentStore::create_user`].
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  pub full_name:     String,
  pub rank:          Option<String>,
  pub position:      Option<String>,
  pub role:          Role,
  pub password_hash: String,
}

/// The personnel fields joined into a loaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
  pub user_id:   Uuid,
  pub username:  String,
  pub full_name: String,
  pub rank:      Option<String>,
  pub position:  Option<String>,
}

/// The authenticated user on whose behalf an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
  pub user_id: Uuid,
  pub role:    Role,
}
