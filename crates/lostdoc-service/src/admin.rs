//! Users, settings and the audit log. Everything here except the login
//! lookup is administrator-only.

use lostdoc_core::{
  Error, Result,
  audit::{AuditAction, AuditEntry},
  policy::require_admin,
  settings::SettingsMap,
  store::{DocumentStore, StoreError as _},
  user::{Actor, NewUser, User},
};
use uuid::Uuid;

use crate::{DocumentService, store_err};

/// Upper bound on audit entries returned by one listing.
pub const MAX_AUDIT_PAGE: usize = 500;

impl<S: DocumentStore> DocumentService<S> {
  // ─── Users ─────────────────────────────────────────────────────────────────

  /// Lookup used by authentication; no actor yet.
  pub async fn user_by_username(&self, username: &str) -> Result<Option<User>> {
    self
      .store
      .find_user_by_username(username)
      .await
      .map_err(store_err)
  }

  pub async fn create_user(&self, actor: &Actor, input: NewUser) -> Result<User> {
    require_admin(actor)?;
    if input.username.trim().is_empty() {
      return Err(Error::validation("username", "must not be empty"));
    }
    if input.full_name.trim().is_empty() {
      return Err(Error::validation("full_name", "must not be empty"));
    }

    let username = input.username.clone();
    let user = self.store.create_user(input).await.map_err(|e| {
      if e.is_conflict() {
        Error::Conflict(format!("username {username:?} is already taken"))
      } else {
        store_err(e)
      }
    })?;

    tracing::info!(user = %user.user_id, role = %user.role, "user created");
    self
      .audit(
        actor,
        AuditAction::UserCreated,
        format!("created {} user {}", user.role, user.username),
      )
      .await;
    Ok(user)
  }

  /// Administrators may read anyone; other users only themselves.
  pub async fn get_user(&self, actor: &Actor, id: Uuid) -> Result<User> {
    if actor.user_id != id {
      require_admin(actor)?;
    }
    self
      .user(id)
      .await?
      .ok_or(Error::NotFound { entity: "user", id })
  }

  pub async fn list_users(&self, actor: &Actor) -> Result<Vec<User>> {
    require_admin(actor)?;
    self.store.list_users().await.map_err(store_err)
  }

  /// Disable a login. Documents keep their references to the user, but an
  /// inactive user cannot authenticate or be named as reporting officer.
  pub async fn deactivate_user(&self, actor: &Actor, id: Uuid) -> Result<User> {
    require_admin(actor)?;
    if actor.user_id == id {
      return Err(Error::validation("user_id", "administrators cannot deactivate themselves"));
    }
    self.set_active(actor, id, false).await
  }

  pub async fn activate_user(&self, actor: &Actor, id: Uuid) -> Result<User> {
    require_admin(actor)?;
    self.set_active(actor, id, true).await
  }

  async fn set_active(&self, actor: &Actor, id: Uuid, active: bool) -> Result<User> {
    if !self
      .store
      .set_user_active(id, active, self.now())
      .await
      .map_err(store_err)?
    {
      return Err(Error::NotFound { entity: "user", id });
    }
    let user = self.user(id).await?.ok_or(Error::NotFound { entity: "user", id })?;

    let (action, verb) = if active {
      (AuditAction::UserActivated, "activated")
    } else {
      (AuditAction::UserDeactivated, "deactivated")
    };
    tracing::info!(user = %id, actor = %actor.user_id, active, "user {verb}");
    self
      .audit(actor, action, format!("{verb} user {}", user.username))
      .await;
    Ok(user)
  }

  // ─── Settings ──────────────────────────────────────────────────────────────

  pub async fn settings(&self, actor: &Actor) -> Result<SettingsMap> {
    require_admin(actor)?;
    self.config.raw().await
  }

  /// Merge, validate and persist. The cached configuration is invalidated
  /// before this returns.
  pub async fn update_settings(
    &self,
    actor: &Actor,
    changes: SettingsMap,
  ) -> Result<SettingsMap> {
    require_admin(actor)?;
    if changes.is_empty() {
      return Err(Error::validation("settings", "no settings given"));
    }

    let keys = changes.keys().cloned().collect::<Vec<_>>().join(", ");
    let merged = self.config.update(changes).await?;

    tracing::info!(actor = %actor.user_id, keys = %keys, "settings updated");
    self
      .audit(actor, AuditAction::SettingsUpdated, format!("changed {keys}"))
      .await;
    Ok(merged)
  }

  // ─── Audit ─────────────────────────────────────────────────────────────────

  /// Newest first, capped at [`MAX_AUDIT_PAGE`].
  pub async fn audit_log(&self, actor: &Actor, limit: Option<usize>) -> Result<Vec<AuditEntry>> {
    require_admin(actor)?;
    let limit = limit.unwrap_or(100).min(MAX_AUDIT_PAGE);
    self.store.list_audit(limit).await.map_err(store_err)
  }
}
