//! Administrator-only handlers: users, settings and the audit log.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/users` | |
//! | `POST` | `/users` | Body: [`CreateUserBody`]; password hashed here |
//! | `GET`  | `/users/{id}` | Admin, or the user themself |
//! | `DELETE` | `/users/{id}` | Deactivate; the row is kept |
//! | `POST` | `/users/{id}/activate` | |
//! | `GET`  | `/settings` | Raw key/value map |
//! | `PUT`  | `/settings` | Partial map merged over the stored one |
//! | `GET`  | `/audit-logs` | `?limit=`; newest first |

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use lostdoc_core::{
  audit::AuditEntry,
  policy::require_admin,
  settings::SettingsMap,
  store::DocumentStore,
  user::{NewUser, Role, User},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  auth::{CurrentUser, hash_password},
  error::ApiError,
  extract::{Json, Path, Query},
};

// ─── Users ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateUserBody {
  pub username:  String,
  pub full_name: String,
  pub rank:      Option<String>,
  pub position:  Option<String>,
  pub role:      Role,
  pub password:  String,
}

/// `GET /users`
pub async fn list_users<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
) -> Result<Json<Vec<User>>, ApiError>
where
  S: DocumentStore + 'static,
{
  Ok(Json(state.service.list_users(&actor).await?))
}

/// `GET /users/{id}`
pub async fn get_user<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError>
where
  S: DocumentStore + 'static,
{
  Ok(Json(state.service.get_user(&actor, id).await?))
}

/// `POST /users`
pub async fn create_user<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Json(body): Json<CreateUserBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + 'static,
{
  require_admin(&actor)?;
  if body.password.is_empty() {
    return Err(ApiError::BadRequest("password must not be empty".into()));
  }
  let input = NewUser {
    username:      body.username,
    full_name:     body.full_name,
    rank:          body.rank,
    position:      body.position,
    role:          body.role,
    password_hash: hash_password(&body.password)?,
  };
  let user = state.service.create_user(&actor, input).await?;
  Ok((StatusCode::CREATED, Json(user)))
}

/// `DELETE /users/{id}`
pub async fn deactivate_user<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError>
where
  S: DocumentStore + 'static,
{
  Ok(Json(state.service.deactivate_user(&actor, id).await?))
}

/// `POST /users/{id}/activate`
pub async fn activate_user<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError>
where
  S: DocumentStore + 'static,
{
  Ok(Json(state.service.activate_user(&actor, id).await?))
}

// ─── Settings ─────────────────────────────────────────────────────────────────

/// `GET /settings`
pub async fn show_settings<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
) -> Result<Json<SettingsMap>, ApiError>
where
  S: DocumentStore + 'static,
{
  Ok(Json(state.service.settings(&actor).await?))
}

/// `PUT /settings`. Body: `{"key":"value", ...}`; returns the merged map.
pub async fn update_settings<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Json(changes): Json<SettingsMap>,
) -> Result<Json<SettingsMap>, ApiError>
where
  S: DocumentStore + 'static,
{
  Ok(Json(state.service.update_settings(&actor, changes).await?))
}

// ─── Audit ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct AuditParams {
  pub limit: Option<usize>,
}

/// `GET /audit-logs[?limit=...]`
pub async fn audit_log<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Query(params): Query<AuditParams>,
) -> Result<Json<Vec<AuditEntry>>, ApiError>
where
  S: DocumentStore + 'static,
{
  Ok(Json(state.service.audit_log(&actor, params.limit).await?))
}
