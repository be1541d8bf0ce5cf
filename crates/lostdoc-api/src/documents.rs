//! Handlers for `/documents` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/documents` | `?status=active\|archived` (default active), `q`, `limit`, `offset` |
//! | `POST`   | `/documents` | Body: [`DocumentDraft`]; 201 + document |
//! | `GET`    | `/documents/{id}` | Owner or admin; 403 / 404 |
//! | `PUT`    | `/documents/{id}` | Full replacement; owner or admin |
//! | `DELETE` | `/documents/{id}` | Soft delete; owner or admin |
//! | `GET`    | `/documents/{id}/print` | Document + letterhead |

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use lostdoc_core::{
  archive::{ArchiveStatus, ClassifiedDocument},
  document::DocumentDraft,
  store::DocumentStore,
};
use lostdoc_service::{ListFilter, PrintPreview};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
  AppState,
  auth::CurrentUser,
  error::ApiError,
  extract::{Json, Path, Query},
};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  #[serde(default)]
  pub status: ArchiveStatus,
  /// Substring of the reference number or resident name.
  pub q:      Option<String>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// `GET /documents[?status=active|archived][&q=...][&limit=...][&offset=...]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  CurrentUser(_actor): CurrentUser,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<ClassifiedDocument>>, ApiError>
where
  S: DocumentStore + 'static,
{
  let documents = state
    .service
    .list(ListFilter {
      status: params.status,
      text:   params.q,
      limit:  params.limit,
      offset: params.offset,
    })
    .await?;
  Ok(Json(documents))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /documents`: the caller becomes the document's operator.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Json(draft): Json<DocumentDraft>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + 'static,
{
  let document = state.service.create(&actor, draft).await?;
  Ok((StatusCode::CREATED, Json(document)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /documents/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<ClassifiedDocument>, ApiError>
where
  S: DocumentStore + 'static,
{
  Ok(Json(state.service.get(&actor, id).await?))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /documents/{id}`. The body is the complete new [`DocumentDraft`].
pub async fn update<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Path(id): Path<Uuid>,
  Json(draft): Json<DocumentDraft>,
) -> Result<Json<ClassifiedDocument>, ApiError>
where
  S: DocumentStore + 'static,
{
  Ok(Json(state.service.update(&actor, id, draft).await?))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /documents/{id}`
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError>
where
  S: DocumentStore + 'static,
{
  state.service.delete(&actor, id).await?;
  Ok(Json(json!({ "document_id": id, "deleted": true })))
}

// ─── Print ────────────────────────────────────────────────────────────────────

/// `GET /documents/{id}/print`
pub async fn print<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<PrintPreview>, ApiError>
where
  S: DocumentStore + 'static,
{
  Ok(Json(state.service.print_preview(&actor, id).await?))
}
