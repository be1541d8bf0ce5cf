//! Handlers for `GET /search` and `GET /notifications/expiring-documents`.

use axum::extract::State;
use lostdoc_core::{archive::ClassifiedDocument, store::DocumentStore};
use lostdoc_service::ExpiringDocument;
use serde::Deserialize;

use crate::{
  AppState,
  auth::CurrentUser,
  error::ApiError,
  extract::{Json, Query},
};

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  /// Substring of the reference number or resident name.
  pub q: Option<String>,
}

/// `GET /search?q=...`: active and archived documents alike.
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  CurrentUser(_actor): CurrentUser,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<ClassifiedDocument>>, ApiError>
where
  S: DocumentStore + 'static,
{
  let q = params
    .q
    .as_deref()
    .map(str::trim)
    .filter(|q| !q.is_empty())
    .ok_or_else(|| ApiError::BadRequest("query parameter `q` is required".into()))?;
  Ok(Json(state.service.search(q).await?))
}

/// `GET /notifications/expiring-documents`: the caller's own documents.
pub async fn expiring<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
) -> Result<Json<Vec<ExpiringDocument>>, ApiError>
where
  S: DocumentStore + 'static,
{
  Ok(Json(state.service.expiring(&actor).await?))
}
