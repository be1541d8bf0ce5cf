//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use lostdoc_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Missing, malformed or rejected credentials.
  #[error("unauthorized")]
  Unauthorized,

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Core(#[from] CoreError),
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::Unauthorized => {
        return (
          StatusCode::UNAUTHORIZED,
          [(header::WWW_AUTHENTICATE, "Basic realm=\"lostdoc\"")],
          Json(json!({ "error": "authentication required" })),
        )
          .into_response();
      }
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, json!({ "error": m })),
      ApiError::Core(e) => match e {
        CoreError::Validation { field, message } => (
          StatusCode::BAD_REQUEST,
          json!({ "error": message, "field": field }),
        ),
        CoreError::AccessDenied { .. } => {
          (StatusCode::FORBIDDEN, json!({ "error": "access denied" }))
        }
        CoreError::NotFound { .. } => {
          (StatusCode::NOT_FOUND, json!({ "error": e.to_string() }))
        }
        CoreError::Conflict(m) => (StatusCode::CONFLICT, json!({ "error": m })),
        CoreError::Configuration(_) | CoreError::Persistence(_) => {
          tracing::error!(error = %e, "request failed");
          (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "internal server error" }),
          )
        }
      },
    };
    (status, Json(body)).into_response()
  }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  fn status_of(e: CoreError) -> StatusCode { ApiError::from(e).into_response().status() }

  #[test]
  fn core_errors_map_to_distinct_statuses() {
    let id = Uuid::new_v4();
    assert_eq!(
      status_of(CoreError::validation("items", "empty")),
      StatusCode::BAD_REQUEST
    );
    assert_eq!(
      status_of(CoreError::AccessDenied { actor: id, resource: "x".into() }),
      StatusCode::FORBIDDEN
    );
    assert_eq!(status_of(CoreError::document_not_found(id)), StatusCode::NOT_FOUND);
    assert_eq!(status_of(CoreError::Conflict("retry".into())), StatusCode::CONFLICT);
    assert_eq!(
      status_of(CoreError::Configuration("bad template".into())),
      StatusCode::INTERNAL_SERVER_ERROR
    );
  }

  #[tokio::test]
  async fn persistence_detail_is_not_exposed() {
    let err = CoreError::Persistence("UNIQUE constraint failed: secret_table".into());
    let resp = ApiError::from(err).into_response();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let text = std::str::from_utf8(&bytes).unwrap();
    assert!(!text.contains("secret_table"), "{text}");
  }

  #[test]
  fn unauthorized_challenges_for_basic() {
    let resp = ApiError::Unauthorized.into_response();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
  }
}
