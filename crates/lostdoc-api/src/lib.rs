//! JSON REST API for the lost-document registry.
//!
//! Exposes an axum [`Router`] backed by a [`DocumentService`] over any
//! [`DocumentStore`]. Every route requires HTTP Basic credentials of an
//! active user; TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", lostdoc_api::api_router(AppState::new(service)))
//! ```

pub mod admin;
pub mod auth;
pub mod documents;
pub mod error;
pub mod extract;
pub mod search;
pub mod stats;

use axum::{
  Router,
  routing::{get, post},
};
use lostdoc_core::store::DocumentStore;
use lostdoc_service::DocumentService;

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub service: DocumentService<S>,
}

impl<S> AppState<S> {
  pub fn new(service: DocumentService<S>) -> Self { Self { service } }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self { Self { service: self.service.clone() } }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: DocumentStore + 'static,
{
  Router::new()
    // Documents
    .route("/documents", get(documents::list::<S>).post(documents::create::<S>))
    .route(
      "/documents/{id}",
      get(documents::get_one::<S>)
        .put(documents::update::<S>)
        .delete(documents::delete_one::<S>),
    )
    .route("/documents/{id}/print", get(documents::print::<S>))
    // Search & notifications
    .route("/search", get(search::handler::<S>))
    .route("/notifications/expiring-documents", get(search::expiring::<S>))
    // Dashboard
    .route("/stats", get(stats::summary::<S>))
    .route("/stats/monthly-issuance", get(stats::monthly_issuance::<S>))
    .route("/stats/item-composition", get(stats::item_composition::<S>))
    // Administration
    .route("/users", get(admin::list_users::<S>).post(admin::create_user::<S>))
    .route(
      "/users/{id}",
      get(admin::get_user::<S>).delete(admin::deactivate_user::<S>),
    )
    .route("/users/{id}/activate", post(admin::activate_user::<S>))
    .route(
      "/settings",
      get(admin::show_settings::<S>).put(admin::update_settings::<S>),
    )
    .route("/audit-logs", get(admin::audit_log::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests {
  use std::{sync::Arc, time::Duration};

  use argon2::{
    Algorithm, Argon2, Params, PasswordHasher, Version, password_hash::SaltString,
  };
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
  use lostdoc_core::user::{NewUser, Role};
  use lostdoc_service::ConfigProvider;
  use lostdoc_store_sqlite::SqliteStore;
  use rand_core::OsRng;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use super::*;

  /// Low-cost argon2 parameters; verification reads them from the hash.
  fn cheap_hash(password: &str) -> String {
    let params = Params::new(1024, 1, 1, None).unwrap();
    let salt = SaltString::generate(&mut OsRng);
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string()
  }

  async fn make_state() -> (AppState<SqliteStore>, Arc<SqliteStore>) {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let config = ConfigProvider::new(Arc::clone(&store), Duration::from_secs(30));
    config.ensure_defaults().await.unwrap();

    for (username, role) in
      [("admin", Role::Admin), ("alice", Role::Operator), ("bob", Role::Operator)]
    {
      store
        .create_user(NewUser {
          username:      username.into(),
          full_name:     username.to_uppercase(),
          rank:          None,
          position:      None,
          role,
          password_hash: cheap_hash("secret"),
        })
        .await
        .unwrap();
    }

    let service = DocumentService::new(Arc::clone(&store), config);
    (AppState::new(service), store)
  }

  fn auth_header(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  async fn call(
    state: &AppState<SqliteStore>,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
      builder = builder.header(header::AUTHORIZATION, auth_header(user, "secret"));
    }
    let body = match body {
      Some(json) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(json.to_string())
      }
      None => Body::empty(),
    };
    let resp = api_router(state.clone())
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
  }

  async fn officer_id(store: &SqliteStore, username: &str) -> String {
    store
      .find_user_by_username(username)
      .await
      .unwrap()
      .unwrap()
      .user_id
      .to_string()
  }

  fn document_body(officer: &str) -> Value {
    json!({
      "resident": {
        "full_name": "Budi Santoso",
        "birth_place": "Jakarta",
        "birth_date": "1990-01-15",
        "gender": "male",
        "religion": "Islam",
        "occupation": "Clerk",
        "address": "Jl. Merdeka 10"
      },
      "items": [{ "name": "ID card" }, { "name": "Wallet", "description": "brown" }],
      "loss_location": "Senen market",
      "reporting_officer_id": officer,
      "approving_official_id": null
    })
  }

  async fn create_as(
    state: &AppState<SqliteStore>,
    store: &SqliteStore,
    user: &str,
  ) -> String {
    let officer = officer_id(store, user).await;
    let (status, body) =
      call(state, "POST", "/documents", Some(user), Some(document_body(&officer))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["document_id"].as_str().unwrap().to_owned()
  }

  // ── Authentication ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn requests_without_valid_credentials_are_401() {
    let (state, _) = make_state().await;
    let (status, _) = call(&state, "GET", "/documents", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::builder()
      .uri("/documents")
      .header(header::AUTHORIZATION, auth_header("alice", "wrong"))
      .body(Body::empty())
      .unwrap();
    let resp = api_router(state.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let (status, _) = call(&state, "GET", "/documents", Some("nobody"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  // ── Documents ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_returns_201_with_reference_and_status() {
    let (state, store) = make_state().await;
    let officer = officer_id(&store, "alice").await;
    let (status, body) =
      call(&state, "POST", "/documents", Some("alice"), Some(document_body(&officer)))
        .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    let reference = body["reference_number"].as_str().unwrap();
    assert!(reference.starts_with("SKH/1/"), "{reference}");
    assert_eq!(body["archive_status"], "active");
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["operator"]["username"], "alice");
    assert!(body["operator"].get("password_hash").is_none());
  }

  #[tokio::test]
  async fn invalid_body_is_400_with_field() {
    let (state, store) = make_state().await;
    let officer = officer_id(&store, "alice").await;
    let mut body = document_body(&officer);
    body["items"] = json!([]);
    let (status, resp) = call(&state, "POST", "/documents", Some("alice"), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["field"], "items");
  }

  #[tokio::test]
  async fn malformed_requests_are_json_400s() {
    let (state, store) = make_state().await;
    let officer = officer_id(&store, "alice").await;

    let mut bad_date = document_body(&officer);
    bad_date["resident"]["birth_date"] = json!("1990-13-45");
    let (status, body) =
      call(&state, "POST", "/documents", Some("alice"), Some(bad_date)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("birth_date"), "{body}");

    let mut no_items = document_body(&officer);
    no_items.as_object_mut().unwrap().remove("items");
    let (status, body) =
      call(&state, "POST", "/documents", Some("alice"), Some(no_items)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("items"), "{body}");

    let req = Request::builder()
      .method("POST")
      .uri("/documents")
      .header(header::AUTHORIZATION, auth_header("alice", "secret"))
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from("{not json"))
      .unwrap();
    let resp = api_router(state.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let (status, body) = call(&state, "GET", "/documents/not-a-uuid", Some("alice"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");

    let (status, body) =
      call(&state, "GET", "/documents?status=deleted", Some("alice"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");
  }

  #[tokio::test]
  async fn single_document_routes_enforce_ownership() {
    let (state, store) = make_state().await;
    let id = create_as(&state, &store, "alice").await;
    let uri = format!("/documents/{id}");

    let (status, _) = call(&state, "GET", &uri, Some("bob"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = call(&state, "GET", &format!("{uri}/print"), Some("bob"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = call(&state, "DELETE", &uri, Some("bob"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&state, "GET", &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);

    let officer = officer_id(&store, "alice").await;
    let mut revised = document_body(&officer);
    revised["items"] = json!([{ "name": "Passport" }]);
    let (status, body) = call(&state, "PUT", &uri, Some("admin"), Some(revised)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["last_updated_by"]["username"], "admin");

    let (status, _) = call(&state, "DELETE", &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&state, "GET", &uri, Some("admin"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn list_partitions_by_status() {
    let (state, store) = make_state().await;
    create_as(&state, &store, "alice").await;

    let (status, active) = call(&state, "GET", "/documents", Some("bob"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(active.as_array().unwrap().len(), 1);

    let (status, archived) =
      call(&state, "GET", "/documents?status=archived", Some("bob"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(archived.as_array().unwrap().is_empty());
  }

  #[tokio::test]
  async fn search_requires_a_query() {
    let (state, store) = make_state().await;
    create_as(&state, &store, "alice").await;

    let (status, _) = call(&state, "GET", "/search", Some("alice"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, found) = call(&state, "GET", "/search?q=Santoso", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn fresh_documents_are_not_expiring() {
    let (state, store) = make_state().await;
    create_as(&state, &store, "alice").await;
    let (status, body) = call(
      &state,
      "GET",
      "/notifications/expiring-documents",
      Some("alice"),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
  }

  #[tokio::test]
  async fn dashboard_statistics() {
    let (state, store) = make_state().await;
    create_as(&state, &store, "alice").await;
    create_as(&state, &store, "bob").await;

    let (status, stats) = call(&state, "GET", "/stats", Some("bob"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["reports_today"], 2);
    assert_eq!(stats["reports_this_year"], 2);
    assert_eq!(stats["total_users"], 3);

    let (status, monthly) =
      call(&state, "GET", "/stats/monthly-issuance", Some("bob"), None).await;
    assert_eq!(status, StatusCode::OK);
    let counts = monthly["counts"].as_array().unwrap();
    assert_eq!(counts.len(), 12);
    assert_eq!(counts.iter().filter_map(Value::as_u64).sum::<u64>(), 2);

    let (status, items) =
      call(&state, "GET", "/stats/item-composition", Some("bob"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(items[0]["count"], 2);

    let (status, _) = call(&state, "GET", "/stats", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  // ── Administration ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn deactivated_users_cannot_log_in() {
    let (state, store) = make_state().await;
    let bob = officer_id(&store, "bob").await;
    let uri = format!("/users/{bob}");

    let (status, _) = call(&state, "DELETE", &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(&state, "DELETE", &uri, Some("admin"), None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["active"], false);

    let (status, _) = call(&state, "GET", "/documents", Some("bob"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Nor be named as reporting officer.
    let (status, body) =
      call(&state, "POST", "/documents", Some("alice"), Some(document_body(&bob))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "reporting_officer_id");

    let (status, body) =
      call(&state, "POST", &format!("{uri}/activate"), Some("admin"), None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["active"], true);

    let (status, _) = call(&state, "GET", "/documents", Some("bob"), None).await;
    assert_eq!(status, StatusCode::OK);
  }

  #[tokio::test]
  async fn settings_are_admin_only_and_validated() {
    let (state, _) = make_state().await;

    let (status, _) = call(&state, "GET", "/settings", Some("alice"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(
      &state,
      "PUT",
      "/settings",
      Some("admin"),
      Some(json!({ "numbering_format": "SKH/%d" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, body) = call(
      &state,
      "PUT",
      "/settings",
      Some("admin"),
      Some(json!({ "office_name": "Sector Police", "archive_duration_days": "60" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["archive_duration_days"], "60");

    let (status, body) = call(&state, "GET", "/settings", Some("admin"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["office_name"], "Sector Police");
  }

  #[tokio::test]
  async fn admin_creates_a_user_who_can_log_in() {
    let (state, _) = make_state().await;
    let new_user = json!({
      "username": "carol",
      "full_name": "Carol",
      "rank": "BRIPKA",
      "role": "operator",
      "password": "secret"
    });

    let (status, _) =
      call(&state, "POST", "/users", Some("alice"), Some(new_user.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) =
      call(&state, "POST", "/users", Some("admin"), Some(new_user.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert!(body.get("password_hash").is_none());

    let (status, _) = call(&state, "POST", "/users", Some("admin"), Some(new_user)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(&state, "GET", "/documents", Some("carol"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, users) = call(&state, "GET", "/users", Some("admin"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 4);

    let carol = body["user_id"].as_str().unwrap();
    let (status, me) = call(&state, "GET", &format!("/users/{carol}"), Some("carol"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["rank"], "BRIPKA");
    let (status, _) = call(&state, "GET", &format!("/users/{carol}"), Some("alice"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, audit) = call(&state, "GET", "/audit-logs?limit=1", Some("admin"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(audit[0]["action"], "user_created");
  }
}
