//! HTTP Basic-auth extractor resolving the acting user, plus password
//! hashing for user creation.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use lostdoc_core::{store::DocumentStore, user::Actor};
use rand_core::OsRng;

use crate::{AppState, error::ApiError};

/// The authenticated, active user a request runs as.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Actor);

/// Split an `Authorization: Basic …` header into username and password.
pub fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), ApiError> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds = String::from_utf8(decoded).map_err(|_| ApiError::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;
  Ok((username.to_owned(), password.to_owned()))
}

pub fn verify_password(password: &str, phc: &str) -> Result<(), ApiError> {
  let parsed = PasswordHash::new(phc).map_err(|_| ApiError::Unauthorized)?;
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .map_err(|_| ApiError::Unauthorized)
}

/// Argon2id PHC string for `password` with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::BadRequest(format!("cannot hash password: {e}")))
}

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: DocumentStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let (username, password) = basic_credentials(&parts.headers)?;

    let user = state
      .service
      .user_by_username(&username)
      .await?
      .ok_or(ApiError::Unauthorized)?;
    if !user.active {
      tracing::debug!(%username, "rejected login for inactive user");
      return Err(ApiError::Unauthorized);
    }
    verify_password(&password, &user.password_hash)?;

    Ok(CurrentUser(user.actor()))
  }
}
