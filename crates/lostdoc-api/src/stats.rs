//! Dashboard statistics for any authenticated user.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/stats` | Reports today / this month / this year, active users |
//! | `GET`  | `/stats/monthly-issuance` | Twelve monthly counts for the current year |
//! | `GET`  | `/stats/item-composition` | Item names with counts, most frequent first |

use axum::extract::State;
use lostdoc_core::{
  stats::{DashboardStats, ItemCount, MonthlyIssuance},
  store::DocumentStore,
};

use crate::{AppState, auth::CurrentUser, error::ApiError, extract::Json};

/// `GET /stats`
pub async fn summary<S>(
  State(state): State<AppState<S>>,
  CurrentUser(_actor): CurrentUser,
) -> Result<Json<DashboardStats>, ApiError>
where
  S: DocumentStore + 'static,
{
  Ok(Json(state.service.dashboard_stats().await?))
}

/// `GET /stats/monthly-issuance`
pub async fn monthly_issuance<S>(
  State(state): State<AppState<S>>,
  CurrentUser(_actor): CurrentUser,
) -> Result<Json<MonthlyIssuance>, ApiError>
where
  S: DocumentStore + 'static,
{
  Ok(Json(state.service.monthly_issuance().await?))
}

/// `GET /stats/item-composition`
pub async fn item_composition<S>(
  State(state): State<AppState<S>>,
  CurrentUser(_actor): CurrentUser,
) -> Result<Json<Vec<ItemCount>>, ApiError>
where
  S: DocumentStore + 'static,
{
  Ok(Json(state.service.item_composition().await?))
}
