//! Aggregate counts over every record, served at `GET /dashboard/stats`.

use axum::{Json, extract::State};
use outreach_core::{
  store::{BlobStore, EncounterStore},
  wire::DashboardStats,
};

use crate::{AppState, error::ApiError};

pub async fn stats<S, B>(
  State(state): State<AppState<S, B>>,
) -> Result<Json<DashboardStats>, ApiError>
where
  S: EncounterStore + 'static,
  B: BlobStore + 'static,
{
  let stats = state.service.stats().await?;
  Ok(Json(DashboardStats::from(stats)))
}
