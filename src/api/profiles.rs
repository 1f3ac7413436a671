//! Capture profile registry endpoints

use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::{ApiResult, AppState};

/// Request payload for registering a profile
#[derive(Debug, Deserialize)]
pub struct AddProfileRequest {
    pub name: String,
}

/// GET /api/profiles
pub async fn list_profiles(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    let profiles = crate::db::profiles::list_profiles(&state.db).await?;
    Ok(Json(profiles))
}

/// POST /api/profiles
pub async fn add_profile(
    State(state): State<AppState>,
    Json(payload): Json<AddProfileRequest>,
) -> ApiResult<Json<Vec<String>>> {
    crate::db::profiles::add_profile(&state.db, &payload.name).await?;
    let profiles = crate::db::profiles::list_profiles(&state.db).await?;
    Ok(Json(profiles))
}

/// Build profile routes
pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/api/profiles", get(list_profiles).post(add_profile))
}
