//! Blacklist management endpoints

use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;

use crate::models::{BlacklistEntry, DangerLevel};
use crate::{ApiError, ApiResult, AppState};

/// Request payload for adding or updating a watch entry
#[derive(Debug, Deserialize)]
pub struct BlacklistRequest {
    pub plate_text: String,
    pub reason: String,
    pub danger_level: DangerLevel,
}

/// GET /api/blacklist
pub async fn list_blacklist(State(state): State<AppState>) -> ApiResult<Json<Vec<BlacklistEntry>>> {
    let entries = crate::db::blacklist::list_blacklist(&state.db).await?;
    Ok(Json(entries))
}

/// POST /api/blacklist
///
/// Upsert by plate text; recomputes status of every plate the edited
/// entry matches.
pub async fn add_entry(
    State(state): State<AppState>,
    Json(payload): Json<BlacklistRequest>,
) -> ApiResult<Json<BlacklistEntry>> {
    let plate_text = payload.plate_text.trim().to_uppercase();
    if plate_text.is_empty() {
        return Err(ApiError::BadRequest(
            "Plate text cannot be empty or whitespace-only".to_string(),
        ));
    }

    // Propagation rewrites plate rows corpus-wide; serialize against
    // in-flight ingests and batch scans.
    let _guard = state.write_lock.lock().await;

    let thresholds = crate::db::settings::get_similarity_thresholds(&state.db).await?;
    crate::db::blacklist::add_or_update(
        &state.db,
        &plate_text,
        &payload.reason,
        payload.danger_level,
        thresholds,
    )
    .await?;

    let entry = crate::db::blacklist::get_entry(&state.db, &plate_text)
        .await?
        .ok_or_else(|| ApiError::Internal("Entry missing after upsert".to_string()))?;
    Ok(Json(entry))
}

/// DELETE /api/blacklist/:plate_text
pub async fn remove_entry(
    State(state): State<AppState>,
    Path(plate_text): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let plate_text = plate_text.trim().to_uppercase();

    let _guard = state.write_lock.lock().await;

    if crate::db::blacklist::get_entry(&state.db, &plate_text).await?.is_none() {
        return Err(ApiError::NotFound(format!(
            "Blacklist entry '{}' not found",
            plate_text
        )));
    }

    let thresholds = crate::db::settings::get_similarity_thresholds(&state.db).await?;
    crate::db::blacklist::remove(&state.db, &plate_text, thresholds).await?;
    Ok(Json(serde_json::json!({ "removed": plate_text })))
}

/// Build blacklist routes
pub fn blacklist_routes() -> Router<AppState> {
    Router::new()
        .route("/api/blacklist", get(list_blacklist).post(add_entry))
        .route("/api/blacklist/:plate_text", delete(remove_entry))
}
