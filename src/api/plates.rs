//! Plate query endpoints
//!
//! Read-only surface over the identity store: filtered listings, single
//! plate detail, merged detection history and cached similar pairs.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use std::collections::HashSet;

use crate::models::{DetectionEvent, PlateFilters, PlateRecord, PlateSummary, SimilarPair};
use crate::{ApiError, ApiResult, AppState};

/// GET /api/plates
///
/// The `following_only` filter needs the tracking analyzer and is applied
/// here on top of the SQL filters.
pub async fn list_plates(
    State(state): State<AppState>,
    Query(filters): Query<PlateFilters>,
) -> ApiResult<Json<Vec<PlateSummary>>> {
    let mut plates = crate::db::plates::list_plates(&state.db, &filters).await?;

    if filters.following_only {
        let hits = crate::services::run_tracking_scan(&state.db).await?;
        let following: HashSet<i64> = hits.iter().map(|h| h.plate.id).collect();
        plates.retain(|p| following.contains(&p.plate.id));
    }

    Ok(Json(plates))
}

/// GET /api/plates/:id
pub async fn get_plate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<PlateRecord>> {
    let plate = crate::db::plates::get_plate(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Plate {} not found", id)))?;
    Ok(Json(plate))
}

/// GET /api/plates/:id/detections
///
/// Merged history: detections of this plate and of every plate similar to
/// it, burst-deduplicated.
pub async fn get_plate_detections(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<DetectionEvent>>> {
    // 404 for unknown ids rather than an empty history
    crate::db::plates::get_plate_required(&state.db, id).await?;

    let thresholds = crate::db::settings::get_similarity_thresholds(&state.db).await?;
    let history = crate::db::detections::detection_history(&state.db, id, thresholds).await?;
    Ok(Json(history))
}

/// GET /api/plates/:id/similar
pub async fn get_plate_similar(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<SimilarPair>>> {
    crate::db::plates::get_plate_required(&state.db, id).await?;

    let pairs = crate::db::similar::pairs_for_plate(&state.db, id).await?;
    Ok(Json(pairs))
}

/// Build plate query routes
pub fn plate_routes() -> Router<AppState> {
    Router::new()
        .route("/api/plates", get(list_plates))
        .route("/api/plates/:id", get(get_plate))
        .route("/api/plates/:id/detections", get(get_plate_detections))
        .route("/api/plates/:id/similar", get(get_plate_similar))
}
