//! Batch analysis endpoints
//!
//! The correlation pass runs inline on the request, holding the global
//! write lock so ingestion never interleaves with the O(n^2) scan. One
//! pass at a time; a second start request cancels nothing and conflicts.

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::services::FollowHit;
use crate::similarity::SimilarityThresholds;
use crate::models::SimilarPair;
use crate::{ApiError, ApiResult, AppState};

/// Optional one-off threshold override for a single analysis run
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeSimilarRequest {
    pub distance_threshold: Option<f64>,
    pub ratio_threshold: Option<f64>,
}

/// POST /api/analysis/similar
pub async fn analyze_similar(
    State(state): State<AppState>,
    payload: Option<Json<AnalyzeSimilarRequest>>,
) -> ApiResult<Json<Vec<SimilarPair>>> {
    let request = payload.map(|Json(r)| r).unwrap_or_default();
    let thresholds = match (request.distance_threshold, request.ratio_threshold) {
        (None, None) => None,
        (distance, ratio) => {
            let defaults = crate::db::settings::get_similarity_thresholds(&state.db).await?;
            Some(SimilarityThresholds {
                distance: distance.unwrap_or(defaults.distance),
                ratio: ratio.unwrap_or(defaults.ratio),
            })
        }
    };

    let token = CancellationToken::new();
    {
        let mut slot = state.correlation_cancel.write().await;
        if slot.is_some() {
            return Err(ApiError::Conflict(
                "Similar-plate analysis already running".to_string(),
            ));
        }
        *slot = Some(token.clone());
    }

    let _guard = state.write_lock.lock().await;
    let result = crate::services::analyze_similar_plates(&state.db, thresholds, &token).await;

    *state.correlation_cancel.write().await = None;

    match &result {
        Ok(pairs) => {
            tracing::info!(pairs_found = pairs.len(), "Analysis request complete");
        }
        Err(e) => {
            *state.last_error.write().await = Some(e.to_string());
        }
    }

    Ok(Json(result?))
}

/// POST /api/analysis/similar/cancel
pub async fn cancel_similar(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let slot = state.correlation_cancel.read().await;
    match slot.as_ref() {
        Some(token) => {
            token.cancel();
            Ok(Json(serde_json::json!({ "cancelled": true })))
        }
        None => Err(ApiError::NotFound("No analysis running".to_string())),
    }
}

/// POST /api/analysis/tracking
pub async fn analyze_tracking(State(state): State<AppState>) -> ApiResult<Json<Vec<FollowHit>>> {
    let _guard = state.write_lock.lock().await;
    let hits = crate::services::run_tracking_scan(&state.db).await?;
    Ok(Json(hits))
}

/// Build analysis routes
pub fn analysis_routes() -> Router<AppState> {
    Router::new()
        .route("/api/analysis/similar", post(analyze_similar))
        .route("/api/analysis/similar/cancel", post(cancel_similar))
        .route("/api/analysis/tracking", post(analyze_tracking))
}
