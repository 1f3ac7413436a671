//! Blacklist alert queue endpoints

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::models::BlacklistAlert;
use crate::{ApiResult, AppState};

/// GET /api/alerts
///
/// Unacknowledged sightings of blacklisted plates, newest first.
pub async fn list_alerts(State(state): State<AppState>) -> ApiResult<Json<Vec<BlacklistAlert>>> {
    let alerts = crate::db::alerts::unprocessed_alerts(&state.db).await?;
    Ok(Json(alerts))
}

/// POST /api/alerts/:id/ack
pub async fn ack_alert(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    crate::db::alerts::mark_processed(&state.db, id).await?;
    Ok(Json(serde_json::json!({ "acknowledged": id })))
}

/// Build alert routes
pub fn alert_routes() -> Router<AppState> {
    Router::new()
        .route("/api/alerts", get(list_alerts))
        .route("/api/alerts/:id/ack", post(ack_alert))
}
