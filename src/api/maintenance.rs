//! Database maintenance endpoints

use axum::{extract::State, routing::post, Json, Router};

use crate::{ApiResult, AppState};

/// POST /api/database/reset
///
/// Wipes every stored record and restores default settings. Runs under
/// the global write lock so no ingest or batch scan can observe a
/// half-cleared corpus.
pub async fn reset_database(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let _guard = state.write_lock.lock().await;
    crate::db::reset_database(&state.db).await?;
    Ok(Json(serde_json::json!({ "reset": true })))
}

/// Build maintenance routes
pub fn maintenance_routes() -> Router<AppState> {
    Router::new().route("/api/database/reset", post(reset_database))
}
