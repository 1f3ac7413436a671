//! Ingestion endpoint for recognition workers

use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;

use crate::models::{ObservedRead, PlateRecord};
use crate::{ApiResult, AppState};

/// Outcome of one submitted read
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    /// Whether the read was stored (false: dropped locally)
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plate: Option<PlateRecord>,
}

/// POST /api/ingest
pub async fn ingest_read(
    State(state): State<AppState>,
    Json(read): Json<ObservedRead>,
) -> ApiResult<Json<IngestResponse>> {
    let gateway = state.ingest_gateway();
    let plate = gateway.ingest(&read).await?;

    Ok(Json(IngestResponse {
        accepted: plate.is_some(),
        plate,
    }))
}

/// Build ingestion routes
pub fn ingest_routes() -> Router<AppState> {
    Router::new().route("/api/ingest", post(ingest_read))
}
