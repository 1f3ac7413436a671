//! Settings API endpoints
//!
//! Typed key/value settings over the enumerated registry. Unknown keys
//! are 404, type or range violations are 400 with the stored value left
//! untouched.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{ApiResult, AppState};

/// Request payload for updating one setting
#[derive(Debug, Deserialize)]
pub struct SetSettingRequest {
    pub value: Value,
}

/// GET /api/settings
pub async fn list_settings(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let mut out = serde_json::Map::new();
    for spec in crate::db::settings::SETTINGS {
        let value = crate::db::settings::get_setting_value(&state.db, spec.name).await?;
        out.insert(spec.name.to_string(), value);
    }
    Ok(Json(Value::Object(out)))
}

/// GET /api/settings/:name
pub async fn get_setting(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Value>> {
    let value = crate::db::settings::get_setting_value(&state.db, &name).await?;
    Ok(Json(serde_json::json!({ "name": name, "value": value })))
}

/// PUT /api/settings/:name
pub async fn set_setting(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(payload): Json<SetSettingRequest>,
) -> ApiResult<Json<Value>> {
    crate::db::settings::set_setting_value(&state.db, &name, &payload.value).await?;
    let value = crate::db::settings::get_setting_value(&state.db, &name).await?;
    Ok(Json(serde_json::json!({ "name": name, "value": value })))
}

/// Build settings routes
pub fn settings_routes() -> Router<AppState> {
    Router::new()
        .route("/api/settings", get(list_settings))
        .route("/api/settings/:name", get(get_setting).put(set_setting))
}
