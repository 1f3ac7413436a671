//! HTTP API integration tests
//!
//! Exercises the full router over an in-memory database.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use platewatch::{build_router, AppState};

/// Create test app state with in-memory database
async fn test_app_state() -> AppState {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .unwrap();
    platewatch::db::init_tables(&pool).await.unwrap();
    AppState::new(pool)
}

fn ingest_body(plate_text: &str, confidence: f64, observed_at: &str) -> Body {
    Body::from(
        json!({
            "plate_text": plate_text,
            "confidence": confidence,
            "country_code": "LV",
            "source_timestamp": null,
            "observed_at": observed_at,
            "profile": "test",
            "source_file": "00000006_20250226102711_NF.mp4",
            "plate_image_path": null,
            "frame_image_path": null
        })
        .to_string(),
    )
}

fn post_json(uri: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_router(test_app_state().await);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "platewatch");
}

#[tokio::test]
async fn test_ingest_then_list_plates() {
    let state = test_app_state().await;

    let response = build_router(state.clone())
        .oneshot(post_json(
            "/api/ingest",
            ingest_body("AB1234", 70.0, "2025-02-26T10:00:00Z"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["accepted"], true);
    assert_eq!(body["plate"]["plate_text"], "AB1234");

    let response = build_router(state)
        .oneshot(Request::builder().uri("/api/plates").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let plates = body_json(response).await;
    assert_eq!(plates.as_array().unwrap().len(), 1);
    assert_eq!(plates[0]["plate_text"], "AB1234");
    assert_eq!(plates[0]["total_appearances"], 1);
}

#[tokio::test]
async fn test_ingest_rejects_low_confidence() {
    let state = test_app_state().await;

    let response = build_router(state)
        .oneshot(post_json(
            "/api/ingest",
            ingest_body("AB1234", 20.0, "2025-02-26T10:00:00Z"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["accepted"], false);
}

#[tokio::test]
async fn test_plate_detail_and_404() {
    let state = test_app_state().await;

    build_router(state.clone())
        .oneshot(post_json(
            "/api/ingest",
            ingest_body("AB1234", 70.0, "2025-02-26T10:00:00Z"),
        ))
        .await
        .unwrap();

    let response = build_router(state.clone())
        .oneshot(Request::builder().uri("/api/plates/1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["plate_text"], "AB1234");

    let response = build_router(state)
        .oneshot(Request::builder().uri("/api/plates/999").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_plate_detections_merges_similar_history() {
    let state = test_app_state().await;

    // Two similar reads resolve to one record with two detections
    for (text, at) in [
        ("AB1234", "2025-02-26T10:00:00Z"),
        ("AB1235", "2025-02-26T10:00:10Z"),
    ] {
        build_router(state.clone())
            .oneshot(post_json("/api/ingest", ingest_body(text, 70.0, at)))
            .await
            .unwrap();
    }

    let response = build_router(state)
        .oneshot(
            Request::builder()
                .uri("/api/plates/1/detections")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let history = body_json(response).await;
    assert_eq!(history.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_blacklist_crud_marks_plates() {
    let state = test_app_state().await;

    build_router(state.clone())
        .oneshot(post_json(
            "/api/ingest",
            ingest_body("AB1234", 70.0, "2025-02-26T10:00:00Z"),
        ))
        .await
        .unwrap();

    // Add a fuzzy-matching entry
    let response = build_router(state.clone())
        .oneshot(post_json(
            "/api/blacklist",
            Body::from(
                json!({
                    "plate_text": "ab1235",
                    "reason": "stolen",
                    "danger_level": "CRITICAL"
                })
                .to_string(),
            ),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let entry = body_json(response).await;
    assert_eq!(entry["plate_text"], "AB1235");
    assert_eq!(entry["danger_level"], "CRITICAL");

    let response = build_router(state.clone())
        .oneshot(Request::builder().uri("/api/plates/1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let plate = body_json(response).await;
    assert_eq!(plate["is_blacklisted"], true);
    assert_eq!(plate["reason"], "stolen");

    // Remove it; the plate reverts
    let response = build_router(state.clone())
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/blacklist/AB1235")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = build_router(state)
        .oneshot(Request::builder().uri("/api/plates/1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let plate = body_json(response).await;
    assert_eq!(plate["is_blacklisted"], false);
}

#[tokio::test]
async fn test_blacklist_edit_serialized_behind_write_lock() {
    // While an ingest (or batch scan) holds the global write lock, a
    // blacklist edit must queue behind it instead of interleaving its
    // corpus-wide recompute.
    let state = test_app_state().await;
    let guard = state.write_lock.clone().lock_owned().await;

    let app = build_router(state.clone());
    let pending = tokio::spawn(async move {
        app.oneshot(post_json(
            "/api/blacklist",
            Body::from(
                json!({
                    "plate_text": "AB1234",
                    "reason": "stolen",
                    "danger_level": "HIGH"
                })
                .to_string(),
            ),
        ))
        .await
        .unwrap()
    });

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert!(!pending.is_finished(), "edit should block on the write lock");

    drop(guard);
    let response = pending.await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_blacklist_removal_serialized_behind_write_lock() {
    let state = test_app_state().await;
    build_router(state.clone())
        .oneshot(post_json(
            "/api/blacklist",
            Body::from(
                json!({
                    "plate_text": "AB1234",
                    "reason": "stolen",
                    "danger_level": "HIGH"
                })
                .to_string(),
            ),
        ))
        .await
        .unwrap();

    let guard = state.write_lock.clone().lock_owned().await;
    let app = build_router(state.clone());
    let pending = tokio::spawn(async move {
        app.oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/blacklist/AB1234")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
    });

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert!(!pending.is_finished(), "removal should block on the write lock");

    drop(guard);
    let response = pending.await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_blacklist_rejects_blank_text() {
    let state = test_app_state().await;

    let response = build_router(state)
        .oneshot(post_json(
            "/api/blacklist",
            Body::from(
                json!({
                    "plate_text": "   ",
                    "reason": "x",
                    "danger_level": "LOW"
                })
                .to_string(),
            ),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_similar_analysis_endpoint() {
    let state = test_app_state().await;

    // Two records similar in text but created as separate plates
    let now = chrono::Utc::now();
    platewatch::db::plates::insert_plate(&state.db, "AB1234", 70.0, None, now, None, None)
        .await
        .unwrap();
    platewatch::db::plates::insert_plate(&state.db, "AB1235", 90.0, None, now, None, None)
        .await
        .unwrap();

    let response = build_router(state.clone())
        .oneshot(post_json("/api/analysis/similar", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let pairs = body_json(response).await;
    assert_eq!(pairs.as_array().unwrap().len(), 1);

    // Cached pairs visible per plate
    let response = build_router(state)
        .oneshot(
            Request::builder()
                .uri("/api/plates/1/similar")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let pairs = body_json(response).await;
    assert_eq!(pairs.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_cancel_without_running_analysis_is_404() {
    let state = test_app_state().await;

    let response = build_router(state)
        .oneshot(post_json("/api/analysis/similar/cancel", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tracking_analysis_endpoint() {
    let state = test_app_state().await;

    // Four reads spaced under the 300s default threshold
    for (i, at) in [
        "2025-02-26T10:00:00Z",
        "2025-02-26T10:00:30Z",
        "2025-02-26T10:01:15Z",
        "2025-02-26T10:02:15Z",
    ]
    .iter()
    .enumerate()
    {
        let body = json!({
            "plate_text": "AB1234",
            "confidence": 70.0 + i as f64,
            "country_code": null,
            "source_timestamp": at,
            "observed_at": at,
            "profile": null,
            "source_file": "cam.mp4",
            "plate_image_path": null,
            "frame_image_path": null
        });
        build_router(state.clone())
            .oneshot(post_json("/api/ingest", Body::from(body.to_string())))
            .await
            .unwrap();
    }

    let response = build_router(state)
        .oneshot(post_json("/api/analysis/tracking", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let hits = body_json(response).await;
    assert_eq!(hits.as_array().unwrap().len(), 1);
    assert_eq!(hits[0]["plate"]["plate_text"], "AB1234");
    assert!(hits[0]["reason"].as_str().unwrap().contains("average interval"));
}

#[tokio::test]
async fn test_settings_get_put_and_validation() {
    let state = test_app_state().await;

    let response = build_router(state.clone())
        .oneshot(
            Request::builder()
                .uri("/api/settings/min_confidence")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["value"], json!(50.0));

    let response = build_router(state.clone())
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/settings/min_confidence")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "value": 75.0 }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Out of range: rejected, prior value kept
    let response = build_router(state.clone())
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/settings/min_confidence")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "value": 500.0 }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = build_router(state.clone())
        .oneshot(
            Request::builder()
                .uri("/api/settings/min_confidence")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["value"], json!(75.0));

    // Unknown key
    let response = build_router(state)
        .oneshot(
            Request::builder()
                .uri("/api/settings/warp_factor")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_blacklisted_sighting_queues_alert() {
    let state = test_app_state().await;

    build_router(state.clone())
        .oneshot(post_json(
            "/api/blacklist",
            Body::from(
                json!({
                    "plate_text": "AB1234",
                    "reason": "stolen",
                    "danger_level": "HIGH"
                })
                .to_string(),
            ),
        ))
        .await
        .unwrap();

    build_router(state.clone())
        .oneshot(post_json(
            "/api/ingest",
            ingest_body("AB1234", 70.0, "2025-02-26T10:00:00Z"),
        ))
        .await
        .unwrap();

    let response = build_router(state.clone())
        .oneshot(Request::builder().uri("/api/alerts").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let alerts = body_json(response).await;
    assert_eq!(alerts.as_array().unwrap().len(), 1);
    assert_eq!(alerts[0]["plate_text"], "AB1234");
    assert_eq!(alerts[0]["processed"], false);

    // Acknowledged alerts leave the queue
    let id = alerts[0]["id"].as_i64().unwrap();
    let response = build_router(state.clone())
        .oneshot(post_json(&format!("/api/alerts/{}/ack", id), Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["acknowledged"], id);

    let response = build_router(state)
        .oneshot(Request::builder().uri("/api/alerts").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let alerts = body_json(response).await;
    assert!(alerts.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_ack_unknown_alert_is_404() {
    let state = test_app_state().await;

    let response = build_router(state)
        .oneshot(post_json("/api/alerts/999/ack", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profile_registry_endpoints() {
    let state = test_app_state().await;

    let response = build_router(state.clone())
        .oneshot(Request::builder().uri("/api/profiles").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await.as_array().unwrap().is_empty());

    let response = build_router(state.clone())
        .oneshot(post_json(
            "/api/profiles",
            Body::from(json!({ "name": "day" }).to_string()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let names = body_json(response).await;
    assert_eq!(names, json!(["day"]));

    // Duplicate names are rejected
    let response = build_router(state)
        .oneshot(post_json(
            "/api/profiles",
            Body::from(json!({ "name": "day" }).to_string()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_database_reset_endpoint() {
    let state = test_app_state().await;

    build_router(state.clone())
        .oneshot(post_json(
            "/api/ingest",
            ingest_body("AB1234", 70.0, "2025-02-26T10:00:00Z"),
        ))
        .await
        .unwrap();

    let response = build_router(state.clone())
        .oneshot(post_json("/api/database/reset", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["reset"], true);

    let response = build_router(state)
        .oneshot(Request::builder().uri("/api/plates").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(body_json(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_stats_endpoint() {
    let state = test_app_state().await;

    build_router(state.clone())
        .oneshot(post_json(
            "/api/ingest",
            ingest_body("AB1234", 70.0, "2025-02-26T10:00:00Z"),
        ))
        .await
        .unwrap();

    let response = build_router(state)
        .oneshot(Request::builder().uri("/api/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total_plates"], 1);
    assert_eq!(body["total_detections"], 1);
}
