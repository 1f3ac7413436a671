//! Tracking scan across all eligible plates
//!
//! Applies the camera-following analyzer to every plate with enough
//! resolved appearances, preferring the capture timestamp recovered from
//! the source media over the ingestion-side clock.

use crate::db::{detections, plates, settings};
use crate::models::{DetectionEvent, PlateRecord};
use crate::tracking::analyze_follow;
use crate::Result;
use sqlx::SqlitePool;
use std::collections::HashMap;

const MIN_INTERVAL_SECONDS: i64 = 2;

/// One plate flagged as potentially following the camera.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FollowHit {
    pub plate: PlateRecord,
    pub reason: String,
    pub detections: Vec<DetectionEvent>,
}

/// Scan every eligible plate for a following pattern.
pub async fn run_tracking_scan(db: &SqlitePool) -> Result<Vec<FollowHit>> {
    let threshold_seconds = settings::get_tracking_time_threshold(db).await?;
    let min_detections = settings::get_min_tracking_detections(db).await?;

    let eligible: Vec<PlateRecord> = plates::all_plates(db)
        .await?
        .into_iter()
        .filter(|p| p.total_appearances >= min_detections)
        .collect();

    let ids: Vec<i64> = eligible.iter().map(|p| p.id).collect();
    let mut by_plate: HashMap<i64, Vec<DetectionEvent>> = HashMap::new();
    for detection in detections::detections_for_plates(db, &ids).await? {
        by_plate.entry(detection.plate_id).or_default().push(detection);
    }

    let mut hits = Vec::new();
    for plate in eligible {
        let Some(plate_detections) = by_plate.remove(&plate.id) else {
            continue;
        };
        if (plate_detections.len() as i64) < min_detections {
            continue;
        }

        let times: Vec<_> = plate_detections
            .iter()
            .map(|d| d.real_timestamp.unwrap_or(d.detection_time))
            .collect();

        let verdict = analyze_follow(&times, threshold_seconds, MIN_INTERVAL_SECONDS);
        if verdict.is_following {
            tracing::info!(
                plate_text = %plate.plate_text,
                reason = %verdict.reason,
                "Plate flagged as potentially following"
            );
            hits.push(FollowHit {
                plate,
                reason: verdict.reason,
                detections: plate_detections,
            });
        }
    }

    Ok(hits)
}
