//! Detection event storage and the burst dedup rule
//!
//! The recognition engine emits bursts of near-duplicate reads for one
//! physical pass-by. Within a 1-second window per plate only the
//! highest-confidence read survives as a stored row; aggregate counters
//! on the plate are advanced separately by the gateway.

use crate::db::{ts, ts_opt};
use crate::models::DetectionEvent;
use crate::similarity::{plates_similar, SimilarityThresholds};
use crate::Result;
use chrono::{DateTime, Duration, Utc};
use sqlx::{SqliteConnection, SqlitePool};

/// Dedup window. Deliberately a fixed constant while most other
/// thresholds are settings; see DESIGN.md.
const DEDUP_WINDOW_SECONDS: i64 = 1;

/// What happened to an appended detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionOutcome {
    /// No recent event collided; a new row was created
    Inserted(i64),
    /// A colliding lower-confidence row was overwritten in place
    Replaced(i64),
    /// A colliding row with equal or higher confidence already exists
    Discarded,
}

/// Append a detection for a resolved plate, honoring the dedup rule.
///
/// Looks for an existing event on the same plate whose `detection_time`
/// falls in `(observed_at - 1s, observed_at]`. When found, a strictly
/// greater confidence overwrites that row's confidence and image paths
/// (same id, no new row); otherwise the read is discarded entirely.
///
/// Takes a connection so the gateway can run it inside its transaction.
#[allow(clippy::too_many_arguments)]
pub async fn add_detection(
    conn: &mut SqliteConnection,
    plate_id: i64,
    observed_at: DateTime<Utc>,
    real_timestamp: Option<DateTime<Utc>>,
    source_file: &str,
    confidence: f64,
    plate_image_path: Option<&str>,
    frame_image_path: Option<&str>,
) -> Result<DetectionOutcome> {
    let window_start = observed_at - Duration::seconds(DEDUP_WINDOW_SECONDS);

    let recent: Option<(i64, f64)> = sqlx::query_as(
        "SELECT id, confidence FROM plate_detections
         WHERE plate_id = ? AND detection_time > ? AND detection_time <= ?
         ORDER BY confidence DESC
         LIMIT 1",
    )
    .bind(plate_id)
    .bind(ts(window_start))
    .bind(ts(observed_at))
    .fetch_optional(&mut *conn)
    .await?;

    if let Some((existing_id, existing_confidence)) = recent {
        if confidence > existing_confidence {
            sqlx::query(
                "UPDATE plate_detections
                 SET confidence = ?, plate_image_path = ?, frame_image_path = ?
                 WHERE id = ?",
            )
            .bind(confidence)
            .bind(plate_image_path)
            .bind(frame_image_path)
            .bind(existing_id)
            .execute(&mut *conn)
            .await?;
            tracing::debug!(
                plate_id,
                existing_confidence,
                confidence,
                "Replaced burst detection with higher confidence read"
            );
            return Ok(DetectionOutcome::Replaced(existing_id));
        }
        tracing::debug!(
            plate_id,
            existing_confidence,
            confidence,
            "Discarded lower confidence burst detection"
        );
        return Ok(DetectionOutcome::Discarded);
    }

    let result = sqlx::query(
        "INSERT INTO plate_detections
            (plate_id, detection_time, real_timestamp, source_file, confidence,
             plate_image_path, frame_image_path)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(plate_id)
    .bind(ts(observed_at))
    .bind(ts_opt(real_timestamp))
    .bind(source_file)
    .bind(confidence)
    .bind(plate_image_path)
    .bind(frame_image_path)
    .execute(&mut *conn)
    .await?;

    Ok(DetectionOutcome::Inserted(result.last_insert_rowid()))
}

/// All stored detections for a set of plates, newest first per plate.
pub async fn detections_for_plates(
    db: &SqlitePool,
    plate_ids: &[i64],
) -> Result<Vec<DetectionEvent>> {
    if plate_ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; plate_ids.len()].join(",");
    let sql = format!(
        "SELECT * FROM plate_detections
         WHERE plate_id IN ({})
         ORDER BY plate_id, detection_time DESC",
        placeholders
    );

    let mut query = sqlx::query_as::<_, DetectionEvent>(&sql);
    for id in plate_ids {
        query = query.bind(id);
    }
    Ok(query.fetch_all(db).await?)
}

/// Merged detection history for one plate.
///
/// Pulls in detections of every predicate-similar plate (the history
/// merging call site of the similarity predicate) and deduplicates by
/// `(real_timestamp, source_file, plate)` keeping the highest-confidence
/// row per group.
pub async fn detection_history(
    db: &SqlitePool,
    plate_id: i64,
    thresholds: SimilarityThresholds,
) -> Result<Vec<DetectionEvent>> {
    let target: Option<(String,)> =
        sqlx::query_as("SELECT plate_text FROM plates WHERE id = ?")
            .bind(plate_id)
            .fetch_optional(db)
            .await?;
    let Some((target_text,)) = target else {
        return Ok(Vec::new());
    };

    let others: Vec<(i64, String)> =
        sqlx::query_as("SELECT id, plate_text FROM plates WHERE id != ?")
            .bind(plate_id)
            .fetch_all(db)
            .await?;

    let mut ids = vec![plate_id];
    ids.extend(
        others
            .into_iter()
            .filter(|(_, text)| plates_similar(&target_text, text, thresholds))
            .map(|(id, _)| id),
    );

    let placeholders = vec!["?"; ids.len()].join(",");
    let sql = format!(
        r#"
        WITH ranked AS (
            SELECT
                pd.*,
                ROW_NUMBER() OVER (
                    PARTITION BY pd.real_timestamp, pd.source_file, pd.plate_id
                    ORDER BY pd.confidence DESC
                ) AS row_num
            FROM plate_detections pd
            WHERE pd.plate_id IN ({})
        )
        SELECT id, plate_id, detection_time, real_timestamp, source_file,
               confidence, plate_image_path, frame_image_path
        FROM ranked
        WHERE row_num = 1
        ORDER BY detection_time DESC
        "#,
        placeholders
    );

    let mut query = sqlx::query_as::<_, DetectionEvent>(&sql);
    for id in &ids {
        query = query.bind(id);
    }
    Ok(query.fetch_all(db).await?)
}
