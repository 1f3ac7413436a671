//! Similar-pair cache storage
//!
//! These rows are derived output of the correlation pass. The table is
//! cleared and fully rebuilt on every run; nothing here is a source of
//! truth.

use crate::models::SimilarPair;
use crate::Result;
use sqlx::SqlitePool;

/// Drop all cached pairs ahead of a recompute.
pub async fn clear(db: &SqlitePool) -> Result<()> {
    sqlx::query("DELETE FROM similar_plates").execute(db).await?;
    Ok(())
}

pub async fn insert_pair(
    db: &SqlitePool,
    plate_id1: i64,
    plate_id2: i64,
    similarity_score: f64,
    time_diff_seconds: Option<i64>,
    detection_note: &str,
) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO similar_plates
            (plate_id1, plate_id2, similarity_score, time_diff_seconds, detection_note)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(plate_id1)
    .bind(plate_id2)
    .bind(similarity_score)
    .bind(time_diff_seconds)
    .bind(detection_note)
    .execute(db)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Cached pairs touching one plate, best match first.
pub async fn pairs_for_plate(db: &SqlitePool, plate_id: i64) -> Result<Vec<SimilarPair>> {
    let rows = sqlx::query_as::<_, SimilarPair>(
        "SELECT * FROM similar_plates
         WHERE plate_id1 = ? OR plate_id2 = ?
         ORDER BY similarity_score DESC",
    )
    .bind(plate_id)
    .bind(plate_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn all_pairs(db: &SqlitePool) -> Result<Vec<SimilarPair>> {
    let rows = sqlx::query_as::<_, SimilarPair>(
        "SELECT * FROM similar_plates ORDER BY similarity_score DESC",
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}
