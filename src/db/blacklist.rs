//! Blacklist storage and status propagation
//!
//! Every edit recomputes blacklist status across the whole plate corpus
//! through the similarity predicate, so `is_blacklisted` on a plate is
//! always equivalent to "some currently stored entry matches its text".

use crate::db::ts;
use crate::models::{BlacklistEntry, DangerLevel};
use crate::similarity::{plates_similar, SimilarityThresholds};
use crate::Result;
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};

pub async fn list_blacklist(db: impl SqliteExecutor<'_>) -> Result<Vec<BlacklistEntry>> {
    let rows = sqlx::query_as::<_, BlacklistEntry>(
        "SELECT * FROM blacklist ORDER BY plate_text",
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn get_entry(db: &SqlitePool, plate_text: &str) -> Result<Option<BlacklistEntry>> {
    let row = sqlx::query_as::<_, BlacklistEntry>(
        "SELECT * FROM blacklist WHERE plate_text = ?",
    )
    .bind(plate_text)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Upsert a watch entry, preserving the original `date_added`, then
/// recompute status for every plate whose text matches the entry.
pub async fn add_or_update(
    db: &SqlitePool,
    plate_text: &str,
    reason: &str,
    danger_level: DangerLevel,
    thresholds: SimilarityThresholds,
) -> Result<()> {
    let now = ts(Utc::now());
    sqlx::query(
        r#"
        INSERT INTO blacklist (plate_text, reason, danger_level, date_added, last_seen)
        VALUES (?1, ?2, ?3, ?4, NULL)
        ON CONFLICT(plate_text) DO UPDATE SET
            reason = excluded.reason,
            danger_level = excluded.danger_level
        "#,
    )
    .bind(plate_text)
    .bind(reason)
    .bind(danger_level)
    .bind(&now)
    .execute(db)
    .await?;

    tracing::info!(plate_text, reason, danger_level = %danger_level, "Blacklist entry added/updated");
    recompute_matching_plates(db, plate_text, thresholds).await
}

/// Delete a watch entry and recompute every plate that matched it.
///
/// A plate stays blacklisted only if some *other* remaining entry still
/// matches its text.
pub async fn remove(db: &SqlitePool, plate_text: &str, thresholds: SimilarityThresholds) -> Result<()> {
    sqlx::query("DELETE FROM blacklist WHERE plate_text = ?")
        .bind(plate_text)
        .execute(db)
        .await?;

    tracing::info!(plate_text, "Blacklist entry removed");
    recompute_matching_plates(db, plate_text, thresholds).await
}

/// Recompute `is_blacklisted`/`reason`/`danger_level` for every plate
/// whose text is similar to `edited_text`, checking each such plate
/// against all currently stored entries (first match wins).
async fn recompute_matching_plates(
    db: &SqlitePool,
    edited_text: &str,
    thresholds: SimilarityThresholds,
) -> Result<()> {
    let entries = list_blacklist(db).await?;
    let plates: Vec<(i64, String)> = sqlx::query_as("SELECT id, plate_text FROM plates")
        .fetch_all(db)
        .await?;

    for (plate_id, text) in plates {
        if !plates_similar(&text, edited_text, thresholds) {
            continue;
        }

        let matched = entries
            .iter()
            .find(|entry| plates_similar(&text, &entry.plate_text, thresholds));

        let status = matched.map(|entry| (entry.reason.as_str(), entry.danger_level));
        crate::db::plates::set_blacklist_status(db, plate_id, status).await?;
        tracing::debug!(
            plate_id,
            plate_text = %text,
            blacklisted = matched.is_some(),
            "Recomputed blacklist status"
        );
    }
    Ok(())
}

/// Advance `last_seen` on every entry matching a just-detected plate.
///
/// Moves only forward: entries whose stored value is already later are
/// left alone. Takes a connection so the gateway can run it inside its
/// transaction.
pub async fn advance_last_seen(
    conn: &mut SqliteConnection,
    plate_text: &str,
    seen_at: DateTime<Utc>,
    thresholds: SimilarityThresholds,
) -> Result<()> {
    let entries = list_blacklist(&mut *conn).await?;
    let seen = ts(seen_at);
    for entry in entries {
        if plates_similar(plate_text, &entry.plate_text, thresholds) {
            sqlx::query(
                "UPDATE blacklist SET last_seen = ?
                 WHERE id = ? AND (last_seen IS NULL OR last_seen < ?)",
            )
            .bind(&seen)
            .bind(entry.id)
            .bind(&seen)
            .execute(&mut *conn)
            .await?;
        }
    }
    Ok(())
}
