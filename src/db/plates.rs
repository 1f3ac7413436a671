//! Plate record storage operations

use crate::db::{ts, ts_opt};
use crate::models::{DangerLevel, PlateFilters, PlateRecord, PlateStats, PlateSummary};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::{SqliteExecutor, SqlitePool};

/// Lightweight row used during identity resolution.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlateCandidate {
    pub id: i64,
    pub plate_text: String,
    pub confidence: f64,
}

/// Fetch every stored plate's id, text and confidence for resolution.
pub async fn all_candidates(db: impl SqliteExecutor<'_>) -> Result<Vec<PlateCandidate>> {
    let rows = sqlx::query_as::<_, PlateCandidate>(
        "SELECT id, plate_text, confidence FROM plates ORDER BY id",
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Insert a newly resolved plate.
///
/// `blacklist_match` carries reason and danger level when the new text
/// already matched a watch entry at creation time.
pub async fn insert_plate(
    db: impl SqliteExecutor<'_>,
    plate_text: &str,
    confidence: f64,
    country_code: Option<&str>,
    observed_at: DateTime<Utc>,
    profile: Option<&str>,
    blacklist_match: Option<(&str, DangerLevel)>,
) -> Result<i64> {
    let (is_blacklisted, reason, danger_level) = match blacklist_match {
        Some((reason, level)) => (true, Some(reason.to_string()), Some(level)),
        None => (false, None, None),
    };

    let result = sqlx::query(
        r#"
        INSERT INTO plates
            (plate_text, confidence, country_code, first_appearance, last_appearance,
             profile, total_appearances, is_blacklisted, reason, danger_level)
        VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?, ?)
        "#,
    )
    .bind(plate_text)
    .bind(confidence)
    .bind(country_code)
    .bind(ts(observed_at))
    .bind(ts(observed_at))
    .bind(profile)
    .bind(is_blacklisted)
    .bind(reason)
    .bind(danger_level)
    .execute(db)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Record another resolved read against an existing plate.
///
/// `last_appearance` and `total_appearances` advance unconditionally;
/// `confidence` moves only when the new value is strictly greater.
pub async fn update_plate_appearance(
    db: impl SqliteExecutor<'_>,
    id: i64,
    observed_at: DateTime<Utc>,
    confidence: f64,
) -> Result<()> {
    sqlx::query(
        "UPDATE plates
         SET last_appearance = ?,
             total_appearances = total_appearances + 1,
             confidence = max(confidence, ?)
         WHERE id = ?",
    )
    .bind(ts(observed_at))
    .bind(confidence)
    .bind(id)
    .execute(db)
    .await?;

    Ok(())
}

pub async fn get_plate(db: impl SqliteExecutor<'_>, id: i64) -> Result<Option<PlateRecord>> {
    let row = sqlx::query_as::<_, PlateRecord>("SELECT * FROM plates WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn get_plate_required(db: impl SqliteExecutor<'_>, id: i64) -> Result<PlateRecord> {
    get_plate(db, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Plate {} not found", id)))
}

/// Fetch all plate records, newest appearance first.
pub async fn all_plates(db: &SqlitePool) -> Result<Vec<PlateRecord>> {
    let rows = sqlx::query_as::<_, PlateRecord>(
        "SELECT * FROM plates ORDER BY last_appearance DESC, id",
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Plate listing with operator filters, each row carrying the
/// highest-confidence image references from its detection history.
///
/// The `following_only` filter needs the tracking analyzer and is applied
/// by the caller on top of this result.
pub async fn list_plates(db: &SqlitePool, filters: &PlateFilters) -> Result<Vec<PlateSummary>> {
    let rows = sqlx::query_as::<_, PlateSummary>(
        r#"
        SELECT
            p.*,
            (SELECT plate_image_path FROM plate_detections
             WHERE plate_id = p.id ORDER BY confidence DESC LIMIT 1) AS plate_image_path,
            (SELECT frame_image_path FROM plate_detections
             WHERE plate_id = p.id ORDER BY confidence DESC LIMIT 1) AS frame_image_path,
            (SELECT confidence FROM plate_detections
             WHERE plate_id = p.id ORDER BY confidence DESC LIMIT 1) AS best_detection_confidence
        FROM plates p
        WHERE (?1 IS NULL OR p.profile = ?1)
          AND (?2 IS NULL OR p.last_appearance >= ?2)
          AND (?3 IS NULL OR p.last_appearance <= ?3)
          AND (?4 = 0 OR p.is_blacklisted = 1)
          AND (?5 = 0 OR EXISTS (
                SELECT 1 FROM similar_plates sp
                WHERE sp.plate_id1 = p.id OR sp.plate_id2 = p.id))
        ORDER BY p.last_appearance DESC, p.id
        "#,
    )
    .bind(filters.profile.as_deref())
    .bind(ts_opt(filters.from))
    .bind(ts_opt(filters.to))
    .bind(filters.blacklisted_only)
    .bind(filters.has_similar_only)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Overwrite a plate's blacklist flags.
pub async fn set_blacklist_status(
    db: &SqlitePool,
    id: i64,
    reason_and_level: Option<(&str, DangerLevel)>,
) -> Result<()> {
    let (is_blacklisted, reason, danger_level) = match reason_and_level {
        Some((reason, level)) => (true, Some(reason.to_string()), Some(level)),
        None => (false, None, None),
    };

    sqlx::query(
        "UPDATE plates SET is_blacklisted = ?, reason = ?, danger_level = ? WHERE id = ?",
    )
    .bind(is_blacklisted)
    .bind(reason)
    .bind(danger_level)
    .bind(id)
    .execute(db)
    .await?;
    Ok(())
}

/// Corpus summary counters for the reporting surface.
pub async fn plate_stats(db: &SqlitePool) -> Result<PlateStats> {
    let total_plates: i64 = sqlx::query_scalar("SELECT COUNT(id) FROM plates")
        .fetch_one(db)
        .await?;
    let blacklisted_count: i64 =
        sqlx::query_scalar("SELECT COUNT(id) FROM plates WHERE is_blacklisted = 1")
            .fetch_one(db)
            .await?;
    let avg_confidence: Option<f64> = sqlx::query_scalar("SELECT AVG(confidence) FROM plates")
        .fetch_one(db)
        .await?;
    let total_detections: i64 = sqlx::query_scalar("SELECT COUNT(id) FROM plate_detections")
        .fetch_one(db)
        .await?;
    let unique_countries: i64 = sqlx::query_scalar(
        "SELECT COUNT(DISTINCT country_code) FROM plates
         WHERE country_code IS NOT NULL AND country_code != ''",
    )
    .fetch_one(db)
    .await?;
    let similar_plates_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM similar_plates")
        .fetch_one(db)
        .await?;

    Ok(PlateStats {
        total_plates,
        blacklisted_count,
        avg_confidence: avg_confidence.unwrap_or(0.0),
        total_detections,
        unique_countries,
        similar_plates_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::setup_test_db;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 26, 10, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_fetch_plate() {
        let pool = setup_test_db().await;
        let id = insert_plate(&pool, "AB1234", 70.0, Some("LV"), t0(), Some("night"), None)
            .await
            .unwrap();

        let plate = get_plate_required(&pool, id).await.unwrap();
        assert_eq!(plate.plate_text, "AB1234");
        assert_eq!(plate.confidence, 70.0);
        assert_eq!(plate.total_appearances, 1);
        assert_eq!(plate.first_appearance, t0());
        assert_eq!(plate.last_appearance, t0());
        assert!(!plate.is_blacklisted);
    }

    #[tokio::test]
    async fn test_insert_with_blacklist_match() {
        let pool = setup_test_db().await;
        let id = insert_plate(
            &pool,
            "XX9999",
            80.0,
            None,
            t0(),
            None,
            Some(("stolen", DangerLevel::Critical)),
        )
        .await
        .unwrap();

        let plate = get_plate_required(&pool, id).await.unwrap();
        assert!(plate.is_blacklisted);
        assert_eq!(plate.reason.as_deref(), Some("stolen"));
        assert_eq!(plate.danger_level, Some(DangerLevel::Critical));
    }

    #[tokio::test]
    async fn test_appearance_update_monotonicity() {
        let pool = setup_test_db().await;
        let id = insert_plate(&pool, "AB1234", 70.0, None, t0(), None, None)
            .await
            .unwrap();

        let later = t0() + chrono::Duration::seconds(2);
        update_plate_appearance(&pool, id, later, 85.0).await.unwrap();
        let plate = get_plate_required(&pool, id).await.unwrap();
        assert_eq!(plate.confidence, 85.0);
        assert_eq!(plate.last_appearance, later);
        assert_eq!(plate.total_appearances, 2);

        // Lower confidence never decreases the stored value
        let even_later = t0() + chrono::Duration::seconds(4);
        update_plate_appearance(&pool, id, even_later, 60.0).await.unwrap();
        let plate = get_plate_required(&pool, id).await.unwrap();
        assert_eq!(plate.confidence, 85.0);
        assert_eq!(plate.last_appearance, even_later);
        assert_eq!(plate.total_appearances, 3);
    }

    #[tokio::test]
    async fn test_list_plates_filters() {
        let pool = setup_test_db().await;
        insert_plate(&pool, "AB1234", 70.0, None, t0(), Some("day"), None)
            .await
            .unwrap();
        insert_plate(
            &pool,
            "XX9999",
            80.0,
            None,
            t0() + chrono::Duration::hours(1),
            Some("night"),
            Some(("stolen", DangerLevel::High)),
        )
        .await
        .unwrap();

        let all = list_plates(&pool, &PlateFilters::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        // Newest last_appearance first
        assert_eq!(all[0].plate.plate_text, "XX9999");

        let filters = PlateFilters {
            profile: Some("day".to_string()),
            ..Default::default()
        };
        let day = list_plates(&pool, &filters).await.unwrap();
        assert_eq!(day.len(), 1);
        assert_eq!(day[0].plate.plate_text, "AB1234");

        let filters = PlateFilters {
            blacklisted_only: true,
            ..Default::default()
        };
        let listed = list_plates(&pool, &filters).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].plate.plate_text, "XX9999");

        let filters = PlateFilters {
            from: Some(t0() + chrono::Duration::minutes(30)),
            ..Default::default()
        };
        let recent = list_plates(&pool, &filters).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].plate.plate_text, "XX9999");
    }

    #[tokio::test]
    async fn test_plate_stats_counts() {
        let pool = setup_test_db().await;
        insert_plate(&pool, "AB1234", 70.0, Some("LV"), t0(), None, None)
            .await
            .unwrap();
        insert_plate(
            &pool,
            "XX9999",
            90.0,
            Some("EE"),
            t0(),
            None,
            Some(("stolen", DangerLevel::High)),
        )
        .await
        .unwrap();

        let stats = plate_stats(&pool).await.unwrap();
        assert_eq!(stats.total_plates, 2);
        assert_eq!(stats.blacklisted_count, 1);
        assert_eq!(stats.unique_countries, 2);
        assert_eq!(stats.avg_confidence, 80.0);
    }
}
