//! Blacklist alert queue
//!
//! Each sighting of a blacklisted plate enqueues one alert row. The UI
//! drains unprocessed alerts (driving the `alert_sound` chime) and acks
//! them individually; processed alerts stay as an audit trail.

use crate::db::ts;
use crate::models::BlacklistAlert;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use sqlx::SqlitePool;

/// Enqueue an alert for a blacklisted plate sighting.
pub async fn add_alert(
    conn: &mut SqliteConnection,
    plate_text: &str,
    detection_time: DateTime<Utc>,
    image_path: Option<&str>,
) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO blacklist_alerts (plate_text, detection_time, image_path, processed)
         VALUES (?, ?, ?, 0)",
    )
    .bind(plate_text)
    .bind(ts(detection_time))
    .bind(image_path)
    .execute(&mut *conn)
    .await?;
    Ok(result.last_insert_rowid())
}

/// All alerts not yet acknowledged, newest sighting first.
pub async fn unprocessed_alerts(db: &SqlitePool) -> Result<Vec<BlacklistAlert>> {
    let rows = sqlx::query_as::<_, BlacklistAlert>(
        "SELECT * FROM blacklist_alerts WHERE processed = 0 ORDER BY detection_time DESC",
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Acknowledge one alert.
pub async fn mark_processed(db: &SqlitePool, alert_id: i64) -> Result<()> {
    let result = sqlx::query("UPDATE blacklist_alerts SET processed = 1 WHERE id = ?")
        .bind(alert_id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Alert {} not found", alert_id)));
    }
    Ok(())
}
