//! SQLite access layer
//!
//! All timestamps are stored as RFC3339 TEXT in a fixed-width format so
//! SQL string comparisons order the same way the timestamps do.

pub mod alerts;
pub mod blacklist;
pub mod detections;
pub mod plates;
pub mod profiles;
pub mod settings;
pub mod similar;

use crate::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
///
/// Connects to (creating if missing) the platewatch database and brings
/// the schema and default settings up.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Create tables and seed default settings if they don't exist.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS plates (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            plate_text TEXT NOT NULL,
            confidence REAL NOT NULL,
            country_code TEXT,
            first_appearance TEXT NOT NULL,
            last_appearance TEXT NOT NULL,
            profile TEXT,
            total_appearances INTEGER NOT NULL DEFAULT 1,
            is_blacklisted INTEGER NOT NULL DEFAULT 0,
            reason TEXT,
            danger_level TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS plate_detections (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            plate_id INTEGER NOT NULL REFERENCES plates(id),
            detection_time TEXT NOT NULL,
            real_timestamp TEXT,
            source_file TEXT NOT NULL,
            confidence REAL NOT NULL,
            plate_image_path TEXT,
            frame_image_path TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS blacklist (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            plate_text TEXT NOT NULL UNIQUE,
            reason TEXT NOT NULL DEFAULT '',
            danger_level TEXT NOT NULL DEFAULT 'HIGH',
            date_added TEXT NOT NULL,
            last_seen TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS similar_plates (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            plate_id1 INTEGER NOT NULL REFERENCES plates(id),
            plate_id2 INTEGER NOT NULL REFERENCES plates(id),
            similarity_score REAL NOT NULL,
            time_diff_seconds INTEGER,
            detection_note TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS blacklist_alerts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            plate_text TEXT NOT NULL,
            detection_time TEXT NOT NULL,
            image_path TEXT,
            processed INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            profile_name TEXT NOT NULL UNIQUE,
            created_date TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    settings::seed_defaults(pool).await?;

    tracing::info!("Database tables initialized");

    Ok(())
}

/// Wipe all stored data and restore default settings.
///
/// Every table is emptied in one transaction; the schema itself is kept
/// since it is defined in code.
pub async fn reset_database(pool: &SqlitePool) -> Result<()> {
    let mut tx = pool.begin().await?;
    for table in [
        "plate_detections",
        "similar_plates",
        "blacklist_alerts",
        "blacklist",
        "plates",
        "profiles",
        "settings",
    ] {
        sqlx::query(&format!("DELETE FROM {}", table))
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    settings::seed_defaults(pool).await?;
    tracing::warn!("Database reset: all data cleared");
    Ok(())
}

/// Format a timestamp for storage.
///
/// Fixed microsecond precision and a literal Z suffix keep the TEXT
/// column lexicographically ordered.
pub(crate) fn ts(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn ts_opt(t: Option<DateTime<Utc>>) -> Option<String> {
    t.map(ts)
}
