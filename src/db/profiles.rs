//! Capture profile registry
//!
//! Named ingestion contexts (capture sessions) an operator can tag reads
//! with and filter listings by.

use crate::db::ts;
use crate::{Error, Result};
use chrono::Utc;
use sqlx::SqlitePool;

/// Register a new profile name.
pub async fn add_profile(db: &SqlitePool, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("Profile name cannot be empty".to_string()));
    }

    let result = sqlx::query(
        "INSERT OR IGNORE INTO profiles (profile_name, created_date) VALUES (?, ?)",
    )
    .bind(name)
    .bind(ts(Utc::now()))
    .execute(db)
    .await?;
    if result.rows_affected() == 0 {
        return Err(Error::InvalidInput(format!(
            "Profile '{}' already exists",
            name
        )));
    }

    tracing::info!(profile = name, "Profile registered");
    Ok(())
}

/// All registered profile names, alphabetical.
pub async fn list_profiles(db: &SqlitePool) -> Result<Vec<String>> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT profile_name FROM profiles ORDER BY profile_name")
            .fetch_all(db)
            .await?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}
