//! Typed operator settings
//!
//! Key/value rows in the settings table, fronted by a registry of
//! enumerated keys with types, ranges and defaults. Components read
//! current values at call time and never cache them beyond one operation.
//! Out-of-range writes are rejected at this boundary with the stored
//! value left untouched.

use crate::similarity::SimilarityThresholds;
use crate::{Error, Result};
use serde_json::Value;
use sqlx::SqlitePool;

/// Value shape of one registered setting.
#[derive(Debug, Clone, Copy)]
pub enum SettingKind {
    Integer { min: i64, max: i64 },
    Float { min: f64, max: f64 },
    Boolean,
}

/// One enumerated setting key.
#[derive(Debug, Clone, Copy)]
pub struct SettingSpec {
    pub name: &'static str,
    pub kind: SettingKind,
    pub default: &'static str,
}

/// The full registry of operator settings.
pub const SETTINGS: &[SettingSpec] = &[
    SettingSpec {
        name: "threads",
        kind: SettingKind::Integer { min: 1, max: 64 },
        default: "4",
    },
    SettingSpec {
        name: "min_confidence",
        kind: SettingKind::Float { min: 0.0, max: 100.0 },
        default: "50",
    },
    SettingSpec {
        name: "levenshtein_threshold",
        kind: SettingKind::Float { min: 0.0, max: 10.0 },
        default: "2",
    },
    SettingSpec {
        name: "similarity_ratio",
        kind: SettingKind::Float { min: 0.0, max: 1.0 },
        default: "0.8",
    },
    SettingSpec {
        name: "tracking_time_threshold",
        kind: SettingKind::Integer { min: 1, max: 86400 },
        default: "300",
    },
    SettingSpec {
        name: "min_tracking_detections",
        kind: SettingKind::Integer { min: 1, max: 1000 },
        default: "3",
    },
    SettingSpec {
        name: "auto_analyze_similar",
        kind: SettingKind::Boolean,
        default: "false",
    },
    SettingSpec {
        name: "alert_sound",
        kind: SettingKind::Boolean,
        default: "true",
    },
];

fn spec_for(name: &str) -> Result<&'static SettingSpec> {
    SETTINGS
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| Error::NotFound(format!("Unknown setting: {}", name)))
}

/// Insert registry defaults for any key not yet present.
pub(crate) async fn seed_defaults(pool: &SqlitePool) -> Result<()> {
    for spec in SETTINGS {
        sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
            .bind(spec.name)
            .bind(spec.default)
            .execute(pool)
            .await?;
    }
    Ok(())
}

/// Generic setting getter (internal)
async fn get_raw(db: &SqlitePool, key: &str) -> Result<Option<String>> {
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;
    Ok(row.map(|(v,)| v))
}

async fn get_parsed<T>(db: &SqlitePool, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
{
    match get_raw(db, key).await? {
        Some(raw) => raw.parse::<T>().map_err(|_| {
            Error::Config(format!("Stored setting '{}' has invalid value '{}'", key, raw))
        }),
        None => Ok(default),
    }
}

pub async fn get_threads(db: &SqlitePool) -> Result<i64> {
    get_parsed(db, "threads", 4).await
}

pub async fn get_min_confidence(db: &SqlitePool) -> Result<f64> {
    get_parsed(db, "min_confidence", 50.0).await
}

pub async fn get_tracking_time_threshold(db: &SqlitePool) -> Result<i64> {
    get_parsed(db, "tracking_time_threshold", 300).await
}

pub async fn get_min_tracking_detections(db: &SqlitePool) -> Result<i64> {
    get_parsed(db, "min_tracking_detections", 3).await
}

pub async fn get_auto_analyze_similar(db: &SqlitePool) -> Result<bool> {
    get_parsed(db, "auto_analyze_similar", false).await
}

pub async fn get_alert_sound(db: &SqlitePool) -> Result<bool> {
    get_parsed(db, "alert_sound", true).await
}

/// Current fuzzy-match thresholds (`levenshtein_threshold`,
/// `similarity_ratio`), read fresh for each operation.
pub async fn get_similarity_thresholds(db: &SqlitePool) -> Result<SimilarityThresholds> {
    Ok(SimilarityThresholds {
        distance: get_parsed(db, "levenshtein_threshold", 2.0).await?,
        ratio: get_parsed(db, "similarity_ratio", 0.8).await?,
    })
}

/// Read one setting as a typed JSON value for the query surface.
pub async fn get_setting_value(db: &SqlitePool, name: &str) -> Result<Value> {
    let spec = spec_for(name)?;
    let raw = get_raw(db, name)
        .await?
        .unwrap_or_else(|| spec.default.to_string());
    raw_to_value(spec, &raw)
}

/// Write one setting, validating type and range first.
///
/// A rejected write returns `Error::Config` and leaves the stored value
/// untouched.
pub async fn set_setting_value(db: &SqlitePool, name: &str, value: &Value) -> Result<()> {
    let spec = spec_for(name)?;
    let normalized = validate(spec, value)?;

    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(name)
    .bind(&normalized)
    .execute(db)
    .await?;

    tracing::info!(setting = name, value = %normalized, "Setting updated");
    Ok(())
}

fn raw_to_value(spec: &SettingSpec, raw: &str) -> Result<Value> {
    match spec.kind {
        SettingKind::Integer { .. } => raw
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| Error::Config(format!("Setting '{}' is not an integer", spec.name))),
        SettingKind::Float { .. } => raw
            .parse::<f64>()
            .map(Value::from)
            .map_err(|_| Error::Config(format!("Setting '{}' is not a number", spec.name))),
        SettingKind::Boolean => Ok(Value::from(raw.eq_ignore_ascii_case("true"))),
    }
}

fn validate(spec: &SettingSpec, value: &Value) -> Result<String> {
    match spec.kind {
        SettingKind::Integer { min, max } => {
            let n = value.as_i64().ok_or_else(|| {
                Error::Config(format!("Setting '{}' requires an integer", spec.name))
            })?;
            if n < min || n > max {
                return Err(Error::Config(format!(
                    "Setting '{}' out of range: {} not in {}..={}",
                    spec.name, n, min, max
                )));
            }
            Ok(n.to_string())
        }
        SettingKind::Float { min, max } => {
            let n = value.as_f64().ok_or_else(|| {
                Error::Config(format!("Setting '{}' requires a number", spec.name))
            })?;
            if !n.is_finite() || n < min || n > max {
                return Err(Error::Config(format!(
                    "Setting '{}' out of range: {} not in {}..={}",
                    spec.name, n, min, max
                )));
            }
            Ok(n.to_string())
        }
        SettingKind::Boolean => {
            let b = value.as_bool().ok_or_else(|| {
                Error::Config(format!("Setting '{}' requires a boolean", spec.name))
            })?;
            Ok(b.to_string())
        }
    }
}
