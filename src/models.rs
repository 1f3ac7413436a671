//! Entity types backing the relational store
//!
//! One struct per table. The identity store owns the lifecycles of
//! `PlateRecord`, `DetectionEvent` and `BlacklistEntry`; `SimilarPair`
//! rows are a derived cache rebuilt by each correlation pass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Blacklist danger classification, ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum DangerLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for DangerLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DangerLevel::Low => "LOW",
            DangerLevel::Medium => "MEDIUM",
            DangerLevel::High => "HIGH",
            DangerLevel::Critical => "CRITICAL",
        };
        write!(f, "{}", s)
    }
}

/// Canonical belief about one physical plate.
///
/// `confidence` only ever increases, `last_appearance` only advances, and
/// `total_appearances` counts resolved reads (not stored detection rows,
/// which the dedup rule may collapse).
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct PlateRecord {
    pub id: i64,
    pub plate_text: String,
    /// Best confidence ever observed for this plate (0-100)
    pub confidence: f64,
    pub country_code: Option<String>,
    pub first_appearance: DateTime<Utc>,
    pub last_appearance: DateTime<Utc>,
    /// Ingestion context tag (which capture session produced the plate)
    pub profile: Option<String>,
    pub total_appearances: i64,
    pub is_blacklisted: bool,
    pub reason: Option<String>,
    pub danger_level: Option<DangerLevel>,
}

/// One stored observation tied to a plate record.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct DetectionEvent {
    pub id: i64,
    pub plate_id: i64,
    /// Ingestion-side timestamp
    pub detection_time: DateTime<Utc>,
    /// Capture timestamp recovered from the source media naming, if any
    pub real_timestamp: Option<DateTime<Utc>>,
    pub source_file: String,
    pub confidence: f64,
    pub plate_image_path: Option<String>,
    pub frame_image_path: Option<String>,
}

/// A plate pattern under watch.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct BlacklistEntry {
    pub id: i64,
    pub plate_text: String,
    pub reason: String,
    pub danger_level: DangerLevel,
    /// Immutable once set; preserved across upserts
    pub date_added: DateTime<Utc>,
    /// Advances only forward as the plate keeps being detected
    pub last_seen: Option<DateTime<Utc>>,
}

/// One queued sighting of a blacklisted plate, awaiting operator
/// acknowledgement.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct BlacklistAlert {
    pub id: i64,
    pub plate_text: String,
    pub detection_time: DateTime<Utc>,
    pub image_path: Option<String>,
    pub processed: bool,
}

/// Cached output row of the correlation pass.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct SimilarPair {
    pub id: i64,
    pub plate_id1: i64,
    pub plate_id2: i64,
    /// Normalized similarity ratio (0-1)
    pub similarity_score: f64,
    /// Absolute gap between the two plates' first appearances
    pub time_diff_seconds: Option<i64>,
    /// Human-readable confidence comparison
    pub detection_note: String,
}

/// Plate summary row for listings: the plate plus its best-known images.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PlateSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub plate: PlateRecord,
    pub plate_image_path: Option<String>,
    pub frame_image_path: Option<String>,
    pub best_detection_confidence: Option<f64>,
}

/// Filters accepted by the plate listing surface.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlateFilters {
    pub profile: Option<String>,
    /// Lower bound on last_appearance
    pub from: Option<DateTime<Utc>>,
    /// Upper bound on last_appearance
    pub to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub blacklisted_only: bool,
    #[serde(default)]
    pub following_only: bool,
    #[serde(default)]
    pub has_similar_only: bool,
}

/// One raw OCR read as delivered by a recognition worker.
///
/// `source_timestamp` is the engine's own clock when it exposes one; when
/// absent the gateway recovers the capture time from `source_file`.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservedRead {
    pub plate_text: String,
    /// Recognition confidence (0-100)
    pub confidence: f64,
    pub country_code: Option<String>,
    pub source_timestamp: Option<DateTime<Utc>>,
    pub observed_at: DateTime<Utc>,
    pub profile: Option<String>,
    pub source_file: String,
    pub plate_image_path: Option<String>,
    pub frame_image_path: Option<String>,
}

/// Corpus summary counters for the reporting surface.
#[derive(Debug, Clone, Serialize)]
pub struct PlateStats {
    pub total_plates: i64,
    pub blacklisted_count: i64,
    pub avg_confidence: f64,
    pub total_detections: i64,
    pub unique_countries: i64,
    pub similar_plates_count: i64,
}
