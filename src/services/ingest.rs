//! Ingestion gateway
//!
//! Concurrency-safe entry point the video workers call once per observed
//! OCR read. Resolves the read to a canonical plate, applies the burst
//! dedup rule, updates aggregates and propagates blacklist sightings.
//!
//! Every call runs under a global async write lock: concurrent reads of
//! the same physical plate must not both create records or lose counter
//! updates, and correlation/blacklist batch jobs must never observe a
//! half-updated record.

use crate::db::{alerts, blacklist, detections, plates, settings};
use crate::models::{ObservedRead, PlateRecord};
use crate::similarity::plates_similar;
use crate::source_time::extract_timestamp_from_filename;
use crate::Result;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Gateway shared by all recognition workers.
#[derive(Clone)]
pub struct IngestGateway {
    db: SqlitePool,
    write_lock: Arc<Mutex<()>>,
}

impl IngestGateway {
    pub fn new(db: SqlitePool, write_lock: Arc<Mutex<()>>) -> Self {
        Self { db, write_lock }
    }

    /// Ingest one raw read.
    ///
    /// Returns the resolved plate record, or `None` when the read was
    /// dropped locally (blank text, below the `min_confidence` floor).
    /// The resolve-to-persist sequence runs in one transaction: a storage
    /// failure rolls the whole read back, fails this single call only,
    /// and callers keep their stream going.
    pub async fn ingest(&self, read: &ObservedRead) -> Result<Option<PlateRecord>> {
        let plate_text = read.plate_text.trim().to_uppercase();
        if plate_text.is_empty() {
            tracing::debug!(source_file = %read.source_file, "Dropping read with blank plate text");
            return Ok(None);
        }

        let min_confidence = settings::get_min_confidence(&self.db).await?;
        if read.confidence < min_confidence {
            tracing::debug!(
                plate_text = %plate_text,
                confidence = read.confidence,
                min_confidence,
                "Dropping read below confidence floor"
            );
            return Ok(None);
        }

        // Serializes resolve -> write -> dedup against all other ingests
        // and against the batch scans.
        let _guard = self.write_lock.lock().await;

        let thresholds = settings::get_similarity_thresholds(&self.db).await?;

        let mut tx = self.db.begin().await?;

        // Identity resolution: best-confidence similar plate wins,
        // tie broken by lowest id.
        let candidates = plates::all_candidates(&mut *tx).await?;
        let target = candidates
            .iter()
            .filter(|c| plates_similar(&plate_text, &c.plate_text, thresholds))
            .max_by(|a, b| {
                a.confidence
                    .total_cmp(&b.confidence)
                    .then_with(|| b.id.cmp(&a.id))
            });

        let plate_id = match target {
            Some(candidate) => {
                plates::update_plate_appearance(
                    &mut *tx,
                    candidate.id,
                    read.observed_at,
                    read.confidence,
                )
                .await?;
                tracing::debug!(
                    plate_text = %plate_text,
                    resolved_to = %candidate.plate_text,
                    plate_id = candidate.id,
                    "Read resolved to existing plate"
                );
                candidate.id
            }
            None => {
                // First match against the watch list wins; storage order,
                // no further guarantee.
                let entries = blacklist::list_blacklist(&mut *tx).await?;
                let matched = entries
                    .iter()
                    .find(|entry| plates_similar(&plate_text, &entry.plate_text, thresholds));
                if let Some(entry) = matched {
                    tracing::info!(
                        plate_text = %plate_text,
                        entry = %entry.plate_text,
                        "New plate matched blacklist entry"
                    );
                }

                let id = plates::insert_plate(
                    &mut *tx,
                    &plate_text,
                    read.confidence,
                    read.country_code.as_deref(),
                    read.observed_at,
                    read.profile.as_deref(),
                    matched.map(|e| (e.reason.as_str(), e.danger_level)),
                )
                .await?;
                tracing::debug!(plate_text = %plate_text, plate_id = id, "New plate recorded");
                id
            }
        };

        // Capture time: engine timestamp when present, else recovered
        // from the source filename.
        let real_timestamp = read
            .source_timestamp
            .or_else(|| extract_timestamp_from_filename(&read.source_file));

        detections::add_detection(
            &mut tx,
            plate_id,
            read.observed_at,
            real_timestamp,
            &read.source_file,
            read.confidence,
            read.plate_image_path.as_deref(),
            read.frame_image_path.as_deref(),
        )
        .await?;

        let plate = plates::get_plate_required(&mut *tx, plate_id).await?;
        if plate.is_blacklisted {
            let seen_at = real_timestamp.unwrap_or(read.observed_at);
            blacklist::advance_last_seen(&mut tx, &plate.plate_text, seen_at, thresholds)
                .await?;
            alerts::add_alert(
                &mut tx,
                &plate.plate_text,
                seen_at,
                read.frame_image_path.as_deref(),
            )
            .await?;
        }

        tx.commit().await?;

        Ok(Some(plate))
    }
}
