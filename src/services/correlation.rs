//! Batch similar-plate correlation pass
//!
//! On-demand O(n^2) maintenance job surfacing fuzzy-duplicate plate
//! records the identity resolver did not merge. Rebuilds the
//! similar_plates cache from scratch each run; a cancelled or failed run
//! aborts the whole batch rather than leaving partial results that could
//! be mistaken for "no matches".

use crate::db::{plates, settings, similar};
use crate::models::{PlateRecord, SimilarPair};
use crate::similarity::{plate_distance, plate_ratio, plates_similar, SimilarityThresholds};
use crate::{Error, Result};
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;

/// Confidence gap (percentage points) beyond which one side of a pair is
/// called out as the more trustworthy read.
const CONFIDENCE_GAP_NOTEWORTHY: f64 = 15.0;

/// Run the correlation pass over the full plate corpus.
///
/// `thresholds` overrides the stored settings for a one-off run when
/// supplied. The token is checked every outer iteration; cancellation
/// surfaces as `Error::Cancelled` with the cache already cleared.
pub async fn analyze_similar_plates(
    db: &SqlitePool,
    thresholds: Option<SimilarityThresholds>,
    cancel: &CancellationToken,
) -> Result<Vec<SimilarPair>> {
    let thresholds = match thresholds {
        Some(t) => t,
        None => settings::get_similarity_thresholds(db).await?,
    };

    tracing::info!(
        distance_threshold = thresholds.distance,
        ratio_threshold = thresholds.ratio,
        "Starting similar-plate analysis"
    );

    similar::clear(db).await?;

    let all = plates::all_plates(db).await?;
    let mut pairs = Vec::new();

    for (i, plate1) in all.iter().enumerate() {
        if cancel.is_cancelled() {
            tracing::warn!(pairs_found = pairs.len(), "Similar-plate analysis cancelled");
            return Err(Error::Cancelled);
        }

        let text1 = plate1.plate_text.trim();
        for plate2 in &all[i + 1..] {
            let text2 = plate2.plate_text.trim();
            // Identical text is the same record lineage, not a pair worth
            // surfacing
            if text1 == text2 {
                continue;
            }
            if !plates_similar(text1, text2, thresholds) {
                continue;
            }

            let ratio = plate_ratio(text1, text2);
            let distance = plate_distance(text1, text2);
            let time_diff_seconds =
                Some((plate2.first_appearance - plate1.first_appearance).num_seconds().abs());
            let note = confidence_note(plate1, plate2);

            let id = similar::insert_pair(
                db,
                plate1.id,
                plate2.id,
                ratio,
                time_diff_seconds,
                &note,
            )
            .await?;

            tracing::debug!(
                plate1 = %text1,
                plate2 = %text2,
                distance,
                ratio,
                "Recorded similar pair"
            );

            pairs.push(SimilarPair {
                id,
                plate_id1: plate1.id,
                plate_id2: plate2.id,
                similarity_score: ratio,
                time_diff_seconds,
                detection_note: note,
            });
        }
    }

    tracing::info!(pairs_found = pairs.len(), "Similar-plate analysis complete");
    Ok(pairs)
}

/// Which side of a pair is probably the correct OCR of the plate.
fn confidence_note(plate1: &PlateRecord, plate2: &PlateRecord) -> String {
    let gap = (plate1.confidence - plate2.confidence).abs();
    if gap > CONFIDENCE_GAP_NOTEWORTHY {
        let better = if plate1.confidence > plate2.confidence {
            plate1
        } else {
            plate2
        };
        format!(
            "'{}' has higher confidence ({:.1}%)",
            better.plate_text.trim(),
            better.confidence
        )
    } else {
        "Similar confidence levels".to_string()
    }
}
