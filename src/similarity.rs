//! Plate text similarity predicate
//!
//! Single source of truth for "same physical plate". Identity resolution,
//! blacklist matching and detection-history merging all call through here
//! so the three surfaces can never disagree on what counts as a match.

use serde::{Deserialize, Serialize};

/// Threshold pair consumed by the predicate.
///
/// Loaded from the settings table at call time (`levenshtein_threshold`,
/// `similarity_ratio`) or supplied explicitly by the operator for a
/// one-off correlation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityThresholds {
    /// Maximum Levenshtein edit distance treated as a match
    pub distance: f64,
    /// Minimum normalized similarity ratio (0-1) treated as a match
    pub ratio: f64,
}

impl Default for SimilarityThresholds {
    fn default() -> Self {
        Self {
            distance: 2.0,
            ratio: 0.8,
        }
    }
}

/// Decide whether two OCR'd plate strings denote the same physical plate.
///
/// Inputs are trimmed and case-normalized before comparison. The rule is
/// length-tiered:
///
/// - either side has <= 4 characters: edit distance <= 1 (short plates
///   tolerate almost no noise; a ratio is meaningless at this length)
/// - either side has <= 7 characters: edit distance <= `thresholds.distance`
/// - both longer: edit distance <= `thresholds.distance` OR normalized
///   Levenshtein ratio >= `thresholds.ratio`
///
/// Empty input on either side is never similar.
pub fn plates_similar(a: &str, b: &str, thresholds: SimilarityThresholds) -> bool {
    let a = a.trim().to_uppercase();
    let b = b.trim().to_uppercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }

    let len_a = a.chars().count();
    let len_b = b.chars().count();
    let distance = strsim::levenshtein(&a, &b);

    if len_a <= 4 || len_b <= 4 {
        distance <= 1
    } else if len_a <= 7 || len_b <= 7 {
        (distance as f64) <= thresholds.distance
    } else {
        let ratio = strsim::normalized_levenshtein(&a, &b);
        (distance as f64) <= thresholds.distance || ratio >= thresholds.ratio
    }
}

/// Edit distance between two already-normalized plate strings.
///
/// Exposed for the correlation pass, which stores the raw distance and
/// ratio alongside the match verdict.
pub fn plate_distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// Normalized Levenshtein ratio (0-1) between two plate strings.
pub fn plate_ratio(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}
