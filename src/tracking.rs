//! Camera-following heuristic
//!
//! Looks at the cadence of a plate's detections and decides whether the
//! vehicle appears to be moving with the observing camera. This is an
//! approximation over detection timing, not a proof of co-movement.

use chrono::{DateTime, Utc};

/// Verdict produced by the follow analyzer.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowVerdict {
    pub is_following: bool,
    pub reason: String,
}

impl FollowVerdict {
    fn no(reason: impl Into<String>) -> Self {
        Self {
            is_following: false,
            reason: reason.into(),
        }
    }
}

/// Analyze a plate's detection times for a camera-following pattern.
///
/// Rules:
/// - fewer than 3 detections can never qualify
/// - consecutive intervals shorter than `min_interval_seconds` are
///   near-duplicate noise and are discarded, not motion
/// - any remaining interval longer than `threshold_seconds` marks the
///   sequence inconsistent
/// - otherwise the plate is following when at least 2 valid intervals
///   remain and their mean is below `threshold_seconds`
///
/// Input order does not matter; times are sorted internally.
pub fn analyze_follow(
    times: &[DateTime<Utc>],
    threshold_seconds: i64,
    min_interval_seconds: i64,
) -> FollowVerdict {
    if times.len() < 3 {
        return FollowVerdict::no("Not enough detections");
    }

    let mut sorted = times.to_vec();
    sorted.sort();

    let mut consistent = true;
    let mut valid_intervals: Vec<f64> = Vec::new();

    for pair in sorted.windows(2) {
        let interval = (pair[1] - pair[0]).num_milliseconds() as f64 / 1000.0;
        if interval < min_interval_seconds as f64 {
            tracing::debug!(interval_seconds = interval, "Ignoring too short interval");
            continue;
        }
        if interval > threshold_seconds as f64 {
            consistent = false;
        }
        valid_intervals.push(interval);
    }

    if valid_intervals.is_empty() {
        return FollowVerdict::no("No valid detection intervals found");
    }
    if valid_intervals.len() < 2 {
        return FollowVerdict::no(format!(
            "Not enough valid intervals ({}) after filtering",
            valid_intervals.len()
        ));
    }

    let avg = valid_intervals.iter().sum::<f64>() / valid_intervals.len() as f64;
    if consistent && avg < threshold_seconds as f64 {
        return FollowVerdict {
            is_following: true,
            reason: format!(
                "Multiple detections with average interval {} seconds",
                avg as i64
            ),
        };
    }

    FollowVerdict::no("Inconsistent detection pattern")
}
