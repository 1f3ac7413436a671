//! Capture timestamp recovery from source media filenames
//!
//! Recording hardware names files like `00000006_20250226102711_NF.mp4`,
//! embedding the real capture time as a 14-digit `YYYYMMDDHHMMSS` run.
//! Parsing is fallible and returns `None` on any mismatch; an absent real
//! timestamp is a normal state, never an error.

use chrono::{DateTime, NaiveDateTime, Utc};

const STAMP_LEN: usize = 14;

/// Extract the capture timestamp embedded in a source filename.
///
/// Prefers a 14-digit run delimited by underscores (the primary camera
/// naming convention), falling back to the first 14-digit run anywhere in
/// the name. Returns `None` when no run parses as a valid date-time.
pub fn extract_timestamp_from_filename(filename: &str) -> Option<DateTime<Utc>> {
    if let Some(stamp) = find_delimited_stamp(filename).and_then(parse_stamp) {
        return Some(stamp);
    }
    find_digit_runs(filename).into_iter().find_map(parse_stamp)
}

/// Find a `_<14 digits>_` group, the primary convention.
fn find_delimited_stamp(filename: &str) -> Option<&str> {
    let bytes = filename.as_bytes();
    for (i, _) in filename.match_indices('_') {
        let start = i + 1;
        let end = start + STAMP_LEN;
        if end < bytes.len()
            && bytes[end] == b'_'
            && filename[start..end].bytes().all(|b| b.is_ascii_digit())
        {
            return Some(&filename[start..end]);
        }
    }
    None
}

/// Collect every maximal digit run of at least 14 characters.
fn find_digit_runs(filename: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut start = None;
    for (i, c) in filename.char_indices() {
        match (c.is_ascii_digit(), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                if i - s >= STAMP_LEN {
                    runs.push(&filename[s..s + STAMP_LEN]);
                }
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        if filename.len() - s >= STAMP_LEN {
            runs.push(&filename[s..s + STAMP_LEN]);
        }
    }
    runs
}

fn parse_stamp(stamp: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(stamp, "%Y%m%d%H%M%S")
        .ok()
        .map(|naive| naive.and_utc())
}
