//! Ordering for the loosely-dotted version strings found in app definitions.
//!
//! Catalog versions are mostly `major.minor.patch` but arrive in every shape:
//! "1.0", "2.0.0.1", "1.2-beta", "", or missing entirely. Comparison is
//! segment-wise numeric:
//!
//! - split on `.`
//! - each segment contributes its leading ASCII digits, or 0 when it has none
//! - missing trailing segments count as 0, so "1.0" == "1.0.0"

use std::cmp::Ordering;

/// Numeric value of one dotted segment: its leading digits, else 0.
fn segment_value(segment: &str) -> u64 {
    let segment = segment.trim();
    let digit_end = segment
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(segment.len());
    segment[..digit_end].parse().unwrap_or(0)
}

fn segments(version: &str) -> Vec<u64> {
    let mut values: Vec<u64> = version.split('.').map(segment_value).collect();
    // Trailing zeros carry no ordering information.
    while values.len() > 1 && values.last() == Some(&0) {
        values.pop();
    }
    values
}

/// Compare two versions segment by segment, ascending.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let (a, b) = (segments(a), segments(b));
    for i in 0..a.len().max(b.len()) {
        let ord = a.get(i).unwrap_or(&0).cmp(b.get(i).unwrap_or(&0));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}
