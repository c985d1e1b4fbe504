//! Arithmetic helpers for the workflow statistics aggregator.
//!
//! Durations are truncated to whole days before averaging, matching the
//! day-granularity reporting the dashboard expects.

use crate::types::Timestamp;

/// Whole days between start and completion, truncated (not rounded).
///
/// A flow completed 47 hours after it started counts as 1 day.
pub fn completion_days(started_at: Timestamp, completed_at: Timestamp) -> i64 {
    (completed_at - started_at).num_days()
}

/// Average completion time in days over flows that have both timestamps.
///
/// Each pair is truncated to whole days first, then averaged. Returns 0.0
/// when no flow qualifies.
pub fn avg_completion_days(pairs: &[(Timestamp, Timestamp)]) -> f64 {
    if pairs.is_empty() {
        return 0.0;
    }
    let total: i64 = pairs
        .iter()
        .map(|(started, completed)| completion_days(*started, *completed))
        .sum();
    total as f64 / pairs.len() as f64
}

/// Share of completed flows that were approved, as a fraction in `[0, 1]`.
///
/// Returns 0.0 when nothing has completed yet.
pub fn approval_rate(approved: i64, completed: i64) -> f64 {
    if completed <= 0 {
        return 0.0;
    }
    approved as f64 / completed as f64
}
