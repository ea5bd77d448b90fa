//! Spaced-repetition scheduling for study items.
//!
//! Each item sits in a bucket `0..=MAX_BUCKET`; the bucket picks the wait
//! before the next review. Self-graded outcomes move the item between
//! buckets.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::kinds::ReviewOutcome;

/// Review interval in days, indexed by bucket.
pub const INTERVAL_DAYS: [i64; 6] = [1, 3, 7, 14, 30, 60];

/// Highest bucket an item can reach.
pub const MAX_BUCKET: i16 = (INTERVAL_DAYS.len() - 1) as i16;

/// Result of scheduling a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Schedule {
    pub srs_bucket: i16,
    pub next_review_at: DateTime<Utc>,
}

/// Clamp a stored bucket into the valid range.
pub fn clamp_bucket(bucket: i16) -> i16 {
    bucket.clamp(0, MAX_BUCKET)
}

/// Wait before the next review for a bucket.
pub fn interval_for(bucket: i16) -> Duration {
    Duration::days(INTERVAL_DAYS[clamp_bucket(bucket) as usize])
}

/// Bucket after a review with the given outcome.
pub fn next_bucket(current: i16, outcome: ReviewOutcome) -> i16 {
    let current = clamp_bucket(current);
    let next = match outcome {
        ReviewOutcome::Again => 0,
        ReviewOutcome::Hard => current,
        ReviewOutcome::Good => current + 1,
        ReviewOutcome::Easy => current + 2,
    };
    clamp_bucket(next)
}

/// Schedule the next review of an item reviewed at `reviewed_at`.
pub fn schedule_review(current: i16, outcome: ReviewOutcome, reviewed_at: DateTime<Utc>) -> Schedule {
    let srs_bucket = next_bucket(current, outcome);
    Schedule {
        srs_bucket,
        next_review_at: reviewed_at + interval_for(srs_bucket),
    }
}

/// Never-reviewed items (no `next_review_at`) are always due.
pub fn is_due(next_review_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    next_review_at.map_or(true, |at| at <= now)
}
