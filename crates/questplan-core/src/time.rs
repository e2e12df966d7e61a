//! Time normalization helpers.
//!
//! Every timestamp that reaches the engine is canonical UTC. Strings carrying
//! an explicit offset are converted; strings without one are taken as UTC
//! already.

use chrono::{DateTime, Duration, NaiveDateTime, Timelike, Utc};

use crate::error::ValidationError;
use crate::model::{AssignmentTask, ChoreTask, FixedCommitment};

/// Naive formats accepted when no zone is present.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a timestamp string into canonical UTC.
///
/// Accepts RFC 3339 (`Z` or `+HH:MM` suffix), compact `+HHMM` offsets and
/// the zone-less forms in [`NAIVE_FORMATS`].
pub fn normalize_timestamp(input: &str) -> Result<DateTime<Utc>, ValidationError> {
    let trimmed = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ValidationError::UnparseableTimestamp(input.to_string()))
}

/// Drop seconds and sub-second precision.
pub fn floor_to_minute(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_second(0)
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(dt)
}

/// Round up to the next whole minute; whole minutes are returned unchanged.
pub fn ceil_to_minute(dt: DateTime<Utc>) -> DateTime<Utc> {
    let floored = floor_to_minute(dt);
    if floored == dt {
        dt
    } else {
        floored + Duration::minutes(1)
    }
}

/// True when `dt` sits exactly on a :00 or :30 boundary.
pub fn is_half_hour_boundary(dt: DateTime<Utc>) -> bool {
    dt.minute() % 30 == 0 && dt.second() == 0 && dt.nanosecond() == 0
}

/// The furthest point in time any input refers to.
///
/// Callers use this to decide how far ahead to load already-committed
/// blocks; the scheduler uses it as its planning horizon. Defaults to one
/// day after `now` when there is nothing to look at.
pub fn latest_relevant_time(
    commitments: &[FixedCommitment],
    assignments: &[AssignmentTask],
    chores: &[ChoreTask],
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let due_times = assignments.iter().map(|a| a.due);
    let chore_ends = chores.iter().map(|c| c.window.end);
    let commitment_ends = commitments
        .iter()
        .flat_map(|c| c.occurrences.iter().map(|o| o.end));

    due_times
        .chain(chore_ends)
        .chain(commitment_ends)
        .max()
        .unwrap_or(now + Duration::days(1))
}
