//! Elementary time units.
//!
//! The engine reasons in 1-minute units. This module enumerates the units
//! of a window that survive a set of fixed commitments, and tracks which
//! units a pass has already handed out.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};

use crate::model::TimeInterval;
use crate::time::{ceil_to_minute, floor_to_minute};

/// Length of one elementary unit.
pub const UNIT_MINUTES: i64 = 1;

fn unit_len() -> Duration {
    Duration::minutes(UNIT_MINUTES)
}

/// Enumerate the 1-minute units of `[from, to)` that overlap none of
/// `commitments`.
///
/// Units sit on whole minutes, starting at the first one at or after
/// `from`; a trailing fragment shorter than a unit is dropped. `from >= to`
/// yields nothing.
pub fn generate_available_units(
    commitments: &[TimeInterval],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Vec<TimeInterval> {
    if from >= to {
        return Vec::new();
    }

    let blocked = coalesce(commitments);
    let mut units = Vec::with_capacity((to - from).num_minutes().max(0) as usize);
    let mut cursor = 0usize;
    let mut t = ceil_to_minute(from);

    while t + unit_len() <= to {
        let unit = TimeInterval::unit_at(t);

        // Units only move forward, so commitments ending at or before this
        // unit can never block a later one.
        while cursor < blocked.len() && blocked[cursor].end <= unit.start {
            cursor += 1;
        }
        let excluded = blocked
            .get(cursor)
            .is_some_and(|c| c.start < unit.end);

        if !excluded {
            units.push(unit);
        }
        t += unit_len();
    }

    units
}

/// Sort and merge overlapping or touching intervals.
fn coalesce(intervals: &[TimeInterval]) -> Vec<TimeInterval> {
    let mut sorted: Vec<TimeInterval> = intervals.to_vec();
    sorted.sort_by_key(|i| i.start);

    let mut merged: Vec<TimeInterval> = Vec::with_capacity(sorted.len());
    for interval in sorted {
        match merged.last_mut() {
            Some(last) if interval.start <= last.end => {
                if interval.end > last.end {
                    last.end = interval.end;
                }
            }
            _ => merged.push(interval),
        }
    }
    merged
}

/// Units already handed out within one pass.
///
/// Stores unit start times. A candidate counts as used when it overlaps any
/// recorded unit, so units on different minute grids still never share time.
#[derive(Debug, Clone, Default)]
pub struct UsedUnits {
    starts: BTreeSet<DateTime<Utc>>,
}

impl UsedUnits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every whole-minute unit sharing time with `interval`.
    pub fn insert_interval(&mut self, interval: &TimeInterval) {
        let mut t = floor_to_minute(interval.start);
        while t < interval.end {
            self.starts.insert(t);
            t += unit_len();
        }
    }

    /// Whether `unit` shares any time with a recorded unit.
    pub fn overlaps(&self, unit: &TimeInterval) -> bool {
        // A recorded unit [s, s + 1m) overlaps iff s lies in (start - 1m, end).
        let lower = unit.start - unit_len();
        self.starts
            .range(lower..unit.end)
            .any(|&s| s > lower)
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }
}
