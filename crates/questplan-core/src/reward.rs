//! Reward potential ("XP") for allocated blocks.
//!
//! Up to 100 points per hour of work, scaled linearly by how much time is
//! still left before the deadline when the block ends: work finished right
//! after `now` earns the full rate, work finished at the deadline earns
//! nothing.

use chrono::{DateTime, Utc};

/// Points earned for one hour of work with the whole window still ahead.
pub const REWARD_PER_HOUR: f64 = 100.0;

/// Reward for a block `[slot_start, slot_end)` against `due`.
///
/// Chores pass their window end as `due`. Rounds half away from zero; the
/// value is never negative.
pub fn reward_for_allocation(
    slot_start: DateTime<Utc>,
    slot_end: DateTime<Utc>,
    due: DateTime<Utc>,
    now: DateTime<Utc>,
) -> i64 {
    if due <= now {
        return 0;
    }

    let total_window = (due - now).num_seconds() as f64;
    let time_left = (due - slot_end).num_seconds();
    if time_left < 0 || total_window <= 0.0 {
        return 0;
    }

    let time_factor = (time_left as f64 / total_window).max(0.0);
    let duration_minutes = (slot_end - slot_start).num_seconds() as f64 / 60.0;

    (REWARD_PER_HOUR * duration_minutes * time_factor / 60.0)
        .round()
        .max(0.0) as i64
}
