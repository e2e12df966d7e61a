//! Block finder: turns free units into allocated time for one task.
//!
//! The scan is greedy, left to right. A spacing heuristic occasionally jumps
//! about two hours ahead at half-hour marks so that repeated passes spread
//! work differently; a shortfall caused by jumping is undone by a
//! deterministic retry.

use chrono::Duration;
use rand::Rng;
use tracing::trace;

use crate::model::TimeInterval;
use crate::slots::UsedUnits;
use crate::time::is_half_hour_boundary;

/// How far ahead a spacing jump lands.
pub const SKIP_JUMP_MINUTES: i64 = 120;

/// Minutes that must be allocated after a jump before another is considered.
pub const MIN_MINUTES_BETWEEN_SKIPS: i64 = 30;

/// Select units from `available` worth up to `effort_minutes`, merged into
/// contiguous runs.
///
/// Units overlapping `used` are never selected. The result may fall short
/// of the requested effort; callers derive assigned minutes from it.
pub fn find_blocks<R: Rng + ?Sized>(
    effort_minutes: i64,
    available: &[TimeInterval],
    used: &UsedUnits,
    skip_prob: f64,
    rng: &mut R,
) -> Vec<TimeInterval> {
    let mut skip_prob = skip_prob;
    let mut deterministic = skip_prob <= 0.0;

    loop {
        let blocks = scan(effort_minutes, available, used, skip_prob, rng);
        let assigned = total_minutes(&blocks);

        if assigned < effort_minutes && !deterministic {
            trace!(assigned, effort_minutes, "spacing left a shortfall, refilling greedily");
            skip_prob = 0.0;
            deterministic = true;
            continue;
        }
        return blocks;
    }
}

/// Sum of whole minutes across `blocks`.
pub fn total_minutes(blocks: &[TimeInterval]) -> i64 {
    blocks.iter().map(|b| b.duration_minutes()).sum()
}

fn scan<R: Rng + ?Sized>(
    effort_minutes: i64,
    available: &[TimeInterval],
    used: &UsedUnits,
    skip_prob: f64,
    rng: &mut R,
) -> Vec<TimeInterval> {
    let mut blocks: Vec<TimeInterval> = Vec::new();
    let mut assigned = 0i64;
    // None until the first jump
    let mut since_skip: Option<i64> = None;
    let mut i = 0usize;

    while i < available.len() && assigned < effort_minutes {
        let unit = available[i];
        if used.overlaps(&unit) {
            i += 1;
            continue;
        }

        let may_skip = skip_prob > 0.0
            && is_half_hour_boundary(unit.start)
            && since_skip.map_or(true, |m| m >= MIN_MINUTES_BETWEEN_SKIPS);

        if may_skip && rng.gen::<f64>() < skip_prob {
            let target = unit.start + Duration::minutes(SKIP_JUMP_MINUTES);
            let landing = available[i + 1..]
                .iter()
                .position(|u| u.start >= target && !used.overlaps(u))
                .map(|offset| i + 1 + offset);

            if let Some(j) = landing {
                trace!(from = %unit.start, to = %available[j].start, "spacing jump");
                since_skip = Some(0);
                i = j;
                continue;
            }
        }

        match blocks.last_mut() {
            Some(run) if run.end == unit.start => run.end = unit.end,
            _ => blocks.push(unit),
        }
        let minutes = unit.duration_minutes();
        assigned += minutes;
        if let Some(m) = since_skip.as_mut() {
            *m += minutes;
        }
        i += 1;
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slots::generate_available_units;
    use chrono::{DateTime, TimeZone, Utc};
    use rand::SeedableRng;
    use rand_pcg::Mcg128Xsl64;

    fn at(min: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 10, 10, 0, 0).unwrap() + Duration::minutes(min)
    }

    fn span(a: i64, b: i64) -> TimeInterval {
        TimeInterval::new(at(a), at(b)).unwrap()
    }

    fn rng() -> Mcg128Xsl64 {
        Mcg128Xsl64::seed_from_u64(7)
    }

    #[test]
    fn test_greedy_fill_merges_contiguous_units() {
        let units = generate_available_units(&[], at(0), at(120));
        let blocks = find_blocks(30, &units, &UsedUnits::new(), 0.0, &mut rng());
        assert_eq!(blocks, vec![span(0, 30)]);
    }

    #[test]
    fn test_gaps_split_runs() {
        let units = generate_available_units(&[span(10, 20)], at(0), at(60));
        let blocks = find_blocks(25, &units, &UsedUnits::new(), 0.0, &mut rng());
        assert_eq!(blocks, vec![span(0, 10), span(20, 35)]);
    }

    #[test]
    fn test_used_units_are_skipped() {
        let units = generate_available_units(&[], at(0), at(60));
        let mut used = UsedUnits::new();
        used.insert_interval(&span(0, 15));
        let blocks = find_blocks(15, &units, &used, 0.0, &mut rng());
        assert_eq!(blocks, vec![span(15, 30)]);
    }

    #[test]
    fn test_shortfall_returns_what_exists() {
        let units = generate_available_units(&[], at(0), at(10));
        let blocks = find_blocks(30, &units, &UsedUnits::new(), 0.0, &mut rng());
        assert_eq!(total_minutes(&blocks), 10);
    }

    #[test]
    fn test_empty_candidates_yield_nothing() {
        let blocks = find_blocks(30, &[], &UsedUnits::new(), 0.5, &mut rng());
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_certain_skip_jumps_two_hours() {
        // With skip_prob = 1 the first half-hour mark always jumps.
        let units = generate_available_units(&[], at(0), at(300));
        let blocks = find_blocks(30, &units, &UsedUnits::new(), 1.0, &mut rng());
        assert_eq!(blocks, vec![span(120, 150)]);
    }

    #[test]
    fn test_skip_needs_thirty_minutes_between_jumps() {
        let units = generate_available_units(&[], at(0), at(600));
        let blocks = find_blocks(60, &units, &UsedUnits::new(), 1.0, &mut rng());
        // Jump at 0 -> 120, fill 30 minutes, jump at 150 -> 270, fill 30.
        assert_eq!(blocks, vec![span(120, 150), span(270, 300)]);
    }

    #[test]
    fn test_failed_jump_allocates_current_unit() {
        // Not enough room for a two-hour jump: every unit is still used.
        let units = generate_available_units(&[], at(0), at(90));
        let blocks = find_blocks(60, &units, &UsedUnits::new(), 1.0, &mut rng());
        assert_eq!(blocks, vec![span(0, 60)]);
    }

    #[test]
    fn test_shortfall_after_jumping_falls_back_to_greedy() {
        // A jump from 0 lands at 120, leaving only 30 minutes past it.
        let units = generate_available_units(&[], at(0), at(150));
        let blocks = find_blocks(60, &units, &UsedUnits::new(), 1.0, &mut rng());
        assert_eq!(blocks, vec![span(0, 60)]);
    }

    #[test]
    fn test_off_boundary_start_never_skips() {
        let units = generate_available_units(&[], at(1), at(29));
        let blocks = find_blocks(20, &units, &UsedUnits::new(), 1.0, &mut rng());
        assert_eq!(blocks, vec![span(1, 21)]);
    }
}
