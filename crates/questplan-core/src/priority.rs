//! Processing order for flexible work.
//!
//! Assignments are grouped into urgency buckets by how far away their due
//! time is; buckets are visited soonest first and shuffled internally, which
//! keeps an approximate earliest-deadline-first order while letting repeated
//! passes differ. Chores carry no comparable urgency and are fully shuffled.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::model::{AssignmentTask, ChoreTask};

/// Default urgency bucket width (4 hours).
pub const DEFAULT_BUCKET_MINUTES: i64 = 240;

/// Urgency bucket of a due time relative to `now`.
///
/// Floor division, so overdue tasks land in negative buckets and sort first.
pub fn bucket_key(due: DateTime<Utc>, now: DateTime<Utc>, bucket_minutes: i64) -> i64 {
    let bucket_seconds = bucket_minutes.max(1) * 60;
    (due - now).num_seconds().div_euclid(bucket_seconds)
}

/// Order assignments bucket by bucket, shuffling within each bucket.
pub fn prioritize_assignments<R: Rng + ?Sized>(
    assignments: &[AssignmentTask],
    now: DateTime<Utc>,
    bucket_minutes: i64,
    rng: &mut R,
) -> Vec<AssignmentTask> {
    let mut buckets: BTreeMap<i64, Vec<AssignmentTask>> = BTreeMap::new();
    for assignment in assignments {
        buckets
            .entry(bucket_key(assignment.due, now, bucket_minutes))
            .or_default()
            .push(assignment.clone());
    }

    let mut ordered = Vec::with_capacity(assignments.len());
    for (_, mut group) in buckets {
        group.shuffle(rng);
        ordered.extend(group);
    }
    ordered
}

/// Uniform random permutation of `chores`.
pub fn prioritize_chores<R: Rng + ?Sized>(chores: &[ChoreTask], rng: &mut R) -> Vec<ChoreTask> {
    let mut ordered = chores.to_vec();
    ordered.shuffle(rng);
    ordered
}
