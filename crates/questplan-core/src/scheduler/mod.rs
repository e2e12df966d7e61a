//! Schedule builder.
//!
//! Produces several independent candidate schedules for the same inputs:
//! - Fixed commitments are blocked out up front
//! - Assignments are ordered by urgency bucket, chores are shuffled
//! - Each task takes free minutes from its own window via the block finder
//! - Every allocated block carries a deadline-weighted reward
//!
//! Passes never observe each other. Each one draws from its own seeded
//! generator, so a fixed seed reproduces the output whether passes run
//! sequentially or in parallel.

use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::blocks::find_blocks;
use crate::error::{CoreError, Result, ValidationError};
use crate::model::{
    AssignmentTask, ChoreTask, FixedCommitment, Schedule, ScheduledTask, TaskOutcome, TaskStatus,
    TimeInterval, TimeSlotAllocation,
};
use crate::priority::{prioritize_assignments, prioritize_chores, DEFAULT_BUCKET_MINUTES};
use crate::reward::reward_for_allocation;
use crate::slots::{generate_available_units, UsedUnits};
use crate::time::{ceil_to_minute, latest_relevant_time};

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Number of candidate schedules to produce
    pub num_schedules: usize,
    /// Chance of a spacing jump at each eligible half-hour mark (0.0-1.0)
    pub skip_probability: f64,
    /// Width of an assignment urgency bucket (minutes)
    pub bucket_minutes: i64,
    /// Random seed for reproducibility (None = random)
    pub seed: Option<u64>,
    /// Run passes on separate threads
    pub parallel: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            num_schedules: 3,
            skip_probability: 0.0,
            bucket_minutes: DEFAULT_BUCKET_MINUTES,
            seed: None,
            parallel: false,
        }
    }
}

impl SchedulerConfig {
    /// Check ranges without running anything.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.num_schedules == 0 {
            return Err(ValidationError::InvalidScheduleCount(self.num_schedules));
        }
        if !(0.0..=1.0).contains(&self.skip_probability) {
            return Err(ValidationError::InvalidProbability(self.skip_probability));
        }
        if self.bucket_minutes <= 0 {
            return Err(ValidationError::InvalidValue {
                field: "bucket_minutes".to_string(),
                message: format!("must be positive, got {}", self.bucket_minutes),
            });
        }
        Ok(())
    }
}

/// Inputs shared read-only by every pass.
struct PassInputs<'a> {
    blocked: &'a [TimeInterval],
    base_used: &'a UsedUnits,
    assignments: &'a [AssignmentTask],
    chores: &'a [ChoreTask],
    now: DateTime<Utc>,
}

/// Builds candidate schedules around fixed commitments
pub struct AutoScheduler {
    config: SchedulerConfig,
}

impl AutoScheduler {
    /// Create a new scheduler with default config
    pub fn new() -> Self {
        Self {
            config: SchedulerConfig::default(),
        }
    }

    /// Create with custom config
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Generate `num_schedules` candidate schedules.
    ///
    /// # Arguments
    /// * `commitments` - Immovable commitments, already expanded into occurrences
    /// * `assignments` - Deadline-bound work, feasible in `[now, due)`
    /// * `chores` - Window-bound work
    /// * `now` - Canonical UTC "now"; rounded up to the next whole minute
    ///
    /// # Errors
    /// Returns a validation error, before doing any allocation, when an
    /// effort is not positive, a window or occurrence is empty or inverted,
    /// or the configuration is out of range.
    pub fn build_schedules(
        &self,
        commitments: &[FixedCommitment],
        assignments: &[AssignmentTask],
        chores: &[ChoreTask],
        now: DateTime<Utc>,
    ) -> Result<Vec<Schedule>> {
        self.config.validate()?;
        validate_inputs(commitments, assignments, chores)?;
        let now = ceil_to_minute(now);

        // 1. Flatten commitment occurrences
        let blocked: Vec<TimeInterval> = commitments
            .iter()
            .flat_map(|c| c.occurrences.iter().copied())
            .collect();

        // 2. Planning horizon
        let horizon = latest_relevant_time(commitments, assignments, chores, now);

        // 3. Units every pass starts with as taken
        let mut base_used = UsedUnits::new();
        for occurrence in &blocked {
            base_used.insert_interval(occurrence);
        }

        info!(
            passes = self.config.num_schedules,
            assignments = assignments.len(),
            chores = chores.len(),
            commitments = blocked.len(),
            %horizon,
            "building schedules"
        );

        // 4. One independent stream per pass
        let mut master = match self.config.seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        let pass_seeds: Vec<u64> = (0..self.config.num_schedules)
            .map(|_| master.gen())
            .collect();

        let inputs = PassInputs {
            blocked: &blocked,
            base_used: &base_used,
            assignments,
            chores,
            now,
        };

        if self.config.parallel && pass_seeds.len() > 1 {
            self.run_parallel(&inputs, &pass_seeds)
        } else {
            Ok(pass_seeds
                .iter()
                .map(|&seed| self.run_pass(&inputs, seed))
                .collect())
        }
    }

    fn run_parallel(&self, inputs: &PassInputs<'_>, pass_seeds: &[u64]) -> Result<Vec<Schedule>> {
        std::thread::scope(|scope| {
            let handles: Vec<_> = pass_seeds
                .iter()
                .map(|&seed| scope.spawn(move || self.run_pass(inputs, seed)))
                .collect();

            // Joined in spawn order, so output order matches pass order.
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .map_err(|_| CoreError::Custom("scheduling pass panicked".to_string()))
                })
                .collect()
        })
    }

    /// Run a single pass.
    fn run_pass(&self, inputs: &PassInputs<'_>, seed: u64) -> Schedule {
        let mut rng = Mcg128Xsl64::seed_from_u64(seed);
        let id = uuid::Builder::from_random_bytes(rng.gen()).into_uuid();
        let mut used = inputs.base_used.clone();
        let mut schedule = Schedule::empty(id.to_string());

        let assignments = prioritize_assignments(
            inputs.assignments,
            inputs.now,
            self.config.bucket_minutes,
            &mut rng,
        );
        let chores = prioritize_chores(inputs.chores, &mut rng);

        // Assignments always go first; chores only get what is left.
        for assignment in &assignments {
            let outcome = self.allocate(
                assignment.effort_minutes,
                assignment.window(inputs.now),
                assignment.due,
                inputs,
                &mut used,
                &mut rng,
            );
            debug!(
                schedule = %schedule.id,
                task = %assignment.name,
                status = %outcome.status,
                assigned = outcome.effort_assigned,
                required = outcome.effort_required,
                "assignment placed"
            );
            record(
                &mut schedule.assignments,
                &mut schedule.conflicting_assignments,
                &mut schedule.not_enough_time_assignments,
                &mut schedule.total_potential_reward,
                &assignment.name,
                outcome,
            );
        }

        for chore in &chores {
            let outcome = self.allocate(
                chore.effort_minutes,
                Some(chore.window),
                chore.window.end,
                inputs,
                &mut used,
                &mut rng,
            );
            debug!(
                schedule = %schedule.id,
                task = %chore.name,
                status = %outcome.status,
                assigned = outcome.effort_assigned,
                required = outcome.effort_required,
                "chore placed"
            );
            record(
                &mut schedule.chores,
                &mut schedule.conflicting_chores,
                &mut schedule.not_enough_time_chores,
                &mut schedule.total_potential_reward,
                &chore.name,
                outcome,
            );
        }

        schedule
    }

    /// Allocate time for one task inside `window` and mark it used.
    fn allocate(
        &self,
        effort_minutes: i64,
        window: Option<TimeInterval>,
        due: DateTime<Utc>,
        inputs: &PassInputs<'_>,
        used: &mut UsedUnits,
        rng: &mut Mcg128Xsl64,
    ) -> TaskOutcome {
        let Some(window) = window else {
            return TaskOutcome::from_slots(effort_minutes, Vec::new());
        };

        let available: Vec<TimeInterval> =
            generate_available_units(inputs.blocked, window.start, window.end)
                .into_iter()
                .filter(|unit| !used.overlaps(unit))
                .collect();

        let blocks = find_blocks(
            effort_minutes,
            &available,
            used,
            self.config.skip_probability,
            rng,
        );

        let slots = blocks
            .iter()
            .map(|block| {
                used.insert_interval(block);
                TimeSlotAllocation {
                    start: block.start,
                    end: block.end,
                    reward_potential: reward_for_allocation(
                        block.start,
                        block.end,
                        due,
                        inputs.now,
                    ),
                }
            })
            .collect();

        TaskOutcome::from_slots(effort_minutes, slots)
    }
}

impl Default for AutoScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Build candidate schedules with an entropy-seeded generator.
pub fn build_schedules(
    commitments: &[FixedCommitment],
    assignments: &[AssignmentTask],
    chores: &[ChoreTask],
    num_schedules: usize,
    now: DateTime<Utc>,
    skip_prob: f64,
) -> Result<Vec<Schedule>> {
    AutoScheduler::with_config(SchedulerConfig {
        num_schedules,
        skip_probability: skip_prob,
        ..SchedulerConfig::default()
    })
    .build_schedules(commitments, assignments, chores, now)
}

fn record(
    outcomes: &mut Vec<ScheduledTask>,
    conflicting: &mut Vec<String>,
    not_enough_time: &mut Vec<String>,
    total_reward: &mut i64,
    name: &str,
    outcome: TaskOutcome,
) {
    match outcome.status {
        TaskStatus::Unschedulable => conflicting.push(name.to_string()),
        TaskStatus::PartiallyScheduled => not_enough_time.push(name.to_string()),
        TaskStatus::FullyScheduled => {}
    }
    *total_reward += outcome.reward_potential();
    outcomes.push(ScheduledTask {
        name: name.to_string(),
        outcome,
    });
}

fn validate_inputs(
    commitments: &[FixedCommitment],
    assignments: &[AssignmentTask],
    chores: &[ChoreTask],
) -> Result<(), ValidationError> {
    for occurrence in commitments.iter().flat_map(|c| c.occurrences.iter()) {
        occurrence.validate()?;
    }
    for assignment in assignments {
        if assignment.effort_minutes <= 0 {
            return Err(ValidationError::NonPositiveEffort {
                task: assignment.name.clone(),
                effort: assignment.effort_minutes,
            });
        }
    }
    for chore in chores {
        if chore.effort_minutes <= 0 {
            return Err(ValidationError::NonPositiveEffort {
                task: chore.name.clone(),
                effort: chore.effort_minutes,
            });
        }
        chore.window.validate()?;
    }
    Ok(())
}
