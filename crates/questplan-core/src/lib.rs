//! # questplan Core Library
//!
//! The task-scheduling engine behind questplan. Given immovable commitments
//! (meetings) and flexible work (assignments with deadlines, chores with
//! windows), it produces several candidate schedules, classifies how well
//! each task fits, and attaches a deadline-weighted reward ("potential XP")
//! to every allocated block.
//!
//! ## Architecture
//!
//! - **Slots**: 1-minute unit enumeration around fixed commitments
//! - **Blocks**: greedy unit selection with a randomized spacing heuristic
//! - **Priority**: urgency-bucketed assignment order, shuffled chores
//! - **Reward**: deadline-proximity reward per block
//! - **Scheduler**: the orchestrator running independent passes
//!
//! The engine does no I/O. Configuration and request parsing live beside it
//! for the CLI.
//!
//! ## Key Components
//!
//! - [`AutoScheduler`]: builds candidate schedules
//! - [`Schedule`]: one candidate, with per-task outcomes and summary lists
//! - [`Config`]: persisted engine defaults

pub mod blackout;
pub mod blocks;
pub mod config;
pub mod error;
pub mod model;
pub mod priority;
pub mod request;
pub mod reward;
pub mod scheduler;
pub mod slots;
pub mod time;

pub use blackout::{overnight_blackout, BlackoutWindow};
pub use blocks::find_blocks;
pub use config::Config;
pub use error::{ConfigError, CoreError, Result, ValidationError};
pub use model::{
    AssignmentTask, ChoreTask, FixedCommitment, Schedule, ScheduledTask, TaskOutcome, TaskStatus,
    TimeInterval, TimeSlotAllocation,
};
pub use priority::{prioritize_assignments, prioritize_chores};
pub use request::{ScheduleInputs, ScheduleRequest};
pub use reward::reward_for_allocation;
pub use scheduler::{build_schedules, AutoScheduler, SchedulerConfig};
pub use slots::{generate_available_units, UsedUnits};
pub use time::{latest_relevant_time, normalize_timestamp};
