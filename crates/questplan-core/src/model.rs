//! Engine data model.
//!
//! Inputs (commitments, assignments, chores) and outputs (per-task outcomes
//! grouped into candidate schedules). Everything here is plain data; the
//! engine creates fresh outputs per request and keeps nothing between calls.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A half-open `[start, end)` span of absolute time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeInterval {
    /// Create an interval, rejecting empty or inverted ranges.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        if end <= start {
            return Err(ValidationError::InvalidTimeRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The elementary unit `[start, start + 1 minute)`.
    pub fn unit_at(start: DateTime<Utc>) -> Self {
        Self {
            start,
            end: start + Duration::minutes(1),
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Get duration in whole minutes
    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    /// Half-open overlap test.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        !(self.end <= other.start || self.start >= other.end)
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        Self::new(self.start, self.end).map(|_| ())
    }
}

/// An immovable commitment: a meeting, or previously persisted blocks
/// injected by the caller as a synthetic "already scheduled" entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedCommitment {
    pub name: String,
    pub occurrences: Vec<TimeInterval>,
}

impl FixedCommitment {
    pub fn new(name: impl Into<String>, occurrences: Vec<TimeInterval>) -> Self {
        Self {
            name: name.into(),
            occurrences,
        }
    }
}

/// Work that must be done before `due`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentTask {
    pub name: String,
    pub effort_minutes: i64,
    pub due: DateTime<Utc>,
}

impl AssignmentTask {
    pub fn new(name: impl Into<String>, effort_minutes: i64, due: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            effort_minutes,
            due,
        }
    }

    /// Feasible window `[now, due)`; `None` once the task is overdue.
    pub fn window(&self, now: DateTime<Utc>) -> Option<TimeInterval> {
        TimeInterval::new(now, self.due).ok()
    }
}

/// Work that must happen inside an explicit window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoreTask {
    pub name: String,
    pub effort_minutes: i64,
    pub window: TimeInterval,
}

impl ChoreTask {
    pub fn new(name: impl Into<String>, effort_minutes: i64, window: TimeInterval) -> Self {
        Self {
            name: name.into(),
            effort_minutes,
            window,
        }
    }
}

/// One contiguous block granted to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlotAllocation {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub reward_potential: i64,
}

impl TimeSlotAllocation {
    pub fn interval(&self) -> TimeInterval {
        TimeInterval {
            start: self.start,
            end: self.end,
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// How well a task was accommodated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    FullyScheduled,
    PartiallyScheduled,
    Unschedulable,
}

impl TaskStatus {
    /// Classify from assigned and required minutes.
    pub fn classify(assigned_minutes: i64, required_minutes: i64) -> Self {
        if assigned_minutes <= 0 {
            Self::Unschedulable
        } else if assigned_minutes >= required_minutes {
            Self::FullyScheduled
        } else {
            Self::PartiallyScheduled
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullyScheduled => "fully_scheduled",
            Self::PartiallyScheduled => "partially_scheduled",
            Self::Unschedulable => "unschedulable",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allocation result for a single task within one candidate schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub effort_required: i64,
    pub effort_assigned: i64,
    pub status: TaskStatus,
    pub slots: Vec<TimeSlotAllocation>,
}

impl TaskOutcome {
    /// Build an outcome from allocated slots; `effort_assigned` and `status`
    /// are derived, never supplied.
    pub fn from_slots(effort_required: i64, slots: Vec<TimeSlotAllocation>) -> Self {
        let effort_assigned = slots.iter().map(|s| s.duration_minutes()).sum();
        Self {
            effort_required,
            effort_assigned,
            status: TaskStatus::classify(effort_assigned, effort_required),
            slots,
        }
    }

    pub fn reward_potential(&self) -> i64 {
        self.slots.iter().map(|s| s.reward_potential).sum()
    }
}

/// A named task outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub name: String,
    pub outcome: TaskOutcome,
}

/// One complete candidate schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: String,
    pub assignments: Vec<ScheduledTask>,
    pub chores: Vec<ScheduledTask>,
    /// Assignments that received no time at all
    pub conflicting_assignments: Vec<String>,
    /// Assignments that received some but not all of their effort
    pub not_enough_time_assignments: Vec<String>,
    pub conflicting_chores: Vec<String>,
    pub not_enough_time_chores: Vec<String>,
    pub total_potential_reward: i64,
}

impl Schedule {
    pub(crate) fn empty(id: String) -> Self {
        Self {
            id,
            assignments: Vec::new(),
            chores: Vec::new(),
            conflicting_assignments: Vec::new(),
            not_enough_time_assignments: Vec::new(),
            conflicting_chores: Vec::new(),
            not_enough_time_chores: Vec::new(),
            total_potential_reward: 0,
        }
    }

    /// Iterate over every allocated slot in this schedule.
    pub fn all_slots(&self) -> impl Iterator<Item = &TimeSlotAllocation> {
        self.assignments
            .iter()
            .chain(self.chores.iter())
            .flat_map(|t| t.outcome.slots.iter())
    }

    pub fn assignment(&self, name: &str) -> Option<&ScheduledTask> {
        self.assignments.iter().find(|t| t.name == name)
    }

    pub fn chore(&self, name: &str) -> Option<&ScheduledTask> {
        self.chores.iter().find(|t| t.name == name)
    }
}
