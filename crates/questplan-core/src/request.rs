//! Scheduling requests as they arrive from outside.
//!
//! Timestamps are strings in whatever form the client sent; turning a
//! request into engine inputs runs each one through
//! [`normalize_timestamp`](crate::time::normalize_timestamp).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::model::{AssignmentTask, ChoreTask, FixedCommitment, TimeInterval};
use crate::time::{floor_to_minute, normalize_timestamp};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitmentRequest {
    pub name: String,
    /// `[start, end]` pairs
    #[serde(default)]
    pub occurrences: Vec<(String, String)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentRequest {
    pub name: String,
    /// Minutes of work
    pub effort: i64,
    pub due: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoreRequest {
    pub name: String,
    /// Minutes of work
    pub effort: i64,
    pub window: (String, String),
}

/// A full request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleRequest {
    /// Defaults to the current minute when absent
    #[serde(default)]
    pub now: Option<String>,
    #[serde(default)]
    pub commitments: Vec<CommitmentRequest>,
    #[serde(default)]
    pub assignments: Vec<AssignmentRequest>,
    #[serde(default)]
    pub chores: Vec<ChoreRequest>,
}

/// Engine-ready inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleInputs {
    pub now: DateTime<Utc>,
    pub commitments: Vec<FixedCommitment>,
    pub assignments: Vec<AssignmentTask>,
    pub chores: Vec<ChoreTask>,
}

impl ScheduleRequest {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Normalize every timestamp and build engine inputs.
    ///
    /// # Errors
    /// Fails on the first timestamp that cannot be parsed or the first
    /// interval whose end is not after its start.
    pub fn into_inputs(self) -> Result<ScheduleInputs> {
        let now = match self.now.as_deref() {
            Some(raw) => normalize_timestamp(raw)?,
            None => floor_to_minute(Utc::now()),
        };

        let commitments = self
            .commitments
            .into_iter()
            .map(|c| {
                let occurrences = c
                    .occurrences
                    .iter()
                    .map(|(start, end)| parse_interval(start, end))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(FixedCommitment::new(c.name, occurrences))
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        let assignments = self
            .assignments
            .into_iter()
            .map(|a| Ok(AssignmentTask::new(a.name, a.effort, normalize_timestamp(&a.due)?)))
            .collect::<Result<Vec<_>, ValidationError>>()?;

        let chores = self
            .chores
            .into_iter()
            .map(|c| {
                let window = parse_interval(&c.window.0, &c.window.1)?;
                Ok(ChoreTask::new(c.name, c.effort, window))
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        Ok(ScheduleInputs {
            now,
            commitments,
            assignments,
            chores,
        })
    }
}

fn parse_interval(start: &str, end: &str) -> Result<TimeInterval, ValidationError> {
    TimeInterval::new(normalize_timestamp(start)?, normalize_timestamp(end)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use chrono::TimeZone;

    const REQUEST: &str = r#"{
        "now": "2025-08-10T10:00:00Z",
        "commitments": [
            { "name": "Team Sync", "occurrences": [["2025-08-10T11:00:00Z", "2025-08-10T12:00:00Z"]] }
        ],
        "assignments": [
            { "name": "Math HW", "effort": 30, "due": "2025-08-10T17:00:00+02:00" }
        ],
        "chores": [
            { "name": "Dishes", "effort": 30, "window": ["2025-08-10T10:30:00", "2025-08-10T12:30:00"] }
        ]
    }"#;

    #[test]
    fn test_request_normalizes_timestamps() {
        let inputs = ScheduleRequest::from_json(REQUEST).unwrap().into_inputs().unwrap();
        let base = Utc.with_ymd_and_hms(2025, 8, 10, 10, 0, 0).unwrap();

        assert_eq!(inputs.now, base);
        assert_eq!(inputs.commitments[0].occurrences.len(), 1);
        assert_eq!(inputs.assignments[0].due, Utc.with_ymd_and_hms(2025, 8, 10, 15, 0, 0).unwrap());
        assert_eq!(
            inputs.chores[0].window.start,
            Utc.with_ymd_and_hms(2025, 8, 10, 10, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let inputs = ScheduleRequest::from_json(r#"{"now": "2025-08-10T10:00:00Z"}"#)
            .unwrap()
            .into_inputs()
            .unwrap();
        assert!(inputs.commitments.is_empty());
        assert!(inputs.assignments.is_empty());
        assert!(inputs.chores.is_empty());
    }

    #[test]
    fn test_inverted_chore_window_is_rejected() {
        let json = r#"{
            "now": "2025-08-10T10:00:00Z",
            "chores": [{ "name": "Back", "effort": 10, "window": ["2025-08-10T12:00:00Z", "2025-08-10T11:00:00Z"] }]
        }"#;
        let err = ScheduleRequest::from_json(json).unwrap().into_inputs().unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::InvalidTimeRange { .. })
        ));
    }

    #[test]
    fn test_bad_timestamp_is_rejected() {
        let json = r#"{ "assignments": [{ "name": "A", "effort": 10, "due": "tomorrow" }] }"#;
        let err = ScheduleRequest::from_json(json).unwrap().into_inputs().unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::UnparseableTimestamp(_))
        ));
    }
}
