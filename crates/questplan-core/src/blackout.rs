//! Overnight blackout windows.
//!
//! Nothing in the scheduler blocks sleeping hours on its own. Callers that
//! want a nightly no-work window build it here and pass it in as an ordinary
//! fixed commitment.

use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::model::{FixedCommitment, TimeInterval};

/// Name given to generated blackout commitments.
pub const BLACKOUT_NAME: &str = "Sleep";

/// A daily window in local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlackoutWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
    /// Local time = UTC + this many minutes.
    #[serde(default)]
    pub tz_offset_minutes: i32,
}

impl BlackoutWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            start,
            end,
            tz_offset_minutes: 0,
        }
    }

    pub fn with_offset(mut self, tz_offset_minutes: i32) -> Self {
        self.tz_offset_minutes = tz_offset_minutes;
        self
    }

    /// Whether the window wraps past midnight (e.g. 23:00-07:00).
    pub fn crosses_midnight(&self) -> bool {
        self.end <= self.start
    }

    fn offset(&self) -> Result<FixedOffset, ValidationError> {
        self.tz_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "tz_offset_minutes".to_string(),
                message: format!("{} is not a valid UTC offset", self.tz_offset_minutes),
            })
    }
}

impl Default for BlackoutWindow {
    /// 23:00 to 07:00 UTC.
    fn default() -> Self {
        Self::new(
            NaiveTime::from_hms_opt(23, 0, 0).unwrap_or(NaiveTime::MIN),
            NaiveTime::from_hms_opt(7, 0, 0).unwrap_or(NaiveTime::MIN),
        )
    }
}

impl FromStr for BlackoutWindow {
    type Err = ValidationError;

    /// Parse `"HH:MM-HH:MM"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |message: &str| ValidationError::InvalidValue {
            field: "blackout".to_string(),
            message: format!("{message}: '{s}'"),
        };

        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| invalid("expected HH:MM-HH:MM"))?;
        let start = NaiveTime::parse_from_str(start.trim(), "%H:%M")
            .map_err(|_| invalid("bad start time"))?;
        let end = NaiveTime::parse_from_str(end.trim(), "%H:%M")
            .map_err(|_| invalid("bad end time"))?;

        if start == end {
            return Err(invalid("start and end must differ"));
        }
        Ok(Self::new(start, end))
    }
}

/// Build a commitment covering every nightly window that touches
/// `[from, to)`, clipped to that range.
pub fn overnight_blackout(
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    window: &BlackoutWindow,
) -> Result<FixedCommitment, ValidationError> {
    if to <= from {
        return Err(ValidationError::InvalidTimeRange {
            start: from,
            end: to,
        });
    }
    if window.start == window.end {
        return Err(ValidationError::InvalidValue {
            field: "blackout".to_string(),
            message: "start and end must differ".to_string(),
        });
    }

    let offset = window.offset()?;
    // Start a day early so a window that began the previous evening is kept.
    let mut day = from.with_timezone(&offset).date_naive() - Duration::days(1);
    let last_day = to.with_timezone(&offset).date_naive();

    let mut occurrences = Vec::new();
    while day <= last_day {
        let local_start = day.and_time(window.start);
        let local_end = if window.crosses_midnight() {
            (day + Duration::days(1)).and_time(window.end)
        } else {
            day.and_time(window.end)
        };

        let start = offset
            .from_local_datetime(&local_start)
            .single()
            .map(|dt| dt.with_timezone(&Utc));
        let end = offset
            .from_local_datetime(&local_end)
            .single()
            .map(|dt| dt.with_timezone(&Utc));

        if let (Some(start), Some(end)) = (start, end) {
            if let Ok(clipped) = TimeInterval::new(start.max(from), end.min(to)) {
                occurrences.push(clipped);
            }
        }
        day += Duration::days(1);
    }

    Ok(FixedCommitment::new(BLACKOUT_NAME, occurrences))
}
