//! Schedule records: recurring events, tasks, work windows and plan items.
//!
//! Events and tasks are owned by a schedule and edited by the storage layer.
//! The generator treats them as a read-only snapshot; plan items and event
//! occurrences exist only for the duration of one generation call.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Suffix appended to the display name of tasks that need no more work.
pub const COMPLETED_SUFFIX: &str = " (Completed)";

/// How often a recurring event repeats.
///
/// Weekly days use 0=Sun ... 6=Sat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "frequency", rename_all = "snake_case")]
pub enum RepeatRule {
    None,
    Daily,
    Weekly { days: Vec<u8> },
    Monthly,
    Yearly,
}

impl RepeatRule {
    /// Parse the CLI/database spelling: `none`, `daily`, `weekly:1,3,5`, `monthly`, `yearly`.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let lower = s.trim().to_ascii_lowercase();
        let (head, tail) = match lower.split_once(':') {
            Some((h, t)) => (h, Some(t)),
            None => (lower.as_str(), None),
        };
        match head {
            "daily" => Ok(Self::Daily),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            "weekly" => {
                let mut days = Vec::new();
                for part in tail.unwrap_or("").split(',').filter(|p| !p.trim().is_empty()) {
                    let day: u8 = part
                        .trim()
                        .parse()
                        .map_err(|_| ValidationError::UnknownRepeat(s.to_string()))?;
                    days.push(day);
                }
                Ok(Self::Weekly { days })
            }
            "none" | "" => Ok(Self::None),
            _ => Err(ValidationError::UnknownRepeat(s.to_string())),
        }
    }

    /// Inverse of [`RepeatRule::parse`].
    pub fn as_code(&self) -> String {
        match self {
            Self::None => "none".into(),
            Self::Daily => "daily".into(),
            Self::Weekly { days } => {
                let days: Vec<String> = days.iter().map(|d| d.to_string()).collect();
                format!("weekly:{}", days.join(","))
            }
            Self::Monthly => "monthly".into(),
            Self::Yearly => "yearly".into(),
        }
    }
}

/// A fixed event definition owned by a schedule.
///
/// `start`/`end` anchor the time of day (and, for monthly/yearly rules,
/// the day of month and month). For `RepeatRule::None` they are the
/// event's only occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringEvent {
    pub id: String,
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub repeat: RepeatRule,
}

impl RecurringEvent {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Check the invariants the expander relies on.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyEventName);
        }
        if self.start >= self.end {
            return Err(ValidationError::EventTimeRange);
        }
        if let RepeatRule::Weekly { days } = &self.repeat {
            if days.is_empty() {
                return Err(ValidationError::WeeklyWithoutDays);
            }
            if let Some(bad) = days.iter().find(|d| **d > 6) {
                return Err(ValidationError::InvalidWeekday(*bad));
            }
        }
        Ok(())
    }
}

/// A unit of deadline-bound work owned by a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub deadline: DateTime<Utc>,
    /// Total expected effort in minutes.
    pub expected_minutes: i64,
    /// 0-100
    pub completion_level: u8,
    /// 0-100, higher is more important
    pub priority: u8,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Expected effort scaled by the incomplete fraction, at millisecond
    /// resolution. Saturates at `Duration::MAX` when the effort is too large
    /// to represent.
    pub fn remaining_effort(&self) -> Duration {
        let incomplete = 100 - i64::from(self.completion_level.min(100));
        self.expected_minutes
            .checked_mul(60_000)
            .and_then(|ms| ms.checked_mul(incomplete))
            .and_then(|ms| Duration::try_milliseconds(ms / 100))
            .unwrap_or(Duration::MAX)
    }

    /// True when no work remains and the task only needs a completed marker.
    pub fn is_satisfied(&self) -> bool {
        self.remaining_effort() <= Duration::zero()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyTaskName);
        }
        if self.expected_minutes <= 0 {
            return Err(ValidationError::NonPositiveEffort);
        }
        if self.priority > 100 {
            return Err(ValidationError::PriorityOutOfRange);
        }
        if self.completion_level > 100 {
            return Err(ValidationError::CompletionOutOfRange);
        }
        Ok(())
    }
}

/// The part of each calendar day eligible for task placement.
///
/// An `end` earlier than `start` wraps past midnight (e.g. 22:00-06:00).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl WorkWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, ValidationError> {
        if start == end {
            return Err(ValidationError::EmptyWorkWindow);
        }
        Ok(Self { start, end })
    }

    /// Build from `HH:MM` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, ValidationError> {
        Self::new(parse_time_of_day(start)?, parse_time_of_day(end)?)
    }

    pub fn wraps_midnight(&self) -> bool {
        self.end < self.start
    }

    /// Absolute bounds of the window that opens on `date` in the given offset.
    pub fn bounds_on(&self, date: NaiveDate, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
        let open = local_instant(date, self.start, offset);
        let close_date = if self.wraps_midnight() {
            date.succ_opt().unwrap_or(date)
        } else {
            date
        };
        (open, local_instant(close_date, self.end, offset))
    }
}

impl Default for WorkWindow {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
            end: NaiveTime::from_hms_opt(22, 0, 0).unwrap_or_default(),
        }
    }
}

/// Parse an `HH:MM` time of day.
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|_| ValidationError::InvalidTimeOfDay(s.to_string()))
}

/// The UTC instant of a wall-clock time on a date in a fixed offset.
pub fn local_instant(date: NaiveDate, time: NaiveTime, offset: FixedOffset) -> DateTime<Utc> {
    let naive = date.and_time(time);
    match offset.from_local_datetime(&naive).single() {
        Some(dt) => dt.with_timezone(&Utc),
        // Fixed offsets never produce ambiguous local times.
        None => Utc.from_utc_datetime(&naive),
    }
}

/// Current definitions of one schedule, as handed to the generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSnapshot {
    pub events: Vec<RecurringEvent>,
    pub tasks: Vec<Task>,
}

/// One concrete interval produced by expanding a recurring event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOccurrence {
    pub event_id: String,
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Whether a plan item came from an event or a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanItemKind {
    Event,
    Task,
}

/// One entry of a generated plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanItem {
    #[serde(rename = "type")]
    pub kind: PlanItemKind,
    pub name: String,
    pub source_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl PlanItem {
    pub fn from_occurrence(occurrence: &EventOccurrence) -> Self {
        Self {
            kind: PlanItemKind::Event,
            name: occurrence.name.clone(),
            source_id: occurrence.event_id.clone(),
            start: occurrence.start,
            end: occurrence.end,
        }
    }

    /// A zero-duration marker for a task that needs no more work.
    pub fn completed_marker(task: &Task, at: DateTime<Utc>) -> Self {
        Self {
            kind: PlanItemKind::Task,
            name: format!("{}{}", task.name, COMPLETED_SUFFIX),
            source_id: task.id.clone(),
            start: at,
            end: at,
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Half-open overlap test; zero-duration items never overlap anything.
    pub fn overlaps(&self, other: &PlanItem) -> bool {
        self.start < self.end && other.start < other.end && self.start < other.end && other.start < self.end
    }
}
