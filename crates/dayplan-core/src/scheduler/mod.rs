//! Plan generation.
//!
//! One generation call runs three stages over a schedule snapshot:
//! - Expands recurring events into occurrences within the horizon
//! - Ranks pending tasks by deadline, priority and creation order
//! - Places each task into the earliest free work-window span before its deadline
//!
//! Generation is all-or-nothing: any unplaceable task fails the call and no
//! partial plan is returned. Nothing is retained between calls.

mod placer;

pub use placer::{place, work_segments};

use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ScheduleError, ValidationError};
use crate::recurrence;
use crate::schedule::{EventOccurrence, PlanItem, ScheduleSnapshot, WorkWindow};
use crate::timeline::{rank, Interval};

/// Caps checked before any placement work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_events: usize,
    pub max_tasks: usize,
    pub max_horizon_days: u32,
    /// Total remaining effort over all pending tasks
    pub max_total_effort_minutes: i64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_events: 256,
            max_tasks: 512,
            max_horizon_days: 366,
            max_total_effort_minutes: 366 * 24 * 60,
        }
    }
}

/// Generator configuration
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Length of the planning horizon starting at "now"
    pub horizon_days: u32,
    pub work_window: WorkWindow,
    /// Offset used for calendar-day computations
    pub utc_offset: FixedOffset,
    pub limits: Limits,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            horizon_days: 7,
            work_window: WorkWindow::default(),
            utc_offset: Utc.fix(),
            limits: Limits::default(),
        }
    }
}

/// A successfully generated plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub horizon_start: DateTime<Utc>,
    pub horizon_end: DateTime<Utc>,
    /// Chronological events and placed tasks, followed by completed-task markers.
    pub items: Vec<PlanItem>,
}

/// Plan generator over schedule snapshots
#[derive(Debug, Clone, Default)]
pub struct ScheduleGenerator {
    config: GeneratorConfig,
}

impl ScheduleGenerator {
    /// Create a new generator with default config
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom config
    pub fn with_config(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate a plan for `snapshot` with the horizon starting at `now`.
    ///
    /// # Errors
    /// - `PreconditionViolated` if a record or the configuration is malformed
    /// - `ComplexityLimitExceeded` if the snapshot exceeds configured limits
    /// - `EventConflict` if two event occurrences in the horizon overlap
    /// - `Infeasible` if any task cannot be placed before its deadline
    pub fn generate(&self, snapshot: &ScheduleSnapshot, now: DateTime<Utc>) -> Result<Plan, ScheduleError> {
        self.validate(snapshot)?;
        self.check_limits(snapshot)?;

        let horizon = Interval::new(now, now + Duration::days(i64::from(self.config.horizon_days)));
        let offset = self.config.utc_offset;

        let occurrences = recurrence::expand(&snapshot.events, horizon.start, horizon.end, offset)?;
        check_event_conflicts(&occurrences)?;
        let busy = recurrence::expand_overlapping(&snapshot.events, horizon.start, horizon.end, offset)?;

        let ranking = rank(&snapshot.tasks, now);
        let placed = place(&busy, &ranking.pending, horizon, self.config.work_window, offset)?;

        let mut items: Vec<PlanItem> = occurrences.iter().map(PlanItem::from_occurrence).collect();
        items.extend(placed);
        items.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then_with(|| a.end.cmp(&b.end))
                .then_with(|| a.source_id.cmp(&b.source_id))
        });
        items.extend(
            ranking
                .completed
                .iter()
                .map(|task| PlanItem::completed_marker(task, horizon.start)),
        );

        tracing::info!(
            events = occurrences.len(),
            tasks = ranking.pending.len(),
            completed = ranking.completed.len(),
            items = items.len(),
            "generated plan"
        );

        Ok(Plan {
            horizon_start: horizon.start,
            horizon_end: horizon.end,
            items,
        })
    }

    fn validate(&self, snapshot: &ScheduleSnapshot) -> Result<(), ValidationError> {
        if self.config.horizon_days == 0 {
            return Err(ValidationError::EmptyHorizon);
        }
        if self.config.work_window.start == self.config.work_window.end {
            return Err(ValidationError::EmptyWorkWindow);
        }
        for event in &snapshot.events {
            event.validate()?;
        }
        for task in &snapshot.tasks {
            task.validate()?;
        }
        Ok(())
    }

    fn check_limits(&self, snapshot: &ScheduleSnapshot) -> Result<(), ScheduleError> {
        let limits = &self.config.limits;
        let exceeded = |what: &'static str, actual: u64, limit: u64| -> Result<(), ScheduleError> {
            tracing::warn!(what, actual, limit, "complexity limit exceeded");
            Err(ScheduleError::ComplexityLimitExceeded { what, actual, limit })
        };

        if snapshot.events.len() > limits.max_events {
            return exceeded("event count", snapshot.events.len() as u64, limits.max_events as u64);
        }
        if snapshot.tasks.len() > limits.max_tasks {
            return exceeded("task count", snapshot.tasks.len() as u64, limits.max_tasks as u64);
        }
        if self.config.horizon_days > limits.max_horizon_days {
            return exceeded(
                "horizon days",
                u64::from(self.config.horizon_days),
                u64::from(limits.max_horizon_days),
            );
        }
        let total_minutes: i64 = snapshot
            .tasks
            .iter()
            .map(|t| t.remaining_effort().num_minutes())
            .fold(0, i64::saturating_add);
        if total_minutes > limits.max_total_effort_minutes {
            return exceeded(
                "total remaining effort (minutes)",
                total_minutes.max(0) as u64,
                limits.max_total_effort_minutes.max(0) as u64,
            );
        }
        Ok(())
    }
}

/// Reject plans whose event occurrences overlap one another.
fn check_event_conflicts(occurrences: &[EventOccurrence]) -> Result<(), ScheduleError> {
    let mut latest: Option<&EventOccurrence> = None;
    for occurrence in occurrences {
        if let Some(prev) = latest {
            if occurrence.start < prev.end {
                tracing::warn!(first = %prev.event_id, second = %occurrence.event_id, "overlapping events");
                return Err(ScheduleError::EventConflict {
                    first: prev.name.clone(),
                    second: occurrence.name.clone(),
                    at: occurrence.start,
                });
            }
        }
        if latest.map_or(true, |prev| occurrence.end > prev.end) {
            latest = Some(occurrence);
        }
    }
    Ok(())
}

/// Generate with default limits and UTC day boundaries.
pub fn generate(
    snapshot: &ScheduleSnapshot,
    now: DateTime<Utc>,
    horizon_days: u32,
    work_window: WorkWindow,
) -> Result<Plan, ScheduleError> {
    ScheduleGenerator::with_config(GeneratorConfig {
        horizon_days,
        work_window,
        ..GeneratorConfig::default()
    })
    .generate(snapshot, now)
}
