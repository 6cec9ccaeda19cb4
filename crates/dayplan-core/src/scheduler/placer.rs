//! Greedy slot placement.
//!
//! Each ranked task takes the earliest free span of sufficient length inside
//! the work windows that ends by `min(deadline, horizon end)`. Busy time is
//! threaded through the loop as an [`IntervalSet`] value. The first task that
//! does not fit aborts the whole placement.

use chrono::{DateTime, FixedOffset, Utc};

use crate::error::ScheduleError;
use crate::schedule::{EventOccurrence, PlanItem, PlanItemKind, WorkWindow};
use crate::timeline::{Interval, IntervalSet, RankedTask, TimeGapDetector};

/// Work-window segments covering the horizon, in chronological order.
pub fn work_segments(horizon: Interval, window: WorkWindow, offset: FixedOffset) -> Vec<Interval> {
    let first = horizon.start.with_timezone(&offset).date_naive();
    // A window wrapping midnight may have opened the day before.
    let first = first.pred_opt().unwrap_or(first);
    let last = horizon.end.with_timezone(&offset).date_naive();

    first
        .iter_days()
        .take_while(|date| *date <= last)
        .filter_map(|date| {
            let (open, close) = window.bounds_on(date, offset);
            Interval::new(open, close).clamp_to(&horizon)
        })
        .collect()
}

/// Place every ranked task, in order, or fail on the first that cannot fit.
///
/// Returns one task plan item per ranked task, in placement order.
pub fn place(
    occurrences: &[EventOccurrence],
    ranked: &[RankedTask<'_>],
    horizon: Interval,
    window: WorkWindow,
    offset: FixedOffset,
) -> Result<Vec<PlanItem>, ScheduleError> {
    let segments = work_segments(horizon, window, offset);
    let busy = IntervalSet::from_intervals(occurrences.iter().map(|o| Interval::new(o.start, o.end)));

    tracing::debug!(
        segments = segments.len(),
        busy_intervals = busy.len(),
        tasks = ranked.len(),
        "placing tasks"
    );

    let (_, placed) = ranked.iter().try_fold(
        (busy, Vec::with_capacity(ranked.len())),
        |(busy, mut placed), entry| {
            let deadline = entry.task.deadline.min(horizon.end);
            match find_slot(&busy, &segments, entry, deadline) {
                Some(slot) => {
                    tracing::debug!(task = %entry.task.id, start = %slot.start, end = %slot.end, "placed task");
                    placed.push(PlanItem {
                        kind: PlanItemKind::Task,
                        name: entry.task.name.clone(),
                        source_id: entry.task.id.clone(),
                        start: slot.start,
                        end: slot.end,
                    });
                    Ok((busy.with(slot), placed))
                }
                None => {
                    tracing::warn!(
                        task = %entry.task.id,
                        overdue = entry.overdue,
                        remaining_minutes = entry.remaining.num_minutes(),
                        "no free span before deadline"
                    );
                    Err(ScheduleError::Infeasible {
                        task_id: entry.task.id.clone(),
                        task_name: entry.task.name.clone(),
                    })
                }
            }
        },
    )?;

    Ok(placed)
}

/// Earliest `[start, start + remaining)` inside a segment, clear of `busy`, ending by `deadline`.
///
/// Only gaps long enough for the task are considered, so the first one found
/// is the earliest candidate and either meets the deadline or nothing later does.
fn find_slot(
    busy: &IntervalSet,
    segments: &[Interval],
    entry: &RankedTask<'_>,
    deadline: DateTime<Utc>,
) -> Option<Interval> {
    let detector = TimeGapDetector::new().with_min_gap(entry.remaining);
    segments
        .iter()
        .flat_map(|segment| detector.find_gaps(busy, segment.start, segment.end))
        .next()
        .and_then(|gap| gap.fit_before(entry.remaining, deadline))
}
