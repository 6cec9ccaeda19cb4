//! Expansion of recurring event definitions into concrete occurrences.
//!
//! Every occurrence keeps the anchor's time of day and duration. The anchor's
//! calendar date only contributes its day of month and month. Each rule
//! becomes an RRULE that the `rrule` crate expands in the schedule's fixed
//! UTC offset:
//! - `none`: the anchor itself
//! - `daily`: every day
//! - `weekly`: days whose weekday is in the rule's set
//! - `monthly`: the anchor's day of month, clamped to the month's last day
//! - `yearly`: the anchor's month and day, Feb 29 clamped to Feb 28

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use rrule::RRuleSet;

use crate::error::ValidationError;
use crate::schedule::{local_instant, EventOccurrence, RecurringEvent, RepeatRule};

/// RRULE weekday codes indexed 0=Sun ... 6=Sat.
const WEEKDAY_CODES: [&str; 7] = ["SU", "MO", "TU", "WE", "TH", "FR", "SA"];

/// Occurrences starting inside `[horizon_start, horizon_end)`, sorted by start.
///
/// An occurrence starting before `horizon_start` is dropped even if it is
/// still running; durations are never truncated.
pub fn expand(
    events: &[RecurringEvent],
    horizon_start: DateTime<Utc>,
    horizon_end: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<Vec<EventOccurrence>, ValidationError> {
    let mut occurrences: Vec<EventOccurrence> = expand_overlapping(events, horizon_start, horizon_end, offset)?
        .into_iter()
        .filter(|o| o.start >= horizon_start)
        .collect();
    sort_occurrences(&mut occurrences);
    Ok(occurrences)
}

/// Occurrences intersecting `[horizon_start, horizon_end)`, including ones
/// already in progress at `horizon_start`. Used to compute busy time.
pub fn expand_overlapping(
    events: &[RecurringEvent],
    horizon_start: DateTime<Utc>,
    horizon_end: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<Vec<EventOccurrence>, ValidationError> {
    let mut occurrences = Vec::new();
    if horizon_end <= horizon_start {
        return Ok(occurrences);
    }

    for event in events {
        let duration = event.duration();
        if duration <= Duration::zero() {
            continue;
        }
        for start in occurrence_starts(event, horizon_start - duration, horizon_end, offset)? {
            let end = start + duration;
            if start < horizon_end && end > horizon_start {
                occurrences.push(EventOccurrence {
                    event_id: event.id.clone(),
                    name: event.name.clone(),
                    start,
                    end,
                });
            }
        }
    }

    sort_occurrences(&mut occurrences);
    Ok(occurrences)
}

fn sort_occurrences(occurrences: &mut [EventOccurrence]) {
    occurrences.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| a.end.cmp(&b.end))
            .then_with(|| a.event_id.cmp(&b.event_id))
    });
}

/// The RRULE body for a repeating rule, or `None` when the rule never repeats.
fn rrule_body(rule: &RepeatRule, anchor: NaiveDate) -> Option<String> {
    match rule {
        RepeatRule::None => None,
        RepeatRule::Daily => Some("FREQ=DAILY".into()),
        RepeatRule::Weekly { days } => {
            let codes: Vec<&str> = days
                .iter()
                .filter_map(|d| WEEKDAY_CODES.get(usize::from(*d)).copied())
                .collect();
            (!codes.is_empty()).then(|| format!("FREQ=WEEKLY;BYDAY={}", codes.join(",")))
        }
        RepeatRule::Monthly => Some(format!("FREQ=MONTHLY;{}", month_day_clause(anchor.day()))),
        RepeatRule::Yearly => Some(format!(
            "FREQ=YEARLY;BYMONTH={};{}",
            anchor.month(),
            month_day_clause(anchor.day())
        )),
    }
}

/// `BYMONTHDAY` selecting `day`, or the month's last day in shorter months.
fn month_day_clause(day: u32) -> String {
    if day <= 28 {
        return format!("BYMONTHDAY={day}");
    }
    let candidates: Vec<String> = (28..=day).map(|d| d.to_string()).collect();
    format!("BYMONTHDAY={};BYSETPOS=-1", candidates.join(","))
}

/// Wall-clock time in the offset, presented to `rrule` as if it were UTC.
///
/// Fixed offsets have no gaps or folds, so expanding in wall-clock time and
/// mapping back with [`local_instant`] is exact.
fn wall_clock(naive: NaiveDateTime) -> DateTime<rrule::Tz> {
    let tz: rrule::Tz = Utc.into();
    Utc.from_utc_datetime(&naive).with_timezone(&tz)
}

/// Start instants of `event` on local days touching `[from, to]`.
fn occurrence_starts(
    event: &RecurringEvent,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<Vec<DateTime<Utc>>, ValidationError> {
    let anchor = event.start.with_timezone(&offset);
    let anchor_time = anchor.time();
    let Some(body) = rrule_body(&event.repeat, anchor.date_naive()) else {
        return Ok(match event.repeat {
            RepeatRule::None => vec![event.start],
            _ => Vec::new(),
        });
    };

    let first = from.with_timezone(&offset).date_naive();
    let last = to.with_timezone(&offset).date_naive();
    if last < first {
        return Ok(Vec::new());
    }

    // DTSTART sits before the first requested day so it is never emitted itself.
    let dtstart = anchor
        .date_naive()
        .min(first.pred_opt().unwrap_or(first))
        .and_time(anchor_time);
    let source = format!("DTSTART:{}Z\nRRULE:{body}", dtstart.format("%Y%m%dT%H%M%S"));
    let set: RRuleSet = source.parse::<RRuleSet>().map_err(|e| ValidationError::InvalidRecurrence {
        event: event.id.clone(),
        message: e.to_string(),
    })?;

    let day_start = |date: NaiveDate| date.and_time(NaiveTime::MIN);
    let after = wall_clock(day_start(first)) - Duration::seconds(1);
    let before = wall_clock(day_start(last) + Duration::days(1));
    let limit = u16::try_from((last - first).num_days() + 2).unwrap_or(u16::MAX);
    let result = set.after(after).before(before).all(limit);

    Ok(result
        .dates
        .iter()
        .map(|dt| dt.date_naive())
        .filter(|date| (first..=last).contains(date))
        .map(|date| local_instant(date, anchor_time, offset))
        .collect())
}
