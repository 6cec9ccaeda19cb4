pub mod config;
pub mod event;
pub mod generate;
pub mod schedule;
pub mod task;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use dayplan_core::{Config, ScheduleDb, ScheduleRecord};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Resolve an owner to their schedule.
pub(crate) fn schedule_for(db: &ScheduleDb, owner: &str) -> CliResult<ScheduleRecord> {
    db.schedule_by_owner(owner)?.ok_or_else(|| {
        format!("no schedule for owner '{owner}' (run `schedule init --owner {owner}` first)").into()
    })
}

/// UTC offset configured for calendar days.
pub(crate) fn configured_offset() -> CliResult<FixedOffset> {
    Ok(Config::load_or_default().generator_config()?.utc_offset)
}

/// Parse RFC3339, or `YYYY-MM-DD HH:MM` / `YYYY-MM-DDTHH:MM` in the configured offset.
pub(crate) fn parse_datetime(value: &str, offset: FixedOffset) -> CliResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            if let Some(local) = offset.from_local_datetime(&naive).single() {
                return Ok(local.with_timezone(&Utc));
            }
        }
    }
    Err(format!("invalid datetime '{value}' (expected RFC3339 or YYYY-MM-DD HH:MM)").into())
}

/// Render an instant in the configured offset.
pub(crate) fn format_local(dt: DateTime<Utc>, offset: FixedOffset) -> String {
    dt.with_timezone(&offset).format("%Y-%m-%d %H:%M").to_string()
}
