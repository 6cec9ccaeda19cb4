//! SQLite-based storage for schedules, their events and tasks, and generated plans.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::data_dir;
use super::migrations;
use crate::error::{CoreError, DatabaseError, Result};
use crate::schedule::{PlanItem, RecurringEvent, RepeatRule, ScheduleSnapshot, Task};
use crate::scheduler::{Plan, ScheduleGenerator};

const EVENT_COLUMNS: &str = "id, name, start_time, end_time, repeat";
const TASK_COLUMNS: &str = "id, name, deadline, expected_minutes, completion_level, priority, created_at";

// === Helper Functions ===

/// Format a datetime for database storage
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Parse an RFC3339 column, reporting the column index on failure
fn parse_datetime(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Parse a repeat rule column
fn parse_repeat(idx: usize, value: &str) -> rusqlite::Result<RepeatRule> {
    RepeatRule::parse(value).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Build a RecurringEvent from a row selected with `EVENT_COLUMNS`
fn row_to_event(row: &rusqlite::Row) -> rusqlite::Result<RecurringEvent> {
    let start: String = row.get(2)?;
    let end: String = row.get(3)?;
    let repeat: String = row.get(4)?;
    Ok(RecurringEvent {
        id: row.get(0)?,
        name: row.get(1)?,
        start: parse_datetime(2, &start)?,
        end: parse_datetime(3, &end)?,
        repeat: parse_repeat(4, &repeat)?,
    })
}

/// Build a Task from a row selected with `TASK_COLUMNS`
fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    let deadline: String = row.get(2)?;
    let created_at: String = row.get(6)?;
    Ok(Task {
        id: row.get(0)?,
        name: row.get(1)?,
        deadline: parse_datetime(2, &deadline)?,
        expected_minutes: row.get(3)?,
        completion_level: row.get(4)?,
        priority: row.get(5)?,
        created_at: parse_datetime(6, &created_at)?,
    })
}

fn row_to_schedule(row: &rusqlite::Row) -> rusqlite::Result<ScheduleRecord> {
    let created_at: String = row.get(3)?;
    Ok(ScheduleRecord {
        id: row.get(0)?,
        owner: row.get(1)?,
        timestamp: row.get(2)?,
        created_at: parse_datetime(3, &created_at)?,
    })
}

/// One owner's schedule container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub id: String,
    pub owner: String,
    /// Incremented on every successful generation
    pub timestamp: i64,
    pub created_at: DateTime<Utc>,
}

/// Fields of an event as supplied by a caller; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub repeat: RepeatRule,
}

impl EventDraft {
    fn to_event(&self, id: &str) -> RecurringEvent {
        RecurringEvent {
            id: id.to_string(),
            name: self.name.clone(),
            start: self.start,
            end: self.end,
            repeat: self.repeat.clone(),
        }
    }
}

/// Fields of a task as supplied by a caller; the store assigns id and creation time.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub name: String,
    pub deadline: DateTime<Utc>,
    pub expected_minutes: i64,
    pub completion_level: u8,
    pub priority: u8,
}

impl TaskDraft {
    fn to_task(&self, id: &str, created_at: DateTime<Utc>) -> Task {
        Task {
            id: id.to_string(),
            name: self.name.clone(),
            deadline: self.deadline,
            expected_minutes: self.expected_minutes,
            completion_level: self.completion_level,
            priority: self.priority,
            created_at,
        }
    }
}

/// A plan persisted by a successful generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSchedule {
    pub schedule_id: String,
    /// Schedule timestamp after the generation that produced this plan
    pub version: i64,
    pub generated_at: DateTime<Utc>,
    pub plan: Plan,
}

/// SQLite database for schedule storage.
///
/// Every event and task belongs to exactly one schedule; edits and deletes
/// are rejected when the record is not associated with the given schedule.
pub struct ScheduleDb {
    conn: Connection,
}

impl ScheduleDb {
    /// Open the schedule database at `<data_dir>/dayplan.db`.
    ///
    /// Creates tables if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("dayplan.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    // === Schedules ===

    /// Return the owner's schedule, creating it on first call.
    pub fn initialize_schedule(&self, owner: &str) -> Result<ScheduleRecord> {
        if let Some(existing) = self.schedule_by_owner(owner)? {
            tracing::debug!(owner, schedule = %existing.id, "schedule already exists");
            return Ok(existing);
        }

        let record = ScheduleRecord {
            id: Uuid::new_v4().to_string(),
            owner: owner.to_string(),
            timestamp: 0,
            created_at: Utc::now(),
        };
        self.conn.execute(
            "INSERT INTO schedules (id, owner, timestamp, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                record.id,
                record.owner,
                record.timestamp,
                format_datetime(&record.created_at)
            ],
        )?;
        tracing::info!(owner, schedule = %record.id, "created schedule");
        Ok(record)
    }

    pub fn schedule_by_owner(&self, owner: &str) -> Result<Option<ScheduleRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, owner, timestamp, created_at FROM schedules WHERE owner = ?1",
                params![owner],
                row_to_schedule,
            )
            .optional()?;
        Ok(record)
    }

    pub fn get_schedule(&self, schedule_id: &str) -> Result<Option<ScheduleRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, owner, timestamp, created_at FROM schedules WHERE id = ?1",
                params![schedule_id],
                row_to_schedule,
            )
            .optional()?;
        Ok(record)
    }

    pub fn list_schedules(&self) -> Result<Vec<ScheduleRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, owner, timestamp, created_at FROM schedules ORDER BY created_at, rowid")?;
        let rows = stmt.query_map([], row_to_schedule)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn require_schedule(&self, schedule_id: &str) -> Result<ScheduleRecord> {
        self.get_schedule(schedule_id)?
            .ok_or_else(|| DatabaseError::ScheduleNotFound(schedule_id.to_string()).into())
    }

    // === Events ===

    /// Add an event to a schedule and return it with its new id.
    pub fn add_event(&self, schedule_id: &str, draft: &EventDraft) -> Result<RecurringEvent> {
        self.require_schedule(schedule_id)?;
        let event = draft.to_event(&Uuid::new_v4().to_string());
        event.validate()?;

        self.conn.execute(
            "INSERT INTO events (id, schedule_id, name, start_time, end_time, repeat)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                event.id,
                schedule_id,
                event.name,
                format_datetime(&event.start),
                format_datetime(&event.end),
                event.repeat.as_code()
            ],
        )?;
        tracing::debug!(schedule = schedule_id, event = %event.id, "added event");
        Ok(event)
    }

    /// Replace every field of an existing event.
    pub fn edit_event(&self, schedule_id: &str, event_id: &str, draft: &EventDraft) -> Result<RecurringEvent> {
        self.require_schedule(schedule_id)?;
        let event = draft.to_event(event_id);
        event.validate()?;

        let changed = self.conn.execute(
            "UPDATE events SET name = ?1, start_time = ?2, end_time = ?3, repeat = ?4
             WHERE id = ?5 AND schedule_id = ?6",
            params![
                event.name,
                format_datetime(&event.start),
                format_datetime(&event.end),
                event.repeat.as_code(),
                event_id,
                schedule_id
            ],
        )?;
        if changed == 0 {
            return Err(not_associated("Event", event_id, schedule_id));
        }
        Ok(event)
    }

    pub fn delete_event(&self, schedule_id: &str, event_id: &str) -> Result<()> {
        self.require_schedule(schedule_id)?;
        let changed = self.conn.execute(
            "DELETE FROM events WHERE id = ?1 AND schedule_id = ?2",
            params![event_id, schedule_id],
        )?;
        if changed == 0 {
            return Err(not_associated("Event", event_id, schedule_id));
        }
        Ok(())
    }

    pub fn get_event(&self, event_id: &str) -> Result<Option<RecurringEvent>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1");
        Ok(self.conn.query_row(&sql, params![event_id], row_to_event).optional()?)
    }

    /// Events of one schedule in insertion order.
    pub fn events_for_schedule(&self, schedule_id: &str) -> Result<Vec<RecurringEvent>> {
        self.require_schedule(schedule_id)?;
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE schedule_id = ?1 ORDER BY rowid");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![schedule_id], row_to_event)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn list_events(&self) -> Result<Vec<RecurringEvent>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY rowid");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_event)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // === Tasks ===

    /// Add a task to a schedule and return it with its new id.
    pub fn add_task(&self, schedule_id: &str, draft: &TaskDraft) -> Result<Task> {
        self.require_schedule(schedule_id)?;
        let task = draft.to_task(&Uuid::new_v4().to_string(), Utc::now());
        task.validate()?;

        self.conn.execute(
            "INSERT INTO tasks (id, schedule_id, name, deadline, expected_minutes,
                                completion_level, priority, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                task.id,
                schedule_id,
                task.name,
                format_datetime(&task.deadline),
                task.expected_minutes,
                task.completion_level,
                task.priority,
                format_datetime(&task.created_at)
            ],
        )?;
        tracing::debug!(schedule = schedule_id, task = %task.id, "added task");
        Ok(task)
    }

    /// Replace every caller-supplied field of an existing task; creation time is kept.
    pub fn edit_task(&self, schedule_id: &str, task_id: &str, draft: &TaskDraft) -> Result<Task> {
        self.require_schedule(schedule_id)?;
        if !self.task_belongs_to(task_id, schedule_id)? {
            return Err(not_associated("Task", task_id, schedule_id));
        }
        let existing = self
            .get_task(task_id)?
            .ok_or_else(|| not_associated("Task", task_id, schedule_id))?;

        let task = draft.to_task(task_id, existing.created_at);
        task.validate()?;

        self.conn.execute(
            "UPDATE tasks SET name = ?1, deadline = ?2, expected_minutes = ?3,
                              completion_level = ?4, priority = ?5
             WHERE id = ?6 AND schedule_id = ?7",
            params![
                task.name,
                format_datetime(&task.deadline),
                task.expected_minutes,
                task.completion_level,
                task.priority,
                task_id,
                schedule_id
            ],
        )?;
        Ok(task)
    }

    pub fn delete_task(&self, schedule_id: &str, task_id: &str) -> Result<()> {
        self.require_schedule(schedule_id)?;
        let changed = self.conn.execute(
            "DELETE FROM tasks WHERE id = ?1 AND schedule_id = ?2",
            params![task_id, schedule_id],
        )?;
        if changed == 0 {
            return Err(not_associated("Task", task_id, schedule_id));
        }
        Ok(())
    }

    pub fn get_task(&self, task_id: &str) -> Result<Option<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1");
        Ok(self.conn.query_row(&sql, params![task_id], row_to_task).optional()?)
    }

    fn task_belongs_to(&self, task_id: &str, schedule_id: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE id = ?1 AND schedule_id = ?2",
            params![task_id, schedule_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Tasks of one schedule in insertion order.
    pub fn tasks_for_schedule(&self, schedule_id: &str) -> Result<Vec<Task>> {
        self.require_schedule(schedule_id)?;
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE schedule_id = ?1 ORDER BY rowid");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![schedule_id], row_to_task)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY rowid");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_task)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // === Generation ===

    /// Current events and tasks of a schedule.
    pub fn snapshot(&self, schedule_id: &str) -> Result<ScheduleSnapshot> {
        Ok(ScheduleSnapshot {
            events: self.events_for_schedule(schedule_id)?,
            tasks: self.tasks_for_schedule(schedule_id)?,
        })
    }

    /// Generate a plan from the schedule's current records and persist it.
    ///
    /// On success the schedule timestamp is incremented and the plan is
    /// stored under the new value. On failure nothing is written.
    ///
    /// # Errors
    /// Returns `CoreError::Schedule` with the generator's error unchanged
    /// when generation fails, or a database error.
    pub fn generate_schedule(
        &self,
        schedule_id: &str,
        generator: &ScheduleGenerator,
        now: DateTime<Utc>,
    ) -> Result<GeneratedSchedule> {
        let schedule = self.require_schedule(schedule_id)?;
        let snapshot = self.snapshot(schedule_id)?;

        let plan = generator.generate(&snapshot, now).map_err(|e| {
            tracing::warn!(schedule = schedule_id, error = %e, "generation failed");
            CoreError::Schedule(e)
        })?;

        let version = schedule.timestamp + 1;
        let items = serde_json::to_string(&plan.items)?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE schedules SET timestamp = ?1 WHERE id = ?2",
            params![version, schedule_id],
        )?;
        tx.execute(
            "INSERT INTO generated_plans (schedule_id, version, generated_at, horizon_start, horizon_end, items)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                schedule_id,
                version,
                format_datetime(&now),
                format_datetime(&plan.horizon_start),
                format_datetime(&plan.horizon_end),
                items
            ],
        )?;
        tx.commit()?;

        tracing::info!(schedule = schedule_id, version, items = plan.items.len(), "stored plan");
        Ok(GeneratedSchedule {
            schedule_id: schedule_id.to_string(),
            version,
            generated_at: now,
            plan,
        })
    }

    /// Most recently stored plan of a schedule, if any generation succeeded.
    pub fn latest_plan(&self, schedule_id: &str) -> Result<Option<GeneratedSchedule>> {
        self.require_schedule(schedule_id)?;
        let row = self
            .conn
            .query_row(
                "SELECT version, generated_at, horizon_start, horizon_end, items
                 FROM generated_plans WHERE schedule_id = ?1
                 ORDER BY version DESC LIMIT 1",
                params![schedule_id],
                |row| {
                    let generated_at: String = row.get(1)?;
                    let horizon_start: String = row.get(2)?;
                    let horizon_end: String = row.get(3)?;
                    Ok((
                        row.get::<_, i64>(0)?,
                        parse_datetime(1, &generated_at)?,
                        parse_datetime(2, &horizon_start)?,
                        parse_datetime(3, &horizon_end)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((version, generated_at, horizon_start, horizon_end, items_json)) = row else {
            return Ok(None);
        };
        let items: Vec<PlanItem> = serde_json::from_str(&items_json)?;
        Ok(Some(GeneratedSchedule {
            schedule_id: schedule_id.to_string(),
            version,
            generated_at,
            plan: Plan {
                horizon_start,
                horizon_end,
                items,
            },
        }))
    }
}

fn not_associated(kind: &'static str, id: &str, schedule_id: &str) -> CoreError {
    DatabaseError::NotFound {
        kind,
        id: id.to_string(),
        schedule: schedule_id.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ScheduleError, ValidationError};
    use crate::schedule::PlanItemKind;
    use chrono::{Duration, TimeZone};

    fn dt(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, d, h, m, 0).unwrap()
    }

    fn standup() -> EventDraft {
        EventDraft {
            name: "Standup".into(),
            start: dt(10, 9, 0),
            end: dt(10, 9, 30),
            repeat: RepeatRule::Weekly { days: vec![1, 2, 3, 4, 5] },
        }
    }

    fn report(deadline: DateTime<Utc>, minutes: i64) -> TaskDraft {
        TaskDraft {
            name: "Report".into(),
            deadline,
            expected_minutes: minutes,
            completion_level: 0,
            priority: 80,
        }
    }

    #[test]
    fn initialize_schedule_is_idempotent_per_owner() {
        let db = ScheduleDb::open_memory().unwrap();
        let first = db.initialize_schedule("alice").unwrap();
        let again = db.initialize_schedule("alice").unwrap();
        let other = db.initialize_schedule("bob").unwrap();

        assert_eq!(first.id, again.id);
        assert_ne!(first.id, other.id);
        assert_eq!(first.timestamp, 0);
        assert_eq!(db.list_schedules().unwrap().len(), 2);
        assert_eq!(db.schedule_by_owner("alice").unwrap().unwrap().id, first.id);
        assert!(db.schedule_by_owner("carol").unwrap().is_none());
    }

    #[test]
    fn event_crud_round_trip() {
        let db = ScheduleDb::open_memory().unwrap();
        let schedule = db.initialize_schedule("alice").unwrap();

        let event = db.add_event(&schedule.id, &standup()).unwrap();
        assert_eq!(db.get_event(&event.id).unwrap().unwrap(), event);

        let mut draft = standup();
        draft.name = "Sync".into();
        draft.repeat = RepeatRule::Daily;
        db.edit_event(&schedule.id, &event.id, &draft).unwrap();
        let stored = db.get_event(&event.id).unwrap().unwrap();
        assert_eq!(stored.name, "Sync");
        assert_eq!(stored.repeat, RepeatRule::Daily);

        db.delete_event(&schedule.id, &event.id).unwrap();
        assert!(db.get_event(&event.id).unwrap().is_none());
        assert!(db.events_for_schedule(&schedule.id).unwrap().is_empty());
    }

    #[test]
    fn add_event_rejects_invalid_records() {
        let db = ScheduleDb::open_memory().unwrap();
        let schedule = db.initialize_schedule("alice").unwrap();

        let mut inverted = standup();
        inverted.end = inverted.start - Duration::minutes(1);
        let err = db.add_event(&schedule.id, &inverted).unwrap_err();
        assert_eq!(err.to_string(), "Event start time must be before end time.");

        let mut no_days = standup();
        no_days.repeat = RepeatRule::Weekly { days: vec![] };
        let err = db.add_event(&schedule.id, &no_days).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::WeeklyWithoutDays)));

        assert!(db.list_events().unwrap().is_empty());
    }

    #[test]
    fn missing_schedule_is_reported_by_id() {
        let db = ScheduleDb::open_memory().unwrap();
        let err = db.add_event("nope", &standup()).unwrap_err();
        assert_eq!(err.to_string(), "Database error: Schedule with ID nope not found.");
    }

    #[test]
    fn edits_across_schedules_are_rejected() {
        let db = ScheduleDb::open_memory().unwrap();
        let alice = db.initialize_schedule("alice").unwrap();
        let bob = db.initialize_schedule("bob").unwrap();
        let event = db.add_event(&alice.id, &standup()).unwrap();
        let task = db.add_task(&alice.id, &report(dt(12, 17, 0), 60)).unwrap();

        let err = db.edit_event(&bob.id, &event.id, &standup()).unwrap_err();
        assert!(err.to_string().contains("not found or not associated"));
        let err = db.delete_task(&bob.id, &task.id).unwrap_err();
        assert!(err.to_string().contains("not found or not associated"));
        let err = db.edit_task(&bob.id, &task.id, &report(dt(12, 17, 0), 30)).unwrap_err();
        assert!(err.to_string().contains("not found or not associated"));

        assert_eq!(db.get_task(&task.id).unwrap().unwrap().expected_minutes, 60);
    }

    #[test]
    fn task_crud_keeps_creation_time() {
        let db = ScheduleDb::open_memory().unwrap();
        let schedule = db.initialize_schedule("alice").unwrap();
        let task = db.add_task(&schedule.id, &report(dt(12, 17, 0), 60)).unwrap();

        let mut draft = report(dt(13, 17, 0), 90);
        draft.completion_level = 50;
        let edited = db.edit_task(&schedule.id, &task.id, &draft).unwrap();
        assert_eq!(edited.created_at, task.created_at);

        let stored = db.get_task(&task.id).unwrap().unwrap();
        assert_eq!(stored, edited);
        assert_eq!(stored.completion_level, 50);

        let mut bad = draft.clone();
        bad.priority = 101;
        let err = db.edit_task(&schedule.id, &task.id, &bad).unwrap_err();
        assert_eq!(err.to_string(), "Priority must be between 0 and 100.");

        db.delete_task(&schedule.id, &task.id).unwrap();
        assert!(db.list_tasks().unwrap().is_empty());
    }

    #[test]
    fn tasks_for_schedule_keeps_insertion_order() {
        let db = ScheduleDb::open_memory().unwrap();
        let schedule = db.initialize_schedule("alice").unwrap();
        let ids: Vec<String> = (0..3)
            .map(|i| {
                let mut draft = report(dt(12, 17, 0), 30);
                draft.name = format!("Task {i}");
                db.add_task(&schedule.id, &draft).unwrap().id
            })
            .collect();

        let listed: Vec<String> = db
            .tasks_for_schedule(&schedule.id)
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(listed, ids);
    }

    #[test]
    fn generate_schedule_stores_plan_and_bumps_timestamp() {
        let db = ScheduleDb::open_memory().unwrap();
        let schedule = db.initialize_schedule("alice").unwrap();
        db.add_event(&schedule.id, &standup()).unwrap();
        db.add_task(&schedule.id, &report(dt(12, 17, 0), 60)).unwrap();
        assert!(db.latest_plan(&schedule.id).unwrap().is_none());

        let generator = ScheduleGenerator::new();
        let generated = db.generate_schedule(&schedule.id, &generator, dt(10, 0, 0)).unwrap();
        assert_eq!(generated.version, 1);
        assert!(generated
            .plan
            .items
            .iter()
            .any(|item| item.kind == PlanItemKind::Task && item.name == "Report"));

        let stored = db.latest_plan(&schedule.id).unwrap().unwrap();
        assert_eq!(stored, generated);
        assert_eq!(db.get_schedule(&schedule.id).unwrap().unwrap().timestamp, 1);

        let second = db.generate_schedule(&schedule.id, &generator, dt(10, 1, 0)).unwrap();
        assert_eq!(second.version, 2);
        assert_eq!(db.latest_plan(&schedule.id).unwrap().unwrap().version, 2);
    }

    #[test]
    fn failed_generation_writes_nothing() {
        let db = ScheduleDb::open_memory().unwrap();
        let schedule = db.initialize_schedule("alice").unwrap();
        // 20 hours of work before a deadline 2 hours away
        db.add_task(&schedule.id, &report(dt(10, 10, 0), 20 * 60)).unwrap();

        let err = db
            .generate_schedule(&schedule.id, &ScheduleGenerator::new(), dt(10, 8, 0))
            .unwrap_err();
        assert!(matches!(err, CoreError::Schedule(ScheduleError::Infeasible { .. })));
        assert_eq!(
            err.to_string(),
            "Not all tasks could be scheduled within the planning horizon or available time slots."
        );
        assert_eq!(db.get_schedule(&schedule.id).unwrap().unwrap().timestamp, 0);
        assert!(db.latest_plan(&schedule.id).unwrap().is_none());
    }

    #[test]
    fn oversized_effort_reports_complexity_limit() {
        let db = ScheduleDb::open_memory().unwrap();
        let schedule = db.initialize_schedule("alice").unwrap();
        db.add_task(&schedule.id, &report(dt(12, 17, 0), 1_000_000_000_000_000))
            .unwrap();

        let err = db
            .generate_schedule(&schedule.id, &ScheduleGenerator::new(), dt(10, 0, 0))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Schedule(ScheduleError::ComplexityLimitExceeded { .. })
        ));
        assert_eq!(db.get_schedule(&schedule.id).unwrap().unwrap().timestamp, 0);
    }

    #[test]
    fn open_at_persists_between_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dayplan.db");
        let id = {
            let db = ScheduleDb::open_at(&path).unwrap();
            db.initialize_schedule("alice").unwrap().id
        };
        let db = ScheduleDb::open_at(&path).unwrap();
        assert_eq!(db.schedule_by_owner("alice").unwrap().unwrap().id, id);
    }
}
