//! # Dayplan Core Library
//!
//! Turns a set of recurring events and deadline-bound tasks into a concrete,
//! non-overlapping plan over a fixed horizon. All operations are available
//! through the standalone `dayplan-cli` binary, which is a thin layer over
//! this library.
//!
//! ## Architecture
//!
//! - **Recurrence**: Expands recurring event definitions into occurrences
//! - **Timeline**: Interval sets, free-gap detection and task ranking
//! - **Scheduler**: Greedy earliest-fit placement with all-or-nothing failure
//! - **Storage**: SQLite-backed schedules and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`ScheduleGenerator`]: Stateless plan generation over a snapshot
//! - [`ScheduleDb`]: Schedule, event, task and plan persistence
//! - [`Config`]: Application configuration management

pub mod error;
pub mod recurrence;
pub mod schedule;
pub mod scheduler;
pub mod storage;
pub mod timeline;

pub use error::{ConfigError, CoreError, DatabaseError, ScheduleError, ValidationError};
pub use schedule::{
    EventOccurrence, PlanItem, PlanItemKind, RecurringEvent, RepeatRule, ScheduleSnapshot, Task, WorkWindow,
};
pub use scheduler::{GeneratorConfig, Limits, Plan, ScheduleGenerator};
pub use storage::{Config, EventDraft, GeneratedSchedule, ScheduleDb, ScheduleRecord, TaskDraft};
pub use timeline::{Interval, IntervalSet, TimeGap};
