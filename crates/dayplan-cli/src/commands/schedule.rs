//! Schedule container commands for CLI.

use clap::Subcommand;
use dayplan_core::ScheduleDb;

use super::{configured_offset, format_local, schedule_for};

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Create the owner's schedule (prints the existing id if present)
    Init {
        /// Owner identifier
        #[arg(long)]
        owner: String,
    },
    /// Show a schedule with its events, tasks and latest plan version
    Show {
        /// Owner identifier
        owner: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all schedules
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: ScheduleAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = ScheduleDb::open()?;

    match action {
        ScheduleAction::Init { owner } => {
            let schedule = db.initialize_schedule(&owner)?;
            println!("{}", schedule.id);
        }
        ScheduleAction::Show { owner, json } => {
            let schedule = schedule_for(&db, &owner)?;
            let events = db.events_for_schedule(&schedule.id)?;
            let tasks = db.tasks_for_schedule(&schedule.id)?;

            if json {
                let value = serde_json::json!({
                    "schedule": schedule,
                    "events": events,
                    "tasks": tasks,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
                return Ok(());
            }

            let offset = configured_offset()?;
            println!("Schedule {} (owner: {}, version: {})", schedule.id, schedule.owner, schedule.timestamp);
            println!("Events ({}):", events.len());
            for event in &events {
                println!(
                    "  {}  {}  {} - {}  [{}]",
                    event.id,
                    event.name,
                    format_local(event.start, offset),
                    format_local(event.end, offset),
                    event.repeat.as_code()
                );
            }
            println!("Tasks ({}):", tasks.len());
            for task in &tasks {
                println!(
                    "  {}  {}  due {}  {}min  {}%  p{}",
                    task.id,
                    task.name,
                    format_local(task.deadline, offset),
                    task.expected_minutes,
                    task.completion_level,
                    task.priority
                );
            }
        }
        ScheduleAction::List { json } => {
            let schedules = db.list_schedules()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&schedules)?);
            } else if schedules.is_empty() {
                println!("No schedules found.");
            } else {
                for schedule in &schedules {
                    println!("{}  {}  v{}", schedule.id, schedule.owner, schedule.timestamp);
                }
            }
        }
    }
    Ok(())
}
