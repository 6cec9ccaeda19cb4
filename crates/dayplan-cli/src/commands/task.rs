//! Task management commands for CLI.

use clap::Subcommand;
use dayplan_core::{ScheduleDb, TaskDraft};

use super::{configured_offset, format_local, parse_datetime, schedule_for};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task to an owner's schedule
    Add {
        /// Owner identifier
        owner: String,
        /// Task name
        #[arg(long)]
        name: String,
        /// Deadline (RFC3339 or "YYYY-MM-DD HH:MM" in the configured offset)
        #[arg(long)]
        deadline: String,
        /// Expected effort in minutes
        #[arg(long)]
        minutes: i64,
        /// Priority 0-100 (default: 50)
        #[arg(long, default_value = "50")]
        priority: u8,
        /// Completion level 0-100 (default: 0)
        #[arg(long, default_value = "0")]
        completion: u8,
    },
    /// Edit a task; omitted fields keep their value
    Edit {
        owner: String,
        /// Task ID
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        deadline: Option<String>,
        #[arg(long)]
        minutes: Option<i64>,
        #[arg(long)]
        priority: Option<u8>,
        #[arg(long)]
        completion: Option<u8>,
    },
    /// Delete a task
    Delete {
        owner: String,
        /// Task ID
        id: String,
    },
    /// List tasks of one owner, or of every schedule
    List {
        owner: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = ScheduleDb::open()?;
    let offset = configured_offset()?;

    match action {
        TaskAction::Add {
            owner,
            name,
            deadline,
            minutes,
            priority,
            completion,
        } => {
            let schedule = schedule_for(&db, &owner)?;
            let draft = TaskDraft {
                name,
                deadline: parse_datetime(&deadline, offset)?,
                expected_minutes: minutes,
                completion_level: completion,
                priority,
            };
            let task = db.add_task(&schedule.id, &draft)?;
            println!("Task created: {}", task.id);
        }
        TaskAction::Edit {
            owner,
            id,
            name,
            deadline,
            minutes,
            priority,
            completion,
        } => {
            let schedule = schedule_for(&db, &owner)?;
            let current = db
                .tasks_for_schedule(&schedule.id)?
                .into_iter()
                .find(|t| t.id == id)
                .ok_or_else(|| format!("Task with ID '{id}' not found or not associated with schedule '{}'.", schedule.id))?;

            let draft = TaskDraft {
                name: name.unwrap_or(current.name),
                deadline: match deadline {
                    Some(d) => parse_datetime(&d, offset)?,
                    None => current.deadline,
                },
                expected_minutes: minutes.unwrap_or(current.expected_minutes),
                completion_level: completion.unwrap_or(current.completion_level),
                priority: priority.unwrap_or(current.priority),
            };
            db.edit_task(&schedule.id, &id, &draft)?;
            println!("Task updated: {id}");
        }
        TaskAction::Delete { owner, id } => {
            let schedule = schedule_for(&db, &owner)?;
            db.delete_task(&schedule.id, &id)?;
            println!("Task deleted: {id}");
        }
        TaskAction::List { owner, json } => {
            let tasks = match owner {
                Some(owner) => db.tasks_for_schedule(&schedule_for(&db, &owner)?.id)?,
                None => db.list_tasks()?,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else if tasks.is_empty() {
                println!("No tasks found.");
            } else {
                for task in &tasks {
                    println!(
                        "{}  {}  due {}  {}min  {}%  p{}",
                        task.id,
                        task.name,
                        format_local(task.deadline, offset),
                        task.expected_minutes,
                        task.completion_level,
                        task.priority
                    );
                }
            }
        }
    }
    Ok(())
}
