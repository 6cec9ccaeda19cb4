//! Recurring event commands for CLI.

use clap::Subcommand;
use dayplan_core::{EventDraft, RepeatRule, ScheduleDb};

use super::{configured_offset, format_local, parse_datetime, schedule_for};

#[derive(Subcommand)]
pub enum EventAction {
    /// Add an event to an owner's schedule
    Add {
        /// Owner identifier
        owner: String,
        /// Event name
        #[arg(long)]
        name: String,
        /// Start (RFC3339 or "YYYY-MM-DD HH:MM" in the configured offset)
        #[arg(long)]
        start: String,
        /// End
        #[arg(long)]
        end: String,
        /// none, daily, weekly:<days> (0=Sunday), monthly or yearly
        #[arg(long, default_value = "none")]
        repeat: String,
    },
    /// Edit an event; omitted fields keep their value
    Edit {
        owner: String,
        /// Event ID
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        repeat: Option<String>,
    },
    /// Delete an event
    Delete {
        owner: String,
        /// Event ID
        id: String,
    },
    /// List events of one owner, or of every schedule
    List {
        owner: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: EventAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = ScheduleDb::open()?;
    let offset = configured_offset()?;

    match action {
        EventAction::Add {
            owner,
            name,
            start,
            end,
            repeat,
        } => {
            let schedule = schedule_for(&db, &owner)?;
            let draft = EventDraft {
                name,
                start: parse_datetime(&start, offset)?,
                end: parse_datetime(&end, offset)?,
                repeat: RepeatRule::parse(&repeat)?,
            };
            let event = db.add_event(&schedule.id, &draft)?;
            println!("Event created: {}", event.id);
        }
        EventAction::Edit {
            owner,
            id,
            name,
            start,
            end,
            repeat,
        } => {
            let schedule = schedule_for(&db, &owner)?;
            let current = db
                .events_for_schedule(&schedule.id)?
                .into_iter()
                .find(|e| e.id == id)
                .ok_or_else(|| format!("Event with ID '{id}' not found or not associated with schedule '{}'.", schedule.id))?;

            let draft = EventDraft {
                name: name.unwrap_or(current.name),
                start: match start {
                    Some(s) => parse_datetime(&s, offset)?,
                    None => current.start,
                },
                end: match end {
                    Some(s) => parse_datetime(&s, offset)?,
                    None => current.end,
                },
                repeat: match repeat {
                    Some(r) => RepeatRule::parse(&r)?,
                    None => current.repeat,
                },
            };
            db.edit_event(&schedule.id, &id, &draft)?;
            println!("Event updated: {id}");
        }
        EventAction::Delete { owner, id } => {
            let schedule = schedule_for(&db, &owner)?;
            db.delete_event(&schedule.id, &id)?;
            println!("Event deleted: {id}");
        }
        EventAction::List { owner, json } => {
            let events = match owner {
                Some(owner) => db.events_for_schedule(&schedule_for(&db, &owner)?.id)?,
                None => db.list_events()?,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&events)?);
            } else if events.is_empty() {
                println!("No events found.");
            } else {
                for event in &events {
                    println!(
                        "{}  {}  {} - {}  [{}]",
                        event.id,
                        event.name,
                        format_local(event.start, offset),
                        format_local(event.end, offset),
                        event.repeat.as_code()
                    );
                }
            }
        }
    }
    Ok(())
}
