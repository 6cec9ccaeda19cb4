//! Plan generation command for CLI.

use chrono::Utc;
use clap::Args;
use dayplan_core::{Config, PlanItemKind, ScheduleDb, ScheduleGenerator};

use super::{format_local, parse_datetime, schedule_for};

#[derive(Args)]
pub struct GenerateArgs {
    /// Owner identifier
    pub owner: String,
    /// Plan from this instant instead of the current time
    #[arg(long)]
    pub now: Option<String>,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: GenerateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let generator_config = config.generator_config()?;
    let offset = generator_config.utc_offset;
    let generator = ScheduleGenerator::with_config(generator_config);

    let db = ScheduleDb::open()?;
    let schedule = schedule_for(&db, &args.owner)?;
    let now = match args.now {
        Some(value) => parse_datetime(&value, offset)?,
        None => Utc::now(),
    };

    tracing::debug!(owner = %args.owner, schedule = %schedule.id, %now, "generating plan");
    let generated = db.generate_schedule(&schedule.id, &generator, now)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&generated)?);
        return Ok(());
    }

    println!(
        "Plan v{} for {} ({} to {})",
        generated.version,
        args.owner,
        format_local(generated.plan.horizon_start, offset),
        format_local(generated.plan.horizon_end, offset)
    );
    for item in &generated.plan.items {
        let kind = match item.kind {
            PlanItemKind::Event => "event",
            PlanItemKind::Task => "task",
        };
        println!(
            "  {} - {}  {:<5}  {}",
            format_local(item.start, offset),
            item.end.with_timezone(&offset).format("%H:%M"),
            kind,
            item.name
        );
    }
    Ok(())
}
