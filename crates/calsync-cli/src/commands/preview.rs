//! Preview subcommand: the events a sync would write, computed without
//! touching any calendar.

use std::path::PathBuf;

use calsync_core::{
    plan_events, Clock, DateKind, EngineOptions, Settings, SystemClock, TaskSource, TodoTxtSource,
};
use clap::Args;

use super::KindOverrides;

#[derive(Args)]
pub struct PreviewArgs {
    /// todo.txt file to read tasks from
    #[arg(long)]
    todo: PathBuf,
    #[command(flatten)]
    kinds: KindOverrides,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: PreviewArgs) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;
    let mut config = settings.sync_config();
    config.kinds = args.kinds.apply(config.kinds);

    let tasks = TodoTxtSource::new(&args.todo).list_tasks()?;
    let events = plan_events(
        &tasks,
        &config,
        &EngineOptions::from(&settings),
        SystemClock.now(),
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }

    if config.kinds.is_empty() {
        println!("mirroring is off");
        return Ok(());
    }
    if events.is_empty() {
        println!("no events");
        return Ok(());
    }
    for event in &events {
        let kind = match event.kind {
            DateKind::Due => "due",
            DateKind::Threshold => "threshold",
        };
        let reminder = match event.reminder_lead_minutes {
            Some(lead) => format!("{lead} min before"),
            None => "no reminder".to_string(),
        };
        println!("{}  {kind:<9}  {reminder:<18}  {}", event.date, event.title);
    }
    Ok(())
}
