//! Events subcommand: list what a calendar file holds.

use std::path::PathBuf;

use calsync_core::MemoryEventStore;
use clap::Args;

use super::default_store_path;

#[derive(Args)]
pub struct EventsArgs {
    /// Calendar file (default: calendar.json in the config directory)
    #[arg(long)]
    store: Option<PathBuf>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: EventsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let path = match args.store {
        Some(path) => path,
        None => default_store_path()?,
    };
    let snapshot = MemoryEventStore::load(&path)?.snapshot();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    if snapshot.containers.is_empty() {
        println!("no calendars");
        return Ok(());
    }
    for container in &snapshot.containers {
        println!("{} ({})", container.spec.display_name, container.spec.name);
        let mut events: Vec<_> = snapshot
            .events
            .iter()
            .filter(|e| e.spec.container == container.id)
            .collect();
        events.sort_by_key(|e| e.spec.start);
        for event in events {
            let reminders: Vec<String> = event.reminders.iter().map(|m| format!("-{m}m")).collect();
            println!(
                "  {}  {}  [{}]  {}",
                event.spec.start.date_naive(),
                event.spec.title,
                reminders.join(", "),
                event.spec.description
            );
        }
    }
    Ok(())
}
