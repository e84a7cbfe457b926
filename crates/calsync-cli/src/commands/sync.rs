//! Sync subcommand.
//!
//! Runs one reconciliation pass of a todo.txt list against a calendar file,
//! then saves the calendar and prints what it now holds.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use calsync_core::{
    CalendarSync, Collaborators, MemoryEventStore, Notice, Notifier, Settings, TodoTxtSource,
};
use clap::Args;

use super::{default_store_path, KindOverrides};

#[derive(Args)]
pub struct SyncArgs {
    /// todo.txt file to read tasks from
    #[arg(long)]
    todo: PathBuf,
    /// Calendar file (default: calendar.json in the config directory)
    #[arg(long)]
    store: Option<PathBuf>,
    #[command(flatten)]
    kinds: KindOverrides,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Keeps notices so the command can fail after the pass.
#[derive(Default)]
struct CollectedNotices(Mutex<Vec<Notice>>);

impl CollectedNotices {
    fn take(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl Notifier for CollectedNotices {
    fn notify_user_error(&self, notice: Notice) {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).push(notice);
    }
}

pub fn run(args: SyncArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.todo.is_file() {
        return Err(format!("task file not found: {}", args.todo.display()).into());
    }

    let mut settings = Settings::load()?;
    let kinds = args.kinds.apply(settings.sync_config().kinds);
    settings.calendar.sync_dues = kinds.dues;
    settings.calendar.sync_thresholds = kinds.thresholds;
    if !settings.platform_supported {
        println!("calendar provider unsupported; nothing to do");
        return Ok(());
    }

    let store_path = match args.store {
        Some(path) => path,
        None => default_store_path()?,
    };
    let store = Arc::new(MemoryEventStore::load(&store_path)?);
    let notices = Arc::new(CollectedNotices::default());
    let collaborators = Collaborators::new(store.clone(), Arc::new(TodoTxtSource::new(&args.todo)))
        .with_notifier(notices.clone());

    let sync = CalendarSync::new(&settings, collaborators)?;
    // With every kind off nothing is scheduled yet; this pass removes a
    // leftover calendar.
    sync.request_sync();
    let final_config = sync.shutdown();
    store.save(&store_path)?;

    if !notices.take().is_empty() {
        // Mirror the host behavior: a write failure switches mirroring off.
        if final_config.kinds.is_empty() {
            let mut saved = Settings::load()?;
            saved.calendar.sync_dues = false;
            saved.calendar.sync_thresholds = false;
            saved.save()?;
        }
        return Err("could not write the reminder calendar".into());
    }

    let container = store.container_named(&settings.calendar.calendar_name);
    let events = container
        .as_ref()
        .map(|c| store.events_in(c.id))
        .unwrap_or_default();
    let reminders: usize = events.iter().map(|e| e.reminders.len()).sum();

    if args.json {
        let summary = serde_json::json!({
            "calendar": settings.calendar.calendar_name,
            "exists": container.is_some(),
            "dues": final_config.kinds.dues,
            "thresholds": final_config.kinds.thresholds,
            "events": events.len(),
            "reminders": reminders,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if container.is_some() {
        println!(
            "{}: {} event(s), {} reminder(s)",
            settings.calendar.calendar_name,
            events.len(),
            reminders
        );
    } else {
        println!("mirroring is off; no reminder calendar");
    }
    Ok(())
}
