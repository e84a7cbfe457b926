//! End-to-end tests for the calendar sync.
//!
//! Each test drives a `CalendarSync` through its public setters against an
//! in-memory calendar store, then waits for the debounced worker to settle
//! before checking the calendar contents.

use calsync_core::{
    CalendarSync, Clock, Collaborators, MemoryEventStore, Notice, Notifier, Settings,
    SourceError, SyncKinds, TaskSnapshot, TaskSource, WriteAccess,
};
use chrono::{NaiveDate, NaiveDateTime};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const CALENDAR: &str = "calsync_reminders";
const DEBOUNCE_MS: u64 = 80;

// ============================================================================
// Test Collaborators
// ============================================================================

struct FixedClock(NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

#[derive(Default)]
struct TaskList {
    tasks: Mutex<Vec<TaskSnapshot>>,
    reads: AtomicUsize,
}

impl TaskList {
    fn replace(&self, tasks: Vec<TaskSnapshot>) {
        *self.tasks.lock().unwrap() = tasks;
    }
}

impl TaskSource for TaskList {
    fn list_tasks(&self) -> Result<Vec<TaskSnapshot>, SourceError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.tasks.lock().unwrap().clone())
    }
}

#[derive(Default)]
struct Permission {
    denied: AtomicBool,
}

impl WriteAccess for Permission {
    fn has_write_permission(&self) -> bool {
        !self.denied.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct Toasts(Mutex<Vec<&'static str>>);

impl Notifier for Toasts {
    fn notify_user_error(&self, notice: Notice) {
        self.0.lock().unwrap().push(notice.key());
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

struct Fixture {
    store: Arc<MemoryEventStore>,
    tasks: Arc<TaskList>,
    permission: Arc<Permission>,
    toasts: Arc<Toasts>,
    sync: CalendarSync,
}

impl Fixture {
    fn start(dues: bool, thresholds: bool) -> Self {
        let mut settings = Settings::default();
        settings.scheduler.debounce_ms = DEBOUNCE_MS;
        settings.calendar.sync_dues = dues;
        settings.calendar.sync_thresholds = thresholds;
        Self::with_settings(&settings)
    }

    fn with_settings(settings: &Settings) -> Self {
        let store = Arc::new(MemoryEventStore::new());
        let tasks = Arc::new(TaskList::default());
        let permission = Arc::new(Permission::default());
        let toasts = Arc::new(Toasts::default());
        let now = date(2026, 10, 17).and_hms_opt(8, 0, 0).unwrap();
        let collaborators = Collaborators::new(store.clone(), tasks.clone())
            .with_access(permission.clone())
            .with_notifier(toasts.clone())
            .with_clock(Arc::new(FixedClock(now)));
        let sync = CalendarSync::new(settings, collaborators).unwrap();
        Self {
            store,
            tasks,
            permission,
            toasts,
            sync,
        }
    }

    /// Wait until at least `n` passes finished and the worker stayed idle
    /// for a few debounce windows.
    fn settle(&self, n: u64) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while self.sync.completed_passes() < n && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        thread::sleep(Duration::from_millis(DEBOUNCE_MS * 4));
    }

    fn calendar_exists(&self) -> bool {
        self.store.container_named(CALENDAR).is_some()
    }

    fn titles(&self) -> Vec<String> {
        let Some(container) = self.store.container_named(CALENDAR) else {
            return Vec::new();
        };
        let mut titles: Vec<String> = self
            .store
            .events_in(container.id)
            .into_iter()
            .map(|e| e.spec.title)
            .collect();
        titles.sort();
        titles
    }
}

// ============================================================================
// Scheduling
// ============================================================================

#[test]
fn ten_rapid_requests_run_one_pass() {
    let f = Fixture::start(false, false);
    f.tasks
        .replace(vec![TaskSnapshot::new("Pay rent").with_due(date(2026, 11, 1))]);
    f.sync.set_mirror_dues(true);
    for _ in 0..10 {
        f.sync.request_sync();
    }

    f.settle(1);
    assert_eq!(f.sync.completed_passes(), 1);
    assert_eq!(f.tasks.reads.load(Ordering::SeqCst), 1);
    assert_eq!(f.titles(), vec!["Pay rent".to_string()]);
}

#[test]
fn task_change_notification_rebuilds_calendar() {
    let f = Fixture::start(true, false);
    f.tasks
        .replace(vec![TaskSnapshot::new("Old").with_due(date(2026, 11, 1))]);
    f.settle(1);
    assert_eq!(f.titles(), vec!["Old".to_string()]);

    f.tasks.replace(vec![
        TaskSnapshot::new("New").with_due(date(2026, 11, 2)),
        TaskSnapshot::new("Done").with_due(date(2026, 11, 3)).completed(),
    ]);
    f.sync.request_sync();
    f.settle(2);
    assert_eq!(f.titles(), vec!["New".to_string()]);
}

#[test]
fn margin_change_applies_to_pending_pass() {
    let mut settings = Settings::default();
    settings.scheduler.debounce_ms = 300;
    let f = Fixture::with_settings(&settings);
    f.tasks
        .replace(vec![TaskSnapshot::new("Dentist").with_due(date(2026, 11, 1))]);

    f.sync.set_mirror_dues(true);
    // Still inside the quiet period: the pending pass must see these.
    f.sync.set_reminder_margin_days(2);
    f.sync.set_reminder_time_of_day(9 * 60).unwrap();
    f.settle(1);

    let container = f.store.container_named(CALENDAR).unwrap();
    let events = f.store.events_in(container.id);
    assert_eq!(events.len(), 1);
    // Two days before at 09:00 is 39 hours before the all-day start.
    assert_eq!(events[0].reminders, vec![39 * 60]);
}

// ============================================================================
// Calendar existence follows the mirrored kinds
// ============================================================================

#[test]
fn calendar_exists_iff_kinds_enabled() {
    let f = Fixture::start(false, false);
    f.tasks.replace(vec![TaskSnapshot::new("Both")
        .with_due(date(2026, 12, 1))
        .with_threshold(date(2026, 11, 20))]);

    f.sync.set_mirror_thresholds(true);
    f.settle(1);
    assert!(f.calendar_exists());
    assert_eq!(f.titles().len(), 1);

    f.sync.set_mirror_dues(true);
    f.settle(2);
    assert_eq!(f.titles(), vec!["Both".to_string(), "Both".to_string()]);

    f.sync.configure(false, false);
    f.settle(3);
    assert!(!f.calendar_exists());
    assert!(f.store.snapshot().events.is_empty());
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn permission_loss_disables_mirroring_until_reenabled() {
    let f = Fixture::start(true, false);
    f.tasks
        .replace(vec![TaskSnapshot::new("Call").with_due(date(2026, 11, 1))]);
    f.settle(1);
    assert!(f.calendar_exists());

    f.permission.denied.store(true, Ordering::SeqCst);
    f.tasks
        .replace(vec![TaskSnapshot::new("Changed").with_due(date(2026, 11, 5))]);
    f.sync.request_sync();
    f.settle(2);

    assert_eq!(f.sync.kinds(), SyncKinds::NONE);
    assert_eq!(*f.toasts.0.lock().unwrap(), vec!["calendar_write_error"]);
    // Nothing was written during the denied pass.
    assert_eq!(f.titles(), vec!["Call".to_string()]);

    // Re-enabling with access restored schedules a fresh pass.
    f.permission.denied.store(false, Ordering::SeqCst);
    f.sync.set_mirror_dues(true);
    f.settle(3);
    assert_eq!(f.titles(), vec!["Changed".to_string()]);
}

#[test]
fn panicking_task_source_does_not_stop_future_passes() {
    struct Flaky {
        calls: AtomicUsize,
    }

    impl TaskSource for Flaky {
        fn list_tasks(&self) -> Result<Vec<TaskSnapshot>, SourceError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("task list corrupted");
            }
            Ok(vec![TaskSnapshot::new("Recovered").with_due(date(2026, 11, 1))])
        }
    }

    let mut settings = Settings::default();
    settings.scheduler.debounce_ms = DEBOUNCE_MS;
    settings.calendar.sync_dues = true;
    let store = Arc::new(MemoryEventStore::new());
    let sync = CalendarSync::new(
        &settings,
        Collaborators::new(store.clone(), Arc::new(Flaky { calls: AtomicUsize::new(0) })),
    )
    .unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while sync.completed_passes() < 1 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    sync.request_sync();
    sync.shutdown();

    let container = store.container_named(CALENDAR).unwrap();
    assert_eq!(store.events_in(container.id).len(), 1);
}
