//! Sync state machine.
//!
//! `CalendarSync` owns the live [`SyncConfig`] and the debounced worker.
//! The mirrored kinds are the state:
//!
//! ```text
//! NONE <-> DUES <-> DUES|THRESHOLDS <-> THRESHOLDS <-> NONE
//! ```
//!
//! Any change of kinds schedules a reconciliation pass. Reminder margin and
//! time of day are plain config fields: changing them schedules nothing, but
//! the next pass reads their latest values. All methods return immediately;
//! store I/O happens on the worker.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::engine::{EngineOptions, Reconciler};
use crate::error::{ConfigError, CoreError};
use crate::model::{SyncConfig, SyncKinds};
use crate::reminder::{time_of_day_from_minutes, MINUTES_PER_DAY};
use crate::scheduler::Debouncer;
use crate::storage::Settings;
use crate::store::Collaborators;

/// Config shared between the state machine and the worker.
#[derive(Debug, Default)]
pub(crate) struct SharedConfig {
    inner: Mutex<SyncConfig>,
}

impl SharedConfig {
    pub(crate) fn new(config: SyncConfig) -> Self {
        Self {
            inner: Mutex::new(config),
        }
    }

    pub(crate) fn get(&self) -> SyncConfig {
        *self.lock()
    }

    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut SyncConfig) -> R) -> R {
        f(&mut self.lock())
    }

    /// Turn mirroring off without scheduling anything, unless the kinds no
    /// longer equal `expected`. Returns whether they were reset.
    pub(crate) fn disable_if(&self, expected: SyncKinds) -> bool {
        let mut config = self.lock();
        if config.kinds != expected {
            return false;
        }
        config.kinds = SyncKinds::NONE;
        true
    }

    fn lock(&self) -> MutexGuard<'_, SyncConfig> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keeps the reminder calendar in step with the task list.
pub struct CalendarSync {
    config: Arc<SharedConfig>,
    scheduler: Debouncer,
    platform_supported: bool,
}

impl CalendarSync {
    /// Start a sync instance with the mirrored kinds, reminder preferences,
    /// and calendar identity from `settings`. If any kind is enabled, a
    /// first pass is scheduled.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid or the worker cannot be
    /// started.
    pub fn new(settings: &Settings, collaborators: Collaborators) -> Result<Self, CoreError> {
        settings.validate()?;
        let initial = settings.sync_config();
        let config = Arc::new(SharedConfig::new(SyncConfig {
            kinds: SyncKinds::NONE,
            ..initial
        }));

        let reconciler = Reconciler::new(
            Arc::clone(&config),
            collaborators,
            EngineOptions::from(settings),
        );
        let scheduler = Debouncer::start(settings.debounce(), move || reconciler.run_pass())?;

        let sync = Self {
            config,
            scheduler,
            platform_supported: settings.platform_supported,
        };
        sync.configure(initial.kinds.dues, initial.kinds.thresholds);
        Ok(sync)
    }

    /// Set both mirrored kinds at once.
    pub fn configure(&self, mirror_dues: bool, mirror_thresholds: bool) {
        self.change_kinds(|_| SyncKinds::new(mirror_dues, mirror_thresholds));
    }

    pub fn set_mirror_dues(&self, enabled: bool) {
        self.change_kinds(|kinds| kinds.with_dues(enabled));
    }

    pub fn set_mirror_thresholds(&self, enabled: bool) {
        self.change_kinds(|kinds| kinds.with_thresholds(enabled));
    }

    /// Reminders fire `days` days before the event date.
    pub fn set_reminder_margin_days(&self, days: u32) {
        let minutes = days.saturating_mul(MINUTES_PER_DAY);
        self.config
            .update(|cfg| cfg.reminder_margin_minutes = minutes);
    }

    /// Reminders fire at this time of day, given in minutes since midnight.
    ///
    /// # Errors
    ///
    /// Returns an error if `minutes` is not below 1440.
    pub fn set_reminder_time_of_day(&self, minutes: u32) -> Result<(), ConfigError> {
        let time = time_of_day_from_minutes(minutes).ok_or_else(|| ConfigError::InvalidValue {
            key: "reminder_time".into(),
            message: format!("{minutes} is not a time of day"),
        })?;
        self.config.update(|cfg| cfg.reminder_time = time);
        Ok(())
    }

    /// Schedule a pass, e.g. after the task list changed.
    pub fn request_sync(&self) {
        if !self.platform_supported {
            return;
        }
        self.scheduler.request();
    }

    pub fn kinds(&self) -> SyncKinds {
        self.config.get().kinds
    }

    pub fn config(&self) -> SyncConfig {
        self.config.get()
    }

    pub fn is_platform_supported(&self) -> bool {
        self.platform_supported
    }

    /// Number of passes the worker has finished.
    pub fn completed_passes(&self) -> u64 {
        self.scheduler.completed_runs()
    }

    /// Stop the worker, running a pending pass first. Returns the config
    /// as the last pass left it.
    pub fn shutdown(self) -> SyncConfig {
        self.scheduler.shutdown();
        self.config.get()
    }

    fn change_kinds(&self, f: impl FnOnce(SyncKinds) -> SyncKinds) {
        let changed = self.config.update(|cfg| {
            let kinds = f(cfg.kinds);
            if kinds == cfg.kinds {
                return None;
            }
            if !self.platform_supported {
                cfg.kinds = SyncKinds::NONE;
                return None;
            }
            cfg.kinds = kinds;
            Some(kinds)
        });

        match changed {
            Some(kinds) => {
                debug!(dues = kinds.dues, thresholds = kinds.thresholds, "mirrored kinds changed");
                self.scheduler.request();
            }
            None if !self.platform_supported => {
                debug!("calendar provider unsupported; mirroring stays off");
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskSnapshot;
    use crate::store::MemoryEventStore;
    use chrono::NaiveTime;
    use std::time::{Duration, Instant};

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.scheduler.debounce_ms = 50;
        settings
    }

    fn start(settings: &Settings) -> (Arc<MemoryEventStore>, CalendarSync) {
        let store = Arc::new(MemoryEventStore::new());
        let tasks = Arc::new(vec![TaskSnapshot::new("t")]);
        let sync = CalendarSync::new(settings, Collaborators::new(store.clone(), tasks)).unwrap();
        (store, sync)
    }

    fn wait_for_passes(sync: &CalendarSync, n: u64) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while sync.completed_passes() < n && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn starts_with_configured_kinds_and_schedules() {
        let mut settings = settings();
        settings.calendar.sync_dues = true;
        let (store, sync) = start(&settings);
        assert_eq!(sync.kinds(), SyncKinds::new(true, false));

        wait_for_passes(&sync, 1);
        assert!(store.container_named("calsync_reminders").is_some());
    }

    #[test]
    fn disabled_start_schedules_nothing() {
        let (_store, sync) = start(&settings());
        std::thread::sleep(Duration::from_millis(200));
        assert_eq!(sync.completed_passes(), 0);
    }

    #[test]
    fn unchanged_kinds_schedule_nothing() {
        let (_store, sync) = start(&settings());
        sync.set_mirror_dues(false);
        sync.set_mirror_thresholds(false);
        std::thread::sleep(Duration::from_millis(200));
        assert_eq!(sync.completed_passes(), 0);
    }

    #[test]
    fn toggles_update_kinds() {
        let (_store, sync) = start(&settings());
        sync.set_mirror_dues(true);
        sync.set_mirror_thresholds(true);
        assert_eq!(sync.kinds().bits(), 3);
        sync.set_mirror_dues(false);
        assert_eq!(sync.kinds(), SyncKinds::new(false, true));
        sync.configure(false, false);
        assert!(sync.kinds().is_empty());
    }

    #[test]
    fn margin_and_time_only_change_config() {
        let (_store, sync) = start(&settings());
        sync.set_reminder_margin_days(3);
        sync.set_reminder_time_of_day(9 * 60 + 15).unwrap();
        assert!(sync.set_reminder_time_of_day(24 * 60).is_err());

        let cfg = sync.config();
        assert_eq!(cfg.reminder_margin_minutes, 3 * 1440);
        assert_eq!(cfg.reminder_time, NaiveTime::from_hms_opt(9, 15, 0).unwrap());
        std::thread::sleep(Duration::from_millis(200));
        assert_eq!(sync.completed_passes(), 0);
    }

    #[test]
    fn closed_platform_gate_forces_kinds_off() {
        let mut settings = settings();
        settings.platform_supported = false;
        settings.calendar.sync_dues = true;
        let (store, sync) = start(&settings);

        assert!(sync.kinds().is_empty());
        sync.set_mirror_thresholds(true);
        sync.request_sync();
        assert!(sync.kinds().is_empty());

        std::thread::sleep(Duration::from_millis(200));
        assert_eq!(sync.completed_passes(), 0);
        assert!(store.container_named("calsync_reminders").is_none());
    }

    #[test]
    fn disable_only_resets_unchanged_kinds() {
        let config = SharedConfig::new(SyncConfig {
            kinds: SyncKinds::new(true, false),
            ..SyncConfig::default()
        });
        assert!(!config.disable_if(SyncKinds::new(true, true)));
        assert_eq!(config.get().kinds, SyncKinds::new(true, false));

        assert!(config.disable_if(SyncKinds::new(true, false)));
        assert!(config.get().kinds.is_empty());
    }

    #[test]
    fn shutdown_runs_pending_pass() {
        let mut settings = settings();
        settings.scheduler.debounce_ms = 60_000;
        let (store, sync) = start(&settings);
        sync.set_mirror_dues(true);
        sync.shutdown();
        assert!(store.container_named("calsync_reminders").is_some());
    }
}
