//! Reconciliation engine: purge the reminder calendar and rebuild it from
//! the current task list.
//!
//! A pass never diffs against what is already stored. Every pass deletes
//! all events in the calendar and writes the full set derived from the tasks,
//! so repeated passes converge on the same state no matter what happened to
//! the calendar in between.
//!
//! ## Pass outline
//!
//! ```text
//! kinds empty:     find calendar -> delete it if present
//! kinds non-empty: check access -> find or create (then re-check)
//!                  -> read tasks -> purge events -> insert events + reminders
//! ```

use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{debug, error, info, warn};

use crate::error::{PassError, StoreError};
use crate::model::{
    ContainerId, ContainerSpec, DateKind, EventSpec, ReminderEvent, SyncConfig, SyncKinds,
    TaskSnapshot,
};
use crate::reminder::reminder_lead;
use crate::storage::Settings;
use crate::store::{Collaborators, Notice};
use crate::sync::SharedConfig;

/// Static parameters of the engine, taken from the host settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub container: ContainerSpec,
    pub due_description: String,
    pub threshold_description: String,
    pub app_uri_base: Option<String>,
}

impl From<&Settings> for EngineOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            container: settings.container_spec(),
            due_description: settings.labels.due_description.clone(),
            threshold_description: settings.labels.threshold_description.clone(),
            app_uri_base: settings.app_uri_base.clone(),
        }
    }
}

/// What a successful pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Mirroring is off and there was no calendar (or no access to look).
    Idle,
    /// Mirroring is off; the calendar was deleted.
    Removed,
    /// The calendar was purged and rebuilt.
    Rebuilt { events: usize, reminders: usize },
}

/// Derive the events a pass writes for `tasks` under `config`.
///
/// Completed tasks are skipped. A task yields a due event, a threshold
/// event, both, or neither, depending on its dates and the mirrored kinds.
pub fn plan_events(
    tasks: &[TaskSnapshot],
    config: &SyncConfig,
    options: &EngineOptions,
    now: NaiveDateTime,
) -> Vec<ReminderEvent> {
    let mut events = Vec::new();
    for task in tasks.iter().filter(|t| !t.completed) {
        let dates = [
            (DateKind::Due, config.kinds.dues, task.due, &options.due_description),
            (
                DateKind::Threshold,
                config.kinds.thresholds,
                task.threshold,
                &options.threshold_description,
            ),
        ];
        for (kind, mirrored, date, description) in dates {
            let Some(date) = date.filter(|_| mirrored) else {
                continue;
            };
            events.push(ReminderEvent {
                kind,
                title: task.text.clone(),
                date,
                description: description.clone(),
                reminder_lead_minutes: reminder_lead(
                    date,
                    config.reminder_margin_minutes,
                    config.reminder_time,
                    now,
                ),
            });
        }
    }
    events
}

/// Runs reconciliation passes; only the scheduler's job calls it.
pub(crate) struct Reconciler {
    config: Arc<SharedConfig>,
    collaborators: Collaborators,
    options: EngineOptions,
}

impl Reconciler {
    pub(crate) fn new(
        config: Arc<SharedConfig>,
        collaborators: Collaborators,
        options: EngineOptions,
    ) -> Self {
        Self {
            config,
            collaborators,
            options,
        }
    }

    /// Run one pass for the scheduler. Failures are logged and reported to
    /// the user by [`Reconciler::reconcile`].
    pub(crate) fn run_pass(&self) {
        if let Ok(outcome) = self.reconcile() {
            debug!(?outcome, "reminder calendar reconciled");
        }
    }

    /// Run one pass and apply the failure policy: log, notify the user,
    /// and turn mirroring off when the calendar cannot be written at all.
    pub(crate) fn reconcile(&self) -> Result<PassOutcome, PassError> {
        let kinds = self.config.get().kinds;
        let result = self.try_pass(kinds);
        if let Err(err) = &result {
            self.handle_failure(err, kinds);
        }
        result
    }

    fn handle_failure(&self, err: &PassError, kinds: SyncKinds) {
        error!(error = %err, "error writing reminder calendar");
        if err.disables_sync() {
            // A toggle made while the pass ran wins over the reset.
            if self.config.disable_if(kinds) {
                warn!("calendar mirroring disabled until re-enabled");
            } else {
                debug!("mirrored kinds changed during the pass; keeping them");
            }
        }
        if err.is_user_visible() {
            self.collaborators
                .notifier
                .notify_user_error(Notice::CalendarWriteError);
        }
    }

    fn try_pass(&self, kinds: SyncKinds) -> Result<PassOutcome, PassError> {
        let store = &self.collaborators.store;
        debug!(kinds = kinds.bits(), "syncing due/threshold calendar reminders");

        if !self.collaborators.access.has_write_permission() {
            if kinds.is_empty() {
                debug!("no calendar access and mirroring is off; nothing to do");
                return Ok(PassOutcome::Idle);
            }
            return Err(PassError::PermissionDenied);
        }

        let found = match store.find_container(&self.options.container.name) {
            Err(StoreError::PermissionDenied) if kinds.is_empty() => {
                debug!("calendar query denied and mirroring is off; nothing to do");
                return Ok(PassOutcome::Idle);
            }
            other => other?,
        };

        if kinds.is_empty() {
            let Some(id) = found else {
                return Ok(PassOutcome::Idle);
            };
            let removed = store.delete_container(id)?;
            if removed == 1 {
                debug!("reminder calendar removed");
            } else {
                warn!(removed, "unexpected count while removing reminder calendar");
            }
            return Ok(PassOutcome::Removed);
        }

        let container = match found {
            Some(id) => id,
            None => self.create_container()?,
        };

        // Margin and time of day may have changed since the pass was
        // scheduled; the latest values apply.
        let config = SyncConfig {
            kinds,
            ..self.config.get()
        };
        let tasks = self.collaborators.tasks.list_tasks()?;
        let events = plan_events(&tasks, &config, &self.options, self.collaborators.clock.now());

        let purged = store.delete_events(container)?;
        debug!(purged, "purged reminder events");

        let mut reminders = 0;
        for event in &events {
            let mut spec = EventSpec::all_day(container, event);
            spec.app_uri = self
                .options
                .app_uri_base
                .as_ref()
                .map(|base| format!("{base}{}", event.title));
            let id = store.insert_event(&spec)?;
            if let Some(lead) = event.reminder_lead_minutes {
                store.insert_reminder(id, lead)?;
                reminders += 1;
            }
        }

        Ok(PassOutcome::Rebuilt {
            events: events.len(),
            reminders,
        })
    }

    /// Create the calendar and look it up again; some stores accept the
    /// insert without creating anything. Any failure here leaves no
    /// calendar behind, so it disables mirroring like a denied write.
    fn create_container(&self) -> Result<ContainerId, PassError> {
        let store = &self.collaborators.store;
        let spec = &self.options.container;
        let create_failed = |reason: StoreError| match reason {
            StoreError::PermissionDenied => PassError::PermissionDenied,
            reason => PassError::CreateFailed {
                name: spec.name.clone(),
                reason,
            },
        };
        store.create_container(spec).map_err(create_failed)?;
        match store.find_container(&spec.name).map_err(create_failed)? {
            Some(id) => {
                info!(calendar = %spec.name, "created reminder calendar");
                Ok(id)
            }
            None => Err(PassError::ContainerNotCreated {
                name: spec.name.clone(),
            }),
        }
    }
}
