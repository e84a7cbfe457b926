//! Boundary traits for the collaborators the sync core depends on.
//!
//! Every collaborator is synchronous and is called only from the sync
//! worker thread. Implementations are shared behind `Arc`, so they must be
//! `Send + Sync`.

pub mod memory;

use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::error::{SourceError, StoreError};
use crate::model::{ContainerId, ContainerSpec, EventId, EventSpec, TaskSnapshot};

pub use memory::MemoryEventStore;

/// Generic calendar/event CRUD, as offered by the host's calendar provider.
pub trait EventStore: Send + Sync {
    /// Look up a container by its (hidden) name.
    fn find_container(&self, name: &str) -> Result<Option<ContainerId>, StoreError>;

    /// Create a container. A store may silently ignore the request, so
    /// callers re-query rather than trust the returned handle.
    fn create_container(&self, spec: &ContainerSpec) -> Result<Option<ContainerId>, StoreError>;

    /// Delete a container and, with it, all of its events.
    fn delete_container(&self, id: ContainerId) -> Result<usize, StoreError>;

    /// Delete every event owned by a container.
    fn delete_events(&self, container: ContainerId) -> Result<usize, StoreError>;

    fn insert_event(&self, event: &EventSpec) -> Result<EventId, StoreError>;

    /// Attach an alert-type reminder firing `lead_minutes` before the event
    /// start. Stores with several reminder methods use their alert method.
    fn insert_reminder(&self, event: EventId, lead_minutes: i64) -> Result<(), StoreError>;
}

/// Supplies the current task list.
pub trait TaskSource: Send + Sync {
    fn list_tasks(&self) -> Result<Vec<TaskSnapshot>, SourceError>;
}

/// Write authorization for the event store.
pub trait WriteAccess: Send + Sync {
    fn has_write_permission(&self) -> bool;
}

/// User-visible notices raised by the sync core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notice {
    /// The reminder calendar could not be written.
    CalendarWriteError,
}

impl Notice {
    /// Message key for the host's string lookup.
    pub fn key(&self) -> &'static str {
        match self {
            Notice::CalendarWriteError => "calendar_write_error",
        }
    }
}

/// Fire-and-forget user notification sink.
pub trait Notifier: Send + Sync {
    fn notify_user_error(&self, notice: Notice);
}

/// Local wall clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// The device clock in the local time zone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// Access check for hosts without a permission model.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysWritable;

impl WriteAccess for AlwaysWritable {
    fn has_write_permission(&self) -> bool {
        true
    }
}

/// Notifier that only logs; for headless hosts.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_user_error(&self, notice: Notice) {
        tracing::warn!(notice = notice.key(), "user notice");
    }
}

/// Everything a sync instance talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn EventStore>,
    pub tasks: Arc<dyn TaskSource>,
    pub access: Arc<dyn WriteAccess>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    /// Collaborators for a host that is always authorized, logs notices,
    /// and uses the system clock.
    pub fn new(store: Arc<dyn EventStore>, tasks: Arc<dyn TaskSource>) -> Self {
        Self {
            store,
            tasks,
            access: Arc::new(AlwaysWritable),
            notifier: Arc::new(LogNotifier),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_access(mut self, access: Arc<dyn WriteAccess>) -> Self {
        self.access = access;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl TaskSource for Vec<TaskSnapshot> {
    fn list_tasks(&self) -> Result<Vec<TaskSnapshot>, SourceError> {
        Ok(self.clone())
    }
}
