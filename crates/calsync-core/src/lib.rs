//! # calsync core library
//!
//! Mirrors the due and threshold dates of a task list into a dedicated
//! reminder calendar. The calendar is never edited incrementally: every
//! reconciliation pass purges it and rebuilds it from the current tasks.
//!
//! ## Architecture
//!
//! - **Sync state machine** ([`CalendarSync`]): owns which date kinds are
//!   mirrored and the reminder preferences; schedules passes on change
//! - **Scheduler** ([`Debouncer`]): one worker thread, debounced requests,
//!   never two passes at once
//! - **Engine** ([`engine`]): the purge-and-rebuild pass
//! - **Reminder math** ([`reminder`]): trigger instants and lead times
//! - **Adapters** ([`store`]): traits for the calendar provider, task list,
//!   access check, notifications and clock, plus an in-memory store and a
//!   todo.txt task source
//! - **Storage**: TOML host settings

pub mod engine;
pub mod error;
pub mod model;
pub mod reminder;
pub mod scheduler;
pub mod storage;
pub mod store;
pub mod sync;
pub mod todotxt;

pub use engine::{plan_events, EngineOptions, PassOutcome};
pub use error::{ConfigError, CoreError, PassError, SourceError, StoreError};
pub use model::{
    ContainerId, ContainerSpec, DateKind, EventId, EventSpec, ReminderEvent, SyncConfig,
    SyncKinds, TaskSnapshot,
};
pub use scheduler::Debouncer;
pub use storage::Settings;
pub use store::{
    Clock, Collaborators, EventStore, MemoryEventStore, Notice, Notifier, SystemClock,
    TaskSource, WriteAccess,
};
pub use sync::CalendarSync;
pub use todotxt::TodoTxtSource;
