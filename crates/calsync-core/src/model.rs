//! Data types shared by the sync state machine, the reconciliation engine,
//! and the adapters.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reminder::MINUTES_PER_DAY;

/// Which date kinds are mirrored into the reminder calendar.
///
/// Empty means mirroring is off and the calendar must not exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncKinds {
    pub dues: bool,
    pub thresholds: bool,
}

impl SyncKinds {
    pub const DUES: u8 = 1;
    pub const THRESHOLDS: u8 = 2;

    pub const NONE: SyncKinds = SyncKinds {
        dues: false,
        thresholds: false,
    };

    pub fn new(dues: bool, thresholds: bool) -> Self {
        Self { dues, thresholds }
    }

    pub fn is_empty(&self) -> bool {
        !self.dues && !self.thresholds
    }

    pub fn bits(&self) -> u8 {
        let mut bits = 0;
        if self.dues {
            bits |= Self::DUES;
        }
        if self.thresholds {
            bits |= Self::THRESHOLDS;
        }
        bits
    }

    pub fn with_dues(self, dues: bool) -> Self {
        Self { dues, ..self }
    }

    pub fn with_thresholds(self, thresholds: bool) -> Self {
        Self { thresholds, ..self }
    }
}

/// Live sync configuration, owned by the state machine and read by each pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    pub kinds: SyncKinds,
    pub reminder_margin_minutes: u32,
    pub reminder_time: NaiveTime,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            kinds: SyncKinds::NONE,
            reminder_margin_minutes: MINUTES_PER_DAY,
            reminder_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

/// Read-only view of one task, as supplied by the task source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub completed: bool,
    pub text: String,
    pub due: Option<NaiveDate>,
    pub threshold: Option<NaiveDate>,
}

impl TaskSnapshot {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            completed: false,
            text: text.into(),
            due: None,
            threshold: None,
        }
    }

    pub fn with_due(mut self, due: NaiveDate) -> Self {
        self.due = Some(due);
        self
    }

    pub fn with_threshold(mut self, threshold: NaiveDate) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn completed(mut self) -> Self {
        self.completed = true;
        self
    }
}

/// Store handle of the reminder calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(pub u64);

/// Store handle of one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub u64);

/// Attributes of the reminder calendar when it has to be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    /// Lookup key; never shown to the user.
    pub name: String,
    pub display_name: String,
    pub account_name: String,
    /// 0xRRGGBB
    pub color: u32,
    /// Users may read but not edit the mirrored events.
    pub read_only: bool,
    pub visible: bool,
    pub sync_events: bool,
}

/// The date kind an event mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateKind {
    Due,
    Threshold,
}

/// One event derived from the task list during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderEvent {
    pub kind: DateKind,
    pub title: String,
    pub date: NaiveDate,
    pub description: String,
    /// Minutes before the event start the alert fires; `None` when the
    /// trigger is already in the past.
    pub reminder_lead_minutes: Option<i64>,
}

/// Event row as written to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSpec {
    pub container: ContainerId,
    pub title: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
    pub time_zone: String,
    pub confirmed: bool,
    /// Link back into the task app, if the host provides one.
    #[serde(default)]
    pub app_uri: Option<String>,
}

impl EventSpec {
    /// All-day event on `event.date`, starting at midnight UTC and lasting
    /// exactly one day, independent of the local zone.
    pub fn all_day(container: ContainerId, event: &ReminderEvent) -> Self {
        let start = event.date.and_time(NaiveTime::MIN).and_utc();
        Self {
            container,
            title: event.title.clone(),
            description: event.description.clone(),
            start,
            end: start + Duration::days(1),
            all_day: true,
            time_zone: "UTC".to_string(),
            confirmed: true,
            app_uri: None,
        }
    }
}
