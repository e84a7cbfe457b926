//! TOML-based host configuration.
//!
//! Stores the sync preferences a host application starts `CalendarSync`
//! with:
//! - Which date kinds are mirrored
//! - Reminder margin (days) and time of day
//! - Calendar identity and appearance
//! - Debounce delay and event descriptions
//!
//! Configuration is stored at `~/.config/calsync/config.toml`. The sync core
//! only reads it; writing is left to the host.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::model::{ContainerSpec, SyncConfig, SyncKinds};
use crate::reminder::{time_of_day_from_minutes, MINUTES_PER_DAY};

/// Calendar and reminder preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSettings {
    #[serde(default)]
    pub sync_dues: bool,
    #[serde(default)]
    pub sync_thresholds: bool,
    /// Days before the event date the reminder fires.
    #[serde(default = "default_reminder_days")]
    pub reminder_days: u32,
    /// Time of day of the reminder, in minutes since midnight.
    #[serde(default = "default_reminder_time")]
    pub reminder_time: u32,
    /// Hidden lookup name of the reminder calendar.
    #[serde(default = "default_calendar_name")]
    pub calendar_name: String,
    #[serde(default = "default_display_name")]
    pub display_name: String,
    #[serde(default = "default_account_name")]
    pub account_name: String,
    #[serde(default = "default_color")]
    pub color: u32,
}

/// Debounce configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerSettings {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

/// Descriptions attached to mirrored events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSettings {
    #[serde(default = "default_due_description")]
    pub due_description: String,
    #[serde(default = "default_threshold_description")]
    pub threshold_description: String,
}

/// Host configuration.
///
/// Serialized to/from TOML at `~/.config/calsync/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub calendar: CalendarSettings,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    #[serde(default)]
    pub labels: LabelSettings,
    /// Whether the platform's calendar provider is usable at all. When
    /// false, mirroring stays off regardless of the flags above.
    #[serde(default = "default_true")]
    pub platform_supported: bool,
    /// Prefix for links from an event back into the task app; the event
    /// title is appended.
    #[serde(default)]
    pub app_uri_base: Option<String>,
}

fn default_reminder_days() -> u32 {
    1
}
fn default_reminder_time() -> u32 {
    12 * 60
}
fn default_calendar_name() -> String {
    "calsync_reminders".into()
}
fn default_display_name() -> String {
    "Task reminders".into()
}
fn default_account_name() -> String {
    "calsync".into()
}
fn default_color() -> u32 {
    0x0000ff
}
fn default_debounce_ms() -> u64 {
    1000
}
fn default_due_description() -> String {
    "Task due".into()
}
fn default_threshold_description() -> String {
    "Task threshold".into()
}
fn default_true() -> bool {
    true
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            sync_dues: false,
            sync_thresholds: false,
            reminder_days: default_reminder_days(),
            reminder_time: default_reminder_time(),
            calendar_name: default_calendar_name(),
            display_name: default_display_name(),
            account_name: default_account_name(),
            color: default_color(),
        }
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for LabelSettings {
    fn default() -> Self {
        Self {
            due_description: default_due_description(),
            threshold_description: default_threshold_description(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            calendar: CalendarSettings::default(),
            scheduler: SchedulerSettings::default(),
            labels: LabelSettings::default(),
            platform_supported: true,
            app_uri_base: None,
        }
    }
}

impl Settings {
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, or return defaults when no file
    /// exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };
        let settings: Settings = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Reject values the sync core cannot use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.calendar.reminder_time >= MINUTES_PER_DAY {
            return Err(ConfigError::InvalidValue {
                key: "calendar.reminder_time".into(),
                message: format!(
                    "{} is not a time of day (minutes since midnight, below {MINUTES_PER_DAY})",
                    self.calendar.reminder_time
                ),
            });
        }
        if self.calendar.reminder_days.checked_mul(MINUTES_PER_DAY).is_none() {
            return Err(ConfigError::InvalidValue {
                key: "calendar.reminder_days".into(),
                message: format!("{} days is too far ahead", self.calendar.reminder_days),
            });
        }
        if self.calendar.calendar_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "calendar.calendar_name".into(),
                message: "must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Initial live configuration for a sync instance.
    pub fn sync_config(&self) -> SyncConfig {
        let defaults = SyncConfig::default();
        SyncConfig {
            kinds: SyncKinds::new(self.calendar.sync_dues, self.calendar.sync_thresholds),
            reminder_margin_minutes: self
                .calendar
                .reminder_days
                .saturating_mul(MINUTES_PER_DAY),
            reminder_time: time_of_day_from_minutes(self.calendar.reminder_time)
                .unwrap_or(defaults.reminder_time),
        }
    }

    pub fn container_spec(&self) -> ContainerSpec {
        ContainerSpec {
            name: self.calendar.calendar_name.clone(),
            display_name: self.calendar.display_name.clone(),
            account_name: self.calendar.account_name.clone(),
            color: self.calendar.color,
            read_only: true,
            visible: true,
            sync_events: true,
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.scheduler.debounce_ms)
    }

    /// Get a value as string by dot-separated key, e.g. `calendar.sync_dues`.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = key
            .split('.')
            .try_fold(&json, |current, part| current.get(part))?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => Some(String::new()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key. The new value must parse as the
    /// type already stored under that key, and the result must validate.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        let (parents, leaf) = match key.rsplit_once('.') {
            Some((parents, leaf)) => (Some(parents), leaf),
            None => (None, key),
        };
        let mut current = &mut json;
        if let Some(parents) = parents {
            for part in parents.split('.') {
                current = current
                    .get_mut(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
            }
        }
        let obj = current
            .as_object_mut()
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        let existing = obj
            .get(leaf)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
            ),
            serde_json::Value::Number(_) => serde_json::Value::Number(
                value
                    .parse::<u64>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                    .into(),
            ),
            serde_json::Value::Null if value.is_empty() => serde_json::Value::Null,
            _ => serde_json::Value::String(value.into()),
        };
        obj.insert(leaf.to_string(), new_value);

        let updated: Settings = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}
