//! In-process event store.
//!
//! Behaves like a calendar provider with one table of containers and one of
//! events (each carrying its reminders). The whole state can be serialized,
//! which is how the CLI keeps a calendar between runs.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use super::EventStore;
use crate::error::{CoreError, StoreError};
use crate::model::{ContainerId, ContainerSpec, EventId, EventSpec};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredContainer {
    pub id: ContainerId,
    pub spec: ContainerSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub id: EventId,
    pub spec: EventSpec,
    /// Lead times (minutes before start) of the attached alerts.
    #[serde(default)]
    pub reminders: Vec<i64>,
}

/// Serializable contents of a [`MemoryEventStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub next_id: u64,
    #[serde(default)]
    pub containers: Vec<StoredContainer>,
    #[serde(default)]
    pub events: Vec<StoredEvent>,
}

impl StoreSnapshot {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct MemoryEventStore {
    inner: Mutex<StoreSnapshot>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            inner: Mutex::new(snapshot),
        }
    }

    /// Load a store saved with [`MemoryEventStore::save`]. A missing file
    /// yields an empty store.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)?;
        let snapshot: StoreSnapshot = serde_json::from_str(&content)?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let data = serde_json::to_string_pretty(&*self.lock())?;
        std::fs::write(path, data)?;
        Ok(())
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.lock().clone()
    }

    pub fn container_named(&self, name: &str) -> Option<StoredContainer> {
        self.lock()
            .containers
            .iter()
            .find(|c| c.spec.name == name)
            .cloned()
    }

    pub fn events_in(&self, container: ContainerId) -> Vec<StoredEvent> {
        self.lock()
            .events
            .iter()
            .filter(|e| e.spec.container == container)
            .cloned()
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, StoreSnapshot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventStore for MemoryEventStore {
    fn find_container(&self, name: &str) -> Result<Option<ContainerId>, StoreError> {
        Ok(self.container_named(name).map(|c| c.id))
    }

    fn create_container(&self, spec: &ContainerSpec) -> Result<Option<ContainerId>, StoreError> {
        let mut inner = self.lock();
        let id = ContainerId(inner.allocate_id());
        inner.containers.push(StoredContainer {
            id,
            spec: spec.clone(),
        });
        Ok(Some(id))
    }

    fn delete_container(&self, id: ContainerId) -> Result<usize, StoreError> {
        let mut inner = self.lock();
        let before = inner.containers.len();
        inner.containers.retain(|c| c.id != id);
        inner.events.retain(|e| e.spec.container != id);
        Ok(before - inner.containers.len())
    }

    fn delete_events(&self, container: ContainerId) -> Result<usize, StoreError> {
        let mut inner = self.lock();
        let before = inner.events.len();
        inner.events.retain(|e| e.spec.container != container);
        Ok(before - inner.events.len())
    }

    fn insert_event(&self, event: &EventSpec) -> Result<EventId, StoreError> {
        let mut inner = self.lock();
        if !inner.containers.iter().any(|c| c.id == event.container) {
            return Err(StoreError::Unavailable(format!(
                "no calendar with id {}",
                event.container.0
            )));
        }
        let id = EventId(inner.allocate_id());
        inner.events.push(StoredEvent {
            id,
            spec: event.clone(),
            reminders: Vec::new(),
        });
        Ok(id)
    }

    fn insert_reminder(&self, event: EventId, lead_minutes: i64) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let stored = inner
            .events
            .iter_mut()
            .find(|e| e.id == event)
            .ok_or_else(|| StoreError::Unavailable(format!("no event with id {}", event.0)))?;
        stored.reminders.push(lead_minutes);
        Ok(())
    }
}
