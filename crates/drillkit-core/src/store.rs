//! Slot-based persistence adapter.
//!
//! Durable state lives in a string key-value store under a handful of named
//! slots, each holding one JSON document. [`SlotStore`] layers typed access on
//! top of any [`KeyValueStore`] and publishes a [`SlotChange`] after every
//! write so readers can react without polling.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::error::DrillError;

/// Capacity of the change notification channel.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// A raw string key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> anyhow::Result<()>;
}

/// In-process store, used by tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> anyhow::Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// The named slots drillkit persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// List of error records.
    ErrorQuestions,
    /// List of saved practices, newest first.
    Practices,
    /// The learner's study plan.
    StudyPlan,
    /// Exam ids hidden from the catalog.
    DeletedExamIds,
}

impl Slot {
    pub const ALL: [Slot; 4] = [
        Slot::ErrorQuestions,
        Slot::Practices,
        Slot::StudyPlan,
        Slot::DeletedExamIds,
    ];

    /// Storage key of the slot.
    pub fn key(&self) -> &'static str {
        match self {
            Slot::ErrorQuestions => "errorQuestions",
            Slot::Practices => "practices",
            Slot::StudyPlan => "studyPlan",
            Slot::DeletedExamIds => "deletedExamIds",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Published after a slot is written or cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotChange {
    Saved(Slot),
    Cleared(Slot),
}

impl SlotChange {
    pub fn slot(&self) -> Slot {
        match self {
            SlotChange::Saved(slot) | SlotChange::Cleared(slot) => *slot,
        }
    }
}

/// Typed, observable access to the slots of a [`KeyValueStore`].
#[derive(Clone)]
pub struct SlotStore {
    backend: Arc<dyn KeyValueStore>,
    changes: broadcast::Sender<SlotChange>,
}

impl SlotStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { backend, changes }
    }

    /// A slot store over a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Load a slot, returning the empty default when it is missing, corrupt,
    /// or unreadable. Failures are logged, never returned.
    pub fn load<T>(&self, slot: Slot) -> T
    where
        T: DeserializeOwned + Default,
    {
        match self.try_load(slot) {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(e) => {
                tracing::warn!("{e}; treating slot as empty");
                T::default()
            }
        }
    }

    /// Load a slot, surfacing `MalformedStoredData` and `Storage` failures.
    pub fn try_load<T>(&self, slot: Slot) -> Result<Option<T>, DrillError>
    where
        T: DeserializeOwned,
    {
        let raw = self
            .backend
            .get(slot.key())
            .map_err(|e| DrillError::Storage(format!("{e:#}")))?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| DrillError::MalformedStoredData {
                slot: slot.key().to_string(),
                message: e.to_string(),
            })
    }

    /// Serialize and store a value, then notify subscribers.
    pub fn save<T>(&self, slot: Slot, value: &T) -> Result<(), DrillError>
    where
        T: Serialize + ?Sized,
    {
        let raw = serde_json::to_string(value).map_err(|e| DrillError::Storage(e.to_string()))?;
        self.backend
            .set(slot.key(), &raw)
            .map_err(|e| DrillError::Storage(format!("{e:#}")))?;
        tracing::debug!(slot = %slot, bytes = raw.len(), "slot saved");
        // No subscribers is fine.
        let _ = self.changes.send(SlotChange::Saved(slot));
        Ok(())
    }

    /// Remove a slot entirely, then notify subscribers.
    pub fn clear(&self, slot: Slot) -> Result<(), DrillError> {
        self.backend
            .remove(slot.key())
            .map_err(|e| DrillError::Storage(format!("{e:#}")))?;
        let _ = self.changes.send(SlotChange::Cleared(slot));
        Ok(())
    }

    /// Subscribe to changes made through this store (and its clones).
    pub fn subscribe(&self) -> broadcast::Receiver<SlotChange> {
        self.changes.subscribe()
    }
}

impl fmt::Debug for SlotStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotStore")
            .field("subscribers", &self.changes.receiver_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Plan {
        name: String,
        days: Vec<u32>,
    }

    /// A backend whose writes always fail.
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _: &str) -> anyhow::Result<Option<String>> {
            Err(anyhow!("disk on fire"))
        }
        fn set(&self, _: &str, _: &str) -> anyhow::Result<()> {
            Err(anyhow!("disk on fire"))
        }
        fn remove(&self, _: &str) -> anyhow::Result<()> {
            Err(anyhow!("disk on fire"))
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = SlotStore::in_memory();
        let plan = Plan {
            name: "week one".into(),
            days: vec![1, 2, 3],
        };
        store.save(Slot::StudyPlan, &plan).unwrap();
        assert_eq!(store.load::<Plan>(Slot::StudyPlan), plan);
    }

    #[test]
    fn missing_slot_loads_default() {
        let store = SlotStore::in_memory();
        assert!(store.load::<Vec<String>>(Slot::DeletedExamIds).is_empty());
        assert!(store
            .try_load::<Vec<String>>(Slot::DeletedExamIds)
            .unwrap()
            .is_none());
    }

    #[test]
    fn corrupt_slot_loads_default_but_try_load_reports_it() {
        let backend = Arc::new(MemoryStore::new());
        backend.set("practices", "{not json").unwrap();
        let store = SlotStore::new(backend);

        assert!(store.load::<Vec<String>>(Slot::Practices).is_empty());
        let err = store.try_load::<Vec<String>>(Slot::Practices).unwrap_err();
        assert!(matches!(err, DrillError::MalformedStoredData { ref slot, .. } if slot == "practices"));
    }

    #[test]
    fn backend_failures_surface_on_save_only() {
        let store = SlotStore::new(Arc::new(BrokenStore));
        assert!(store.load::<Vec<String>>(Slot::ErrorQuestions).is_empty());
        assert!(matches!(
            store.save(Slot::ErrorQuestions, &Vec::<String>::new()),
            Err(DrillError::Storage(_))
        ));
    }

    #[test]
    fn subscribers_see_saves_and_clears() {
        let store = SlotStore::in_memory();
        let mut rx = store.subscribe();

        store.save(Slot::DeletedExamIds, &vec!["7"]).unwrap();
        store.clone().clear(Slot::DeletedExamIds).unwrap();

        assert_eq!(rx.try_recv().unwrap(), SlotChange::Saved(Slot::DeletedExamIds));
        assert_eq!(rx.try_recv().unwrap(), SlotChange::Cleared(Slot::DeletedExamIds));
        assert!(rx.try_recv().is_err());
        assert!(store.load::<Vec<String>>(Slot::DeletedExamIds).is_empty());
    }

    #[test]
    fn save_without_subscribers_succeeds() {
        let store = SlotStore::in_memory();
        store.save(Slot::Practices, &Vec::<String>::new()).unwrap();
    }

    #[test]
    fn slot_keys_match_stored_names() {
        let keys: Vec<_> = Slot::ALL.iter().map(|s| s.key()).collect();
        assert_eq!(
            keys,
            vec!["errorQuestions", "practices", "studyPlan", "deletedExamIds"]
        );
    }
}
