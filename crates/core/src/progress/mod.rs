//! Durable record of how far the visitor has come.
//!
//! [`ProgressStore`] is the only mutable state shared across scenes. It is
//! owned by the router and lent to scenes through the scene context; callers
//! mutate it only through the operations below, each of which persists the
//! full record in one write.

use std::{
    cell::RefCell,
    collections::HashMap,
    path::{Path, PathBuf},
    rc::Rc,
};

use serde::Serialize;
use serde_json::Value;

use crate::{scene::SceneId, Result};

pub type ClueId = String;

/// What gets persisted between visits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub scene: SceneId,
    pub found_clues: Vec<ClueId>,
    pub attempts: u32,
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self {
            scene: SceneId::default(),
            found_clues: Vec::new(),
            attempts: 0,
        }
    }
}

impl ProgressRecord {
    /// Coerces an arbitrary JSON payload into a well-formed record, field by
    /// field. Never fails.
    pub fn from_json_lenient(raw: &str) -> Self {
        let value = match serde_json::from_str::<Value>(raw) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(%err, "stored progress is not valid JSON; using defaults");
                return Self::default();
            }
        };
        let Value::Object(fields) = value else {
            tracing::warn!("stored progress is not an object; using defaults");
            return Self::default();
        };

        let scene = fields
            .get("scene")
            .or_else(|| fields.get("state"))
            .and_then(Value::as_str)
            .map(SceneId::parse_or_default)
            .unwrap_or_default();

        let mut found_clues: Vec<ClueId> = Vec::new();
        if let Some(Value::Array(items)) = fields.get("foundClues") {
            for id in items.iter().filter_map(Value::as_str) {
                if !found_clues.iter().any(|existing| existing == id) {
                    found_clues.push(id.to_string());
                }
            }
        }

        let attempts = fields
            .get("attempts")
            .and_then(Value::as_u64)
            .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
            .unwrap_or(0);

        Self {
            scene,
            found_clues,
            attempts,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn has_clue(&self, id: &str) -> bool {
        self.found_clues.iter().any(|clue| clue == id)
    }
}

/// Key/value persistence used by the store.
pub trait StorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Process-local storage. Clones share the same map, so a test can keep a
/// handle and inspect what the store wrote.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn put_raw(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }
}

impl StorageBackend for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.raw(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.put_raw(key, value);
        Ok(())
    }
}

/// One JSON file per key inside a directory. Writes land in a sibling temp
/// file first and are renamed over the target.
#[derive(Debug, Clone)]
pub struct FileStorage {
    directory: PathBuf,
}

impl FileStorage {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.directory.join(format!("{safe}.json"))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl StorageBackend for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.directory)?;
        let target = self.path_for(key);
        let staging = target.with_extension("json.tmp");
        std::fs::write(&staging, value)?;
        std::fs::rename(&staging, &target)?;
        Ok(())
    }
}

pub struct ProgressStore {
    backend: Box<dyn StorageBackend>,
    key: String,
    current: ProgressRecord,
}

impl ProgressStore {
    /// Opens the store and loads whatever is persisted under `key`.
    pub fn open(backend: Box<dyn StorageBackend>, key: impl Into<String>) -> Self {
        let mut store = Self {
            backend,
            key: key.into(),
            current: ProgressRecord::default(),
        };
        store.current = store.load();
        store
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Reads the persisted record, substituting defaults for anything missing
    /// or malformed.
    pub fn load(&self) -> ProgressRecord {
        match self.backend.get(&self.key) {
            Ok(Some(raw)) => ProgressRecord::from_json_lenient(&raw),
            Ok(None) => ProgressRecord::default(),
            Err(err) => {
                tracing::warn!(%err, key = %self.key, "progress read failed; using defaults");
                ProgressRecord::default()
            }
        }
    }

    /// Copy of the in-memory record.
    pub fn snapshot(&self) -> ProgressRecord {
        self.current.clone()
    }

    pub fn scene(&self) -> SceneId {
        self.current.scene
    }

    pub fn save(&mut self, record: ProgressRecord) {
        self.current = record;
        self.persist();
    }

    /// Replaces the record wholesale; unknown clue duplicates are collapsed.
    pub fn hydrate(&mut self, mut record: ProgressRecord) {
        let mut seen: Vec<ClueId> = Vec::with_capacity(record.found_clues.len());
        for clue in record.found_clues.drain(..) {
            if !seen.contains(&clue) {
                seen.push(clue);
            }
        }
        record.found_clues = seen;
        self.save(record);
    }

    pub fn reset(&mut self) -> ProgressRecord {
        self.save(ProgressRecord::default());
        self.snapshot()
    }

    pub fn set_scene(&mut self, scene: SceneId) {
        self.current.scene = scene;
        self.persist();
    }

    pub fn record_attempt(&mut self) {
        self.current.attempts = self.current.attempts.saturating_add(1);
        self.persist();
    }

    pub fn mark_clue_found(&mut self, id: &str) {
        if self.current.has_clue(id) {
            return;
        }
        self.current.found_clues.push(id.to_string());
        self.persist();
    }

    fn persist(&mut self) {
        let write = self
            .current
            .to_json()
            .and_then(|payload| self.backend.set(&self.key, &payload));
        if let Err(err) = write {
            tracing::warn!(%err, key = %self.key, "progress write failed; keeping in-memory record");
        }
    }
}

impl std::fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressStore")
            .field("key", &self.key)
            .field("current", &self.current)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeepsakeError;

    const KEY: &str = "vday_progress_v1";

    fn memory_store() -> (ProgressStore, MemoryStorage) {
        let storage = MemoryStorage::new();
        let store = ProgressStore::open(Box::new(storage.clone()), KEY);
        (store, storage)
    }

    #[test]
    fn first_load_uses_defaults() {
        let (store, storage) = memory_store();
        assert_eq!(store.snapshot(), ProgressRecord::default());
        assert_eq!(store.scene(), SceneId::Password);
        assert!(storage.raw(KEY).is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let (mut store, _) = memory_store();
        let record = ProgressRecord {
            scene: SceneId::Song,
            found_clues: vec!["rose".into(), "moon".into()],
            attempts: 4,
        };
        store.save(record.clone());

        assert_eq!(store.load(), record);
        store.save(store.load());
        assert_eq!(store.load(), record);
    }

    #[test]
    fn corrupt_payloads_fall_back_to_defaults() {
        for payload in ["{", "42", "null", "[1,2]", "\"password\""] {
            let storage = MemoryStorage::new();
            storage.put_raw(KEY, payload);
            let store = ProgressStore::open(Box::new(storage), KEY);
            assert_eq!(store.snapshot(), ProgressRecord::default(), "payload {payload}");
        }
    }

    #[test]
    fn partial_payloads_are_coerced() {
        let storage = MemoryStorage::new();
        storage.put_raw(
            KEY,
            r#"{"state": "reveal", "foundClues": ["rose", 3, "rose"], "attempts": -2}"#,
        );
        let store = ProgressStore::open(Box::new(storage), KEY);
        let record = store.snapshot();

        assert_eq!(record.scene, SceneId::Reveal);
        assert_eq!(record.found_clues, vec!["rose".to_string()]);
        assert_eq!(record.attempts, 0);
    }

    #[test]
    fn unknown_scene_becomes_default() {
        let record = ProgressRecord::from_json_lenient(
            r#"{"scene": "clickopen", "foundClues": "nope", "attempts": 2}"#,
        );
        assert_eq!(record.scene, SceneId::Password);
        assert!(record.found_clues.is_empty());
        assert_eq!(record.attempts, 2);
    }

    #[test]
    fn serialized_shape_is_flat() {
        let record = ProgressRecord {
            scene: SceneId::CardOpen,
            found_clues: vec!["spark".into()],
            attempts: 1,
        };
        let value: Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();
        assert_eq!(value["scene"], "cardopen");
        assert_eq!(value["foundClues"][0], "spark");
        assert_eq!(value["attempts"], 1);
    }

    #[test]
    fn mutations_persist() {
        let (mut store, storage) = memory_store();
        store.set_scene(SceneId::Intro);
        store.record_attempt();
        store.record_attempt();
        store.mark_clue_found("moon");

        let reloaded = ProgressRecord::from_json_lenient(&storage.raw(KEY).unwrap());
        assert_eq!(reloaded.scene, SceneId::Intro);
        assert_eq!(reloaded.attempts, 2);
        assert_eq!(reloaded.found_clues, vec!["moon".to_string()]);
    }

    #[test]
    fn marking_a_clue_twice_is_a_no_op() {
        let (mut store, storage) = memory_store();
        store.mark_clue_found("rose");
        let written = storage.raw(KEY);
        storage.put_raw(KEY, "sentinel");

        store.mark_clue_found("rose");
        assert_eq!(storage.raw(KEY).as_deref(), Some("sentinel"));
        assert_eq!(store.snapshot().found_clues.len(), 1);
        assert!(written.is_some());
    }

    #[test]
    fn reset_persists_defaults() {
        let (mut store, storage) = memory_store();
        store.set_scene(SceneId::Final);
        store.record_attempt();

        let record = store.reset();
        assert_eq!(record, ProgressRecord::default());
        assert_eq!(
            ProgressRecord::from_json_lenient(&storage.raw(KEY).unwrap()),
            ProgressRecord::default()
        );
    }

    #[test]
    fn hydrate_collapses_duplicates() {
        let (mut store, _) = memory_store();
        store.hydrate(ProgressRecord {
            scene: SceneId::Gift,
            found_clues: vec!["a".into(), "b".into(), "a".into()],
            attempts: 9,
        });
        assert_eq!(store.snapshot().found_clues, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(store.load().scene, SceneId::Gift);
    }

    struct BrokenStorage;

    impl StorageBackend for BrokenStorage {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(KeepsakeError::msg("disk on fire"))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(KeepsakeError::msg("disk on fire"))
        }
    }

    #[test]
    fn storage_failures_degrade_to_memory() {
        let mut store = ProgressStore::open(Box::new(BrokenStorage), KEY);
        store.set_scene(SceneId::Song);
        store.record_attempt();

        assert_eq!(store.scene(), SceneId::Song);
        assert_eq!(store.snapshot().attempts, 1);
        assert_eq!(store.load(), ProgressRecord::default());
    }

    #[test]
    fn file_storage_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ProgressStore::open(Box::new(FileStorage::new(dir.path())), KEY);
        store.set_scene(SceneId::Envelope);
        store.mark_clue_found("spark");

        let reopened = ProgressStore::open(Box::new(FileStorage::new(dir.path())), KEY);
        assert_eq!(reopened.snapshot(), store.snapshot());
        assert!(FileStorage::new(dir.path()).path_for(KEY).exists());
    }
}
