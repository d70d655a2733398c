//! Identity map and JSON file backend.
//!
//! # Side effects
//! - `save()` and `reload()` block on filesystem I/O.
//! - Both emit `store_save` / `store_reload` logging events with duration
//!   and status. Field values are never logged.

use super::{StoreError, StoreResult};
use crate::config::StoreConfig;
use crate::model::entity::{Entity, EntityType};
use crate::model::record::{Record, CLASS_KEY};
use crate::model::registry;
use log::{debug, error, info, warn};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::time::Instant;
use tempfile::NamedTempFile;

/// Single-writer store holding every live entity.
#[derive(Debug, Default)]
pub struct Store {
    config: StoreConfig,
    objects: BTreeMap<String, Box<dyn Entity>>,
}

impl Store {
    /// Creates an empty store without touching disk.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            objects: BTreeMap::new(),
        }
    }

    /// Creates a store and loads the backing file, if any.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        let mut store = Self::new(config);
        store.reload()?;
        Ok(store)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        self.config.path()
    }

    /// Constructs a fresh `T` and registers it. Returns its storage key.
    pub fn create<T: EntityType>(&mut self) -> String {
        self.create_with::<T>(&[])
    }

    /// Legacy construction surface: positional values are accepted and ignored.
    pub fn create_with<T: EntityType>(&mut self, _positional: &[Value]) -> String {
        self.register(Box::new(T::from_record(Record::new())))
    }

    /// Registers `entity` under `"<ClassName>.<id>"`, replacing any entity
    /// already stored under that key. Returns the key.
    pub fn register(&mut self, entity: Box<dyn Entity>) -> String {
        let key = entity.storage_key();
        debug!(
            "event=store_register module=store status=ok class={}",
            entity.class_name()
        );
        self.objects.insert(key.clone(), entity);
        key
    }

    /// Returns the identity map. Key order is not part of the contract.
    pub fn all(&self) -> &BTreeMap<String, Box<dyn Entity>> {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    pub fn get_dyn(&self, key: &str) -> Option<&dyn Entity> {
        self.objects.get(key).map(|entity| &**entity)
    }

    /// Returns the entity under `key` when it is a `T`.
    pub fn get<T: EntityType>(&self, key: &str) -> Option<&T> {
        self.objects.get(key)?.as_any().downcast_ref::<T>()
    }

    pub fn get_mut<T: EntityType>(&mut self, key: &str) -> Option<&mut T> {
        self.objects.get_mut(key)?.as_any_mut().downcast_mut::<T>()
    }

    /// Counts live entities per class name.
    pub fn class_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for entity in self.objects.values() {
            *counts.entry(entity.class_name()).or_insert(0) += 1;
        }
        counts
    }

    /// Touches the entity under `key`, then writes the whole map to disk.
    ///
    /// # Errors
    /// - `NotFound` when no entity is registered under `key`.
    /// - `Io` when the backing file cannot be replaced.
    pub fn persist(&mut self, key: &str) -> StoreResult<()> {
        let entity = self
            .objects
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        entity.record_mut().touch();
        self.save()
    }

    /// Serializes every entity into one JSON object and atomically replaces
    /// the backing file with it.
    pub fn save(&self) -> StoreResult<()> {
        let started_at = Instant::now();
        let document = self
            .objects
            .iter()
            .map(|(key, entity)| (key.clone(), Value::Object(entity.to_dict())))
            .collect::<Map<String, Value>>();

        match write_atomic(self.path(), &Value::Object(document)) {
            Ok(()) => {
                info!(
                    "event=store_save module=store status=ok entries={} duration_ms={}",
                    self.objects.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=store_save module=store status=error entries={} duration_ms={} error={}",
                    self.objects.len(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Loads every known entity from the backing file into the identity map.
    ///
    /// Returns the number of entities loaded. A missing file loads nothing.
    /// Entries whose `__class__` is unknown are skipped.
    ///
    /// # Errors
    /// - `CorruptStore` when the file is not a JSON object of objects.
    /// - `Model` when any entry fails reconstruction; nothing is registered.
    /// - `Io` when the file exists but cannot be read.
    pub fn reload(&mut self) -> StoreResult<usize> {
        let started_at = Instant::now();
        let text = match fs::read_to_string(self.path()) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("event=store_reload module=store status=skip reason=missing_file");
                return Ok(0);
            }
            Err(err) => {
                error!(
                    "event=store_reload module=store status=error error_code=read_failed error={}",
                    err
                );
                return Err(StoreError::io(self.path(), err));
            }
        };

        match decode_document(self.path(), &text) {
            Ok((entities, skipped)) => {
                let loaded = entities.len();
                for entity in entities {
                    self.register(entity);
                }
                info!(
                    "event=store_reload module=store status=ok loaded={} skipped={} duration_ms={}",
                    loaded,
                    skipped,
                    started_at.elapsed().as_millis()
                );
                Ok(loaded)
            }
            Err(err) => {
                error!(
                    "event=store_reload module=store status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }
}

/// Parses the file contents into entities without touching the store.
/// Returns the entities plus the number of skipped entries.
fn decode_document(path: &Path, text: &str) -> StoreResult<(Vec<Box<dyn Entity>>, usize)> {
    let document: Value =
        serde_json::from_str(text).map_err(|err| StoreError::corrupt(path, err.to_string()))?;
    let Value::Object(entries) = document else {
        return Err(StoreError::corrupt(path, "top-level value is not a JSON object"));
    };

    let mut entities = Vec::with_capacity(entries.len());
    let mut skipped = 0;
    for (key, value) in &entries {
        let Value::Object(data) = value else {
            return Err(StoreError::corrupt(
                path,
                format!("entry `{key}` is not a JSON object"),
            ));
        };

        let class_name = data.get(CLASS_KEY).and_then(Value::as_str);
        match class_name.and_then(registry::lookup) {
            Some(factory) => entities.push(factory(data)?),
            None => {
                warn!(
                    "event=store_reload_skip module=store status=skip class={}",
                    class_name.unwrap_or("<missing>")
                );
                skipped += 1;
            }
        }
    }
    Ok((entities, skipped))
}

/// Writes `document` to a uniquely named temp file in the target directory,
/// syncs it, then renames it over `path`.
///
/// The temp file is removed when any step before the rename fails.
fn write_atomic(path: &Path, document: &Value) -> StoreResult<()> {
    let dir = match path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent).map_err(|err| StoreError::io(parent, err))?;
            parent
        }
        None => Path::new("."),
    };

    let bytes = serde_json::to_vec(document).map_err(|err| StoreError::io(path, err.into()))?;
    let mut file = NamedTempFile::new_in(dir).map_err(|err| StoreError::io(dir, err))?;
    file.write_all(&bytes)
        .map_err(|err| StoreError::io(file.path(), err))?;
    file.as_file()
        .sync_all()
        .map_err(|err| StoreError::io(file.path(), err))?;
    file.persist(path)
        .map_err(|err| StoreError::io(path, err.error))?;
    Ok(())
}
