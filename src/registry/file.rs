//! JSON-file-backed creature store
//!
//! Keeps everything in a [`MemoryCreatureStore`] and rewrites the whole file
//! after each insert. The write goes to a sibling temp file first and is then
//! renamed over the original, so a crash never leaves a half-written file.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::{CreatureStore, MemoryCreatureStore, RegistryError};
use crate::creature::Creature;

pub struct JsonFileCreatureStore {
    path: PathBuf,
    inner: MemoryCreatureStore,
    // Serializes insert + persist so file contents match memory
    write_lock: Mutex<()>,
}

impl JsonFileCreatureStore {
    /// Open the store at `path`; a missing file starts empty
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref().to_path_buf();
        let snapshot: HashMap<String, Vec<Creature>> = match tokio::fs::read(&path).await {
            Ok(data) => serde_json::from_slice(&data).map_err(|e| {
                RegistryError::Store(format!("Invalid creature file {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(RegistryError::Store(format!(
                    "Failed to read creature file {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        tracing::info!(
            path = %path.display(),
            namespaces = snapshot.len(),
            "Loaded creature store"
        );

        Ok(Self {
            path,
            inner: MemoryCreatureStore::from_snapshot(snapshot),
            write_lock: Mutex::new(()),
        })
    }

    async fn persist(&self, snapshot: &HashMap<String, Vec<Creature>>) -> Result<(), RegistryError> {
        let data = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| RegistryError::Store(format!("Failed to serialize creatures: {}", e)))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &data)
            .await
            .map_err(|e| RegistryError::Store(format!("Failed to write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            RegistryError::Store(format!("Failed to replace {}: {}", self.path.display(), e))
        })
    }
}

#[async_trait]
impl CreatureStore for JsonFileCreatureStore {
    async fn list_all(&self, namespace: &str) -> Result<Vec<Creature>, RegistryError> {
        self.inner.list_all(namespace).await
    }

    async fn insert(&self, namespace: &str, creature: Creature) -> Result<(), RegistryError> {
        let _guard = self.write_lock.lock().await;

        // Memory only changes once the file holds the new record
        let mut snapshot = self.inner.snapshot();
        let creatures = snapshot.entry(namespace.to_string()).or_default();
        if creatures.iter().any(|c| c.name() == creature.name()) {
            return Err(RegistryError::AlreadyExists(creature.name().to_string()));
        }
        creatures.push(creature.clone());

        self.persist(&snapshot).await?;
        self.inner.insert(namespace, creature).await
    }
}
