//! In-memory creature store

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use super::{CreatureStore, RegistryError};
use crate::creature::Creature;

/// Creatures grouped by namespace, in insertion order
#[derive(Default)]
pub struct MemoryCreatureStore {
    namespaces: RwLock<HashMap<String, Vec<Creature>>>,
}

impl MemoryCreatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from an existing snapshot (used by the JSON file store)
    pub fn from_snapshot(namespaces: HashMap<String, Vec<Creature>>) -> Self {
        Self {
            namespaces: RwLock::new(namespaces),
        }
    }

    pub fn snapshot(&self) -> HashMap<String, Vec<Creature>> {
        self.namespaces.read().clone()
    }

    pub fn count(&self, namespace: &str) -> usize {
        self.namespaces
            .read()
            .get(namespace)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl CreatureStore for MemoryCreatureStore {
    async fn list_all(&self, namespace: &str) -> Result<Vec<Creature>, RegistryError> {
        Ok(self
            .namespaces
            .read()
            .get(namespace)
            .cloned()
            .unwrap_or_default())
    }

    async fn insert(&self, namespace: &str, creature: Creature) -> Result<(), RegistryError> {
        let mut namespaces = self.namespaces.write();
        let creatures = namespaces.entry(namespace.to_string()).or_default();
        if creatures.iter().any(|c| c.name() == creature.name()) {
            return Err(RegistryError::AlreadyExists(creature.name().to_string()));
        }
        creatures.push(creature);
        Ok(())
    }
}
