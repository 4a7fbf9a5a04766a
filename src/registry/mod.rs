//! Creature registry
//!
//! The registry resolves a lookup string to a creature by exact name or by
//! alias. Records live behind the [`CreatureStore`] port so any key-value or
//! relational backend can hold them; the registry only needs "everything in
//! this namespace" and "insert".
//!
//! # Ambiguity
//!
//! Nothing stops one creature's name from equalling another's alias, or two
//! creatures from sharing an alias. `resolve` returns the first match in store
//! iteration order, which is not guaranteed stable; such identifiers resolve
//! to an unspecified creature.

pub mod file;
pub mod memory;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::creature::Creature;

pub use file::JsonFileCreatureStore;
pub use memory::MemoryCreatureStore;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no creature matches '{0}'")]
    NotFound(String),

    #[error("creature '{0}' already exists")]
    AlreadyExists(String),

    #[error("creature store error: {0}")]
    Store(String),
}

/// Storage port for creature records
#[async_trait]
pub trait CreatureStore: Send + Sync {
    /// Every creature in `namespace`, in store iteration order
    async fn list_all(&self, namespace: &str) -> Result<Vec<Creature>, RegistryError>;

    /// Persist a new creature; fails if the name is already taken
    async fn insert(&self, namespace: &str, creature: Creature) -> Result<(), RegistryError>;
}

/// Namespace-scoped view over a [`CreatureStore`]
#[derive(Clone)]
pub struct CreatureRegistry {
    store: Arc<dyn CreatureStore>,
    namespace: String,
}

impl CreatureRegistry {
    pub fn new(store: Arc<dyn CreatureStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Find the creature answering to `identifier` (name first, then aliases)
    pub async fn resolve(&self, identifier: &str) -> Result<Creature, RegistryError> {
        let creatures = self.store.list_all(&self.namespace).await?;
        creatures
            .into_iter()
            .find(|creature| creature.answers_to(identifier))
            .ok_or_else(|| RegistryError::NotFound(identifier.to_string()))
    }

    /// Exact-name lookup; aliases are ignored
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Creature>, RegistryError> {
        let creatures = self.store.list_all(&self.namespace).await?;
        Ok(creatures.into_iter().find(|creature| creature.name() == name))
    }

    /// Public creatures ordered by name
    pub async fn list_public(&self) -> Result<Vec<Creature>, RegistryError> {
        let mut creatures: Vec<Creature> = self
            .store
            .list_all(&self.namespace)
            .await?
            .into_iter()
            .filter(Creature::is_public)
            .collect();
        creatures.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(creatures)
    }

    pub async fn register(&self, creature: Creature) -> Result<(), RegistryError> {
        let name = creature.name().to_string();
        self.store.insert(&self.namespace, creature).await?;
        tracing::info!(namespace = %self.namespace, creature = %name, "Registered creature");
        Ok(())
    }
}
