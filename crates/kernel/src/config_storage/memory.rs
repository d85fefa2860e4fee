//! In-memory config storage, used for tests and as a scratch backend.

use std::collections::BTreeMap;

use anyhow::Result;
use parking_lot::RwLock;
use tracing::debug;

use super::{ConfigEntity, ConfigFilter, ConfigStorage};

/// Config storage backed by a map keyed by `(entity_type, id)`.
#[derive(Debug, Default)]
pub struct MemoryConfigStorage {
    entities: RwLock<BTreeMap<(String, String), ConfigEntity>>,
}

impl MemoryConfigStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage pre-filled with entities.
    pub fn with_entities(entities: impl IntoIterator<Item = ConfigEntity>) -> Self {
        let map = entities
            .into_iter()
            .map(|e| ((e.entity_type().to_string(), e.id()), e))
            .collect();
        Self {
            entities: RwLock::new(map),
        }
    }
}

impl ConfigStorage for MemoryConfigStorage {
    fn load(&self, entity_type: &str, id: &str) -> Result<Option<ConfigEntity>> {
        Ok(self
            .entities
            .read()
            .get(&(entity_type.to_string(), id.to_string()))
            .cloned())
    }

    fn save(&self, entity: &ConfigEntity) -> Result<()> {
        debug!(entity = %entity, "saving config entity");
        self.entities.write().insert(
            (entity.entity_type().to_string(), entity.id()),
            entity.clone(),
        );
        Ok(())
    }

    fn delete(&self, entity_type: &str, id: &str) -> Result<bool> {
        Ok(self
            .entities
            .write()
            .remove(&(entity_type.to_string(), id.to_string()))
            .is_some())
    }

    fn list(&self, entity_type: &str, filter: Option<&ConfigFilter>) -> Result<Vec<ConfigEntity>> {
        let entities: Vec<ConfigEntity> = self
            .entities
            .read()
            .iter()
            .filter(|((ty, _), _)| ty == entity_type)
            .map(|(_, entity)| entity.clone())
            .collect();
        Ok(match filter {
            Some(filter) => filter.apply(entities),
            None => entities,
        })
    }
}
