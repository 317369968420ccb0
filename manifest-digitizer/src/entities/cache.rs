//! Name-keyed cache of backend reference entities
//!
//! Loaded once per run so that per-row lookups never hit the network.

use std::collections::HashMap;

use crate::api::{Backend, Entity, EntityKind};
use crate::config::PageSizes;

/// Normalize a display name into a cache key
pub fn normalize_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Entities of one kind, keyed by normalized name, in load order
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    entries: Vec<Entity>,
    by_key: HashMap<String, usize>,
}

impl NameIndex {
    /// Insert an entity; a later entity with the same key replaces the
    /// earlier one in place
    pub fn insert(&mut self, entity: Entity) {
        let key = normalize_key(&entity.name);
        match self.by_key.get(&key) {
            Some(&idx) => self.entries[idx] = entity,
            None => {
                self.by_key.insert(key, self.entries.len());
                self.entries.push(entity);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Entity> {
        self.by_key
            .get(&normalize_key(name))
            .map(|&idx| &self.entries[idx])
    }

    pub fn first(&self) -> Option<&Entity> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Entity> for NameIndex {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        let mut index = NameIndex::default();
        for entity in iter {
            index.insert(entity);
        }
        index
    }
}

#[derive(Debug, Clone, Default)]
pub struct EntityCache {
    pub vessels: NameIndex,
    pub persons: NameIndex,
    pub waste_types: NameIndex,
    pub system_users: NameIndex,
}

impl EntityCache {
    /// Bulk-load all four reference collections
    ///
    /// A failed list request leaves that collection empty; it is not fatal.
    pub async fn load(backend: &dyn Backend, page_sizes: &PageSizes) -> Self {
        log::info!("Loading entities cache...");

        let cache = Self {
            vessels: load_kind(backend, EntityKind::Vessel, page_sizes.vessels).await,
            persons: load_kind(backend, EntityKind::Person, page_sizes.persons).await,
            waste_types: load_kind(backend, EntityKind::WasteType, page_sizes.waste_types).await,
            system_users: load_kind(backend, EntityKind::SystemUser, page_sizes.system_users)
                .await,
        };

        log::info!(
            "Loaded cache: {} vessels, {} persons, {} waste types, {} system users",
            cache.vessels.len(),
            cache.persons.len(),
            cache.waste_types.len(),
            cache.system_users.len()
        );

        cache
    }

    pub fn index(&self, kind: EntityKind) -> &NameIndex {
        match kind {
            EntityKind::Vessel => &self.vessels,
            EntityKind::Person => &self.persons,
            EntityKind::WasteType => &self.waste_types,
            EntityKind::SystemUser => &self.system_users,
        }
    }
}

async fn load_kind(backend: &dyn Backend, kind: EntityKind, limit: usize) -> NameIndex {
    match backend.list(kind, 0, limit).await {
        Some(entities) => entities.into_iter().collect(),
        None => {
            log::warn!(
                "Failed to load {}; every {} lookup will miss",
                kind.collection(),
                kind.label()
            );
            NameIndex::default()
        }
    }
}
