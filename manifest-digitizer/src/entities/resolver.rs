//! Free-text name resolution against the entity cache
//!
//! Resolution never guesses: a name either matches a cached entity after
//! trimming and lower-casing, or it is reported absent.

use std::borrow::Cow;

use super::cache::EntityCache;
use crate::api::{Entity, EntityId, EntityKind};

const PLACEHOLDER_INSPECTOR_NAME: &str = "Default Inspector";

#[derive(Debug, Clone)]
pub struct EntityResolver {
    cache: EntityCache,
    placeholder_inspector: EntityId,
}

impl EntityResolver {
    pub fn new(cache: EntityCache, placeholder_inspector: EntityId) -> Self {
        Self {
            cache,
            placeholder_inspector,
        }
    }

    pub fn cache(&self) -> &EntityCache {
        &self.cache
    }

    pub fn resolve_vessel(&self, name: &str) -> Option<&Entity> {
        self.lookup(EntityKind::Vessel, name)
    }

    /// Blank names are expected (not every manifest has a chef) and resolve
    /// to `None` silently
    pub fn resolve_person(&self, name: &str) -> Option<&Entity> {
        if name.trim().is_empty() {
            return None;
        }
        self.lookup(EntityKind::Person, name)
    }

    pub fn resolve_waste_type(&self, name: &str) -> Option<&Entity> {
        self.lookup(EntityKind::WasteType, name)
    }

    /// The inspector attributed to every compliance in a run
    ///
    /// The input carries no inspector column, so this is the first cached
    /// system user, or a placeholder when the backend has none.
    pub fn default_inspector(&self) -> Cow<'_, Entity> {
        match self.cache.system_users.first() {
            Some(user) => Cow::Borrowed(user),
            None => Cow::Owned(Entity::new(
                self.placeholder_inspector.clone(),
                PLACEHOLDER_INSPECTOR_NAME,
            )),
        }
    }

    fn lookup(&self, kind: EntityKind, name: &str) -> Option<&Entity> {
        let found = self.cache.index(kind).get(name);
        match found {
            Some(entity) => log::debug!(
                "Resolved {} '{}' to {} {:?}",
                kind.label(),
                name,
                entity.id,
                entity.fields
            ),
            None => log::warn!("{} '{}' not found in cache", capitalize(kind.label()), name),
        }
        found
    }
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
