//! In-process cache of reference data.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, RwLock};

use super::{ReferenceError, ReferenceItem, ReferenceKind, ReferenceStore};

type Items = HashMap<ReferenceKind, BTreeMap<i64, ReferenceItem>>;

/// Application-level cache of every reference item, keyed by kind and ID.
///
/// The store remains the source of truth; call [`ReferenceCache::refresh`]
/// after writing through the store.
#[derive(Default)]
pub struct ReferenceCache {
    items: RwLock<Items>,
    /// Held from the first listing until the swap so a slow refresh cannot
    /// overwrite a newer snapshot.
    refresh_lock: Mutex<()>,
}

impl ReferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cache populated from the store.
    pub fn load(store: &dyn ReferenceStore) -> Result<Self, ReferenceError> {
        let cache = Self::new();
        cache.refresh(store)?;
        Ok(cache)
    }

    /// Reload every kind from the store.
    pub fn refresh(&self, store: &dyn ReferenceStore) -> Result<(), ReferenceError> {
        let _guard = self.refresh_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut fresh = Items::new();
        for kind in ReferenceKind::ALL {
            let by_id = store
                .list(kind)?
                .into_iter()
                .map(|item| (item.id, item))
                .collect();
            fresh.insert(kind, by_id);
        }

        *self.items.write().unwrap_or_else(|e| e.into_inner()) = fresh;
        Ok(())
    }

    pub fn get(&self, kind: ReferenceKind, id: i64) -> Option<ReferenceItem> {
        self.items
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&kind)
            .and_then(|by_id| by_id.get(&id))
            .cloned()
    }

    pub fn contains(&self, kind: ReferenceKind, id: i64) -> bool {
        self.get(kind, id).is_some()
    }

    /// Name of an item, if cached.
    pub fn name_of(&self, kind: ReferenceKind, id: i64) -> Option<String> {
        self.get(kind, id).map(|item| item.name)
    }

    /// Look up an item by its name.
    pub fn find_by_name(&self, kind: ReferenceKind, name: &str) -> Option<ReferenceItem> {
        self.items
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&kind)
            .and_then(|by_id| by_id.values().find(|item| item.name == name))
            .cloned()
    }

    /// All cached items of a kind, ordered by ID.
    pub fn list(&self, kind: ReferenceKind) -> Vec<ReferenceItem> {
        self.items
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&kind)
            .map(|by_id| by_id.values().cloned().collect())
            .unwrap_or_default()
    }
}
