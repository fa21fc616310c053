//! EntityIndex: primary map, secondary reference map and revision ordinal
//!
//! - `entities`: Key → Container (keys unique, ordered for deterministic scans)
//! - `references`: Reference → Key (each reference owned by one key)
//! - `revision`: bumped by exactly one on every successful add/replace/delete
//!
//! # Locking
//!
//! The index is not internally locked. Every method must be called under the
//! owning repository's gate: `&mut self` methods under exclusive access,
//! `&self` methods under shared access. The read-hit side table is the only
//! state touched through `&self`, and it is a concurrent map.
//!
//! # Invariant
//!
//! Every reference in `references` points at a key present in `entities`.
//! Replacing or deleting a container removes its old references and installs
//! the new ones within the same call.

use std::collections::BTreeMap;
use std::sync::Arc;

use memrepo_core::{EntityKey, Reference};
use rustc_hash::FxHashMap;

use crate::container::EntityContainer;
use crate::read_hits::ReadHitTable;
use crate::snapshot::IndexSnapshot;

/// Shared handle to a stored container
pub type ContainerRef<K, E> = Arc<EntityContainer<K, E>>;

/// Primary + secondary index over entity containers
#[derive(Debug)]
pub struct EntityIndex<K: EntityKey, E> {
    entities: BTreeMap<K, ContainerRef<K, E>>,
    references: FxHashMap<Reference, K>,
    read_hits: ReadHitTable<K>,
    revision: u64,
}

impl<K: EntityKey, E> EntityIndex<K, E> {
    /// Create an empty index at revision 0
    pub fn new() -> Self {
        EntityIndex {
            entities: BTreeMap::new(),
            references: FxHashMap::default(),
            read_hits: ReadHitTable::new(),
            revision: 0,
        }
    }

    /// Current revision ordinal
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of entities
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// True when no entities are stored
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of references
    #[inline]
    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    /// True if the key is stored
    pub fn contains_key(&self, key: &K) -> bool {
        self.entities.contains_key(key)
    }

    /// True if the reference is owned by some entity
    pub fn contains_reference(&self, reference: &Reference) -> bool {
        self.references.contains_key(reference)
    }

    /// Insert a new container
    ///
    /// Returns false, leaving the index untouched, if the key already exists
    /// or any of the container's references is already owned.
    pub fn add(&mut self, container: ContainerRef<K, E>) -> bool {
        if self.entities.contains_key(container.key()) {
            return false;
        }
        if self.reference_existing_match(container.references(), false, container.key()) {
            return false;
        }

        let key = container.key().clone();
        self.install_references(&container);
        self.read_hits.reset(&key);
        self.entities.insert(key, container);
        self.revision += 1;
        true
    }

    /// Look up by primary key
    pub fn get(&self, key: &K) -> Option<&ContainerRef<K, E>> {
        self.entities.get(key)
    }

    /// Look up by reference
    pub fn get_by_reference(&self, reference: &Reference) -> Option<&ContainerRef<K, E>> {
        self.references
            .get(reference)
            .and_then(|key| self.entities.get(key))
    }

    /// True if any of `references` is already owned
    ///
    /// With `exclude_same_key`, references owned by `key` itself do not count,
    /// which is what an update of `key` needs.
    pub fn reference_existing_match(
        &self,
        references: &[Reference],
        exclude_same_key: bool,
        key: &K,
    ) -> bool {
        references.iter().any(|r| match self.references.get(r) {
            Some(owner) => !(exclude_same_key && owner == key),
            None => false,
        })
    }

    /// Swap `old` for `new` under the same key
    ///
    /// Returns false, leaving the index untouched, if the keys differ, `old`
    /// is no longer the stored container, or one of `new`'s references is
    /// owned by another key.
    pub fn replace(&mut self, old: &ContainerRef<K, E>, new: ContainerRef<K, E>) -> bool {
        let key = old.key();
        if new.key() != key {
            return false;
        }
        match self.entities.get(key) {
            Some(current) if Arc::ptr_eq(current, old) => {}
            _ => return false,
        }
        if self.reference_existing_match(new.references(), true, key) {
            return false;
        }

        self.remove_references(old);
        self.install_references(&new);
        self.read_hits.reset(key);
        self.entities.insert(key.clone(), new);
        self.revision += 1;
        true
    }

    /// Remove by primary key, returning the removed container
    pub fn delete(&mut self, key: &K) -> Option<ContainerRef<K, E>> {
        let container = self.entities.remove(key)?;
        self.remove_references(&container);
        self.read_hits.remove(key);
        self.revision += 1;
        Some(container)
    }

    /// Remove by reference, returning the removed container
    pub fn delete_by_reference(&mut self, reference: &Reference) -> Option<ContainerRef<K, E>> {
        let key = self.references.get(reference)?.clone();
        self.delete(&key)
    }

    /// Bump the read-hit counter for a key, returning the new count
    pub fn record_read_hit(&self, key: &K) -> u64 {
        self.read_hits.record(key)
    }

    /// Read-hit count for a key
    pub fn read_hits(&self, key: &K) -> Option<u64> {
        self.read_hits.get(key)
    }

    /// Capture every container (in key order) along with an ETag
    ///
    /// Cloning `Arc` handles is cheap; the snapshot stays valid after the
    /// caller releases its access to the index.
    pub fn snapshot(&self, etag: String) -> IndexSnapshot<K, E> {
        IndexSnapshot::new(self.entities.values().cloned().collect(), etag)
    }

    fn install_references(&mut self, container: &EntityContainer<K, E>) {
        for r in container.references() {
            self.references.insert(r.clone(), container.key().clone());
        }
    }

    fn remove_references(&mut self, container: &EntityContainer<K, E>) {
        for r in container.references() {
            if self.references.get(r) == Some(container.key()) {
                self.references.remove(r);
            }
        }
    }
}

impl<K: EntityKey, E> Default for EntityIndex<K, E> {
    fn default() -> Self {
        Self::new()
    }
}
