//! EntityContainer: immutable snapshot of one stored entity
//!
//! The entity is serialized exactly once, at construction, and the blob is
//! cached. The entity itself is decoded from the blob on first access (or
//! at construction when eager decoding is configured), so what a reader sees
//! is always an independent copy of what the writer handed in.
//!
//! Nothing in a container changes after construction. Updates build a new
//! container and swap it into the index; readers holding the old `Arc`
//! keep observing the old snapshot.

use std::fmt;
use std::sync::Arc;

use memrepo_core::{EntityKey, Reference, Result};
use once_cell::sync::OnceCell;

use crate::serializer::SerializationContext;

/// Everything about a container except the entity and its blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerParts<K> {
    /// Primary key
    pub key: K,
    /// Secondary references owned by the entity
    pub references: Vec<Reference>,
    /// Searchable `(name, value)` properties
    pub properties: Vec<(String, String)>,
    /// Version token, if a version policy is active
    pub version_id: Option<String>,
    /// Integrity signature, if a signature policy is active
    pub signature: Option<String>,
}

impl<K> ContainerParts<K> {
    /// Parts with no references, properties, version or signature
    pub fn new(key: K) -> Self {
        ContainerParts {
            key,
            references: Vec::new(),
            properties: Vec::new(),
            version_id: None,
            signature: None,
        }
    }
}

/// Immutable stored entity
pub struct EntityContainer<K, E> {
    key: K,
    id: String,
    blob: Vec<u8>,
    entity: OnceCell<E>,
    references: Vec<Reference>,
    properties: Vec<(String, String)>,
    version_id: Option<String>,
    signature: Option<String>,
    context: Arc<SerializationContext<E>>,
}

impl<K: EntityKey, E: Clone> EntityContainer<K, E> {
    /// Serialize `entity` and build the container
    ///
    /// With `eager` set the blob is decoded straight away, which both caches
    /// the entity and proves the blob round-trips.
    pub fn new(
        parts: ContainerParts<K>,
        entity: &E,
        context: &Arc<SerializationContext<E>>,
        eager: bool,
    ) -> Result<Self> {
        let blob = context.encode(entity)?;
        let cell = OnceCell::new();
        if eager {
            let _ = cell.set(context.decode(&blob)?);
        }

        Ok(EntityContainer {
            id: parts.key.key_string(),
            key: parts.key,
            blob,
            entity: cell,
            references: parts.references,
            properties: parts.properties,
            version_id: parts.version_id,
            signature: parts.signature,
            context: Arc::clone(context),
        })
    }

    /// Independent decoded copy of the entity
    ///
    /// Clones the cached entity when present, otherwise decodes the blob
    /// without filling the cache. Writers call this before publishing a
    /// container so a blob that does not round-trip never reaches the index.
    pub fn decode_copy(&self) -> Result<E> {
        match self.entity.get() {
            Some(entity) => Ok(entity.clone()),
            None => self.context.decode(&self.blob),
        }
    }

    /// Copy of this container carrying a different signature
    ///
    /// Tests use it to simulate a tampered container; the original is
    /// untouched.
    pub fn with_signature(&self, signature: Option<String>) -> Self {
        EntityContainer {
            key: self.key.clone(),
            id: self.id.clone(),
            blob: self.blob.clone(),
            entity: self.entity.clone(),
            references: self.references.clone(),
            properties: self.properties.clone(),
            version_id: self.version_id.clone(),
            signature,
            context: Arc::clone(&self.context),
        }
    }
}

impl<K, E> EntityContainer<K, E> {
    /// Primary key
    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Key rendered as a string; the search id column
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Cached serialized blob
    #[inline]
    pub fn blob(&self) -> &[u8] {
        &self.blob
    }

    /// The stored entity, decoded from the blob on first access
    pub fn entity(&self) -> Result<&E> {
        self.entity.get_or_try_init(|| self.context.decode(&self.blob))
    }

    /// True once the entity has been decoded
    pub fn is_decoded(&self) -> bool {
        self.entity.get().is_some()
    }

    /// All references owned by the entity
    #[inline]
    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    /// Designated reference returned in response envelopes (the first one)
    #[inline]
    pub fn reference(&self) -> Option<&Reference> {
        self.references.first()
    }

    /// Searchable properties
    #[inline]
    pub fn properties(&self) -> &[(String, String)] {
        &self.properties
    }

    /// First property value with the given name
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Version token
    #[inline]
    pub fn version_id(&self) -> Option<&str> {
        self.version_id.as_deref()
    }

    /// Integrity signature
    #[inline]
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }
}

impl<K: fmt::Debug, E> fmt::Debug for EntityContainer<K, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityContainer")
            .field("key", &self.key)
            .field("blob_len", &self.blob.len())
            .field("references", &self.references)
            .field("version_id", &self.version_id)
            .field("signature", &self.signature)
            .finish()
    }
}
