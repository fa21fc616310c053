//! In-memory repository engine
//!
//! `MemoryRepository` orchestrates every operation of the repository
//! contract:
//! - derives key, references and searchable properties through injected makers
//! - builds immutable [`EntityContainer`]s (version token, signature, blob)
//! - takes the [`Atomic`] gate in the right mode and talks to the index
//! - answers with a [`RepositoryHolder`] carrying the status code
//!
//! # Status codes
//!
//! | code | outcome |
//! |------|---------|
//! | 200 | read / update / delete / version / search succeeded |
//! | 201 | entity created |
//! | 400 | write rejected: repository is read-only |
//! | 403 | stored signature no longer matches the entity |
//! | 404 | key, reference or search algorithm not found |
//! | 409 | duplicate key or reference, or stale version on update |
//! | 500 | search algorithm failed or panicked |
//!
//! `Err` is reserved for internal failures (a blob that does not encode or
//! decode) and never used for the outcomes above.
//!
//! # Thread Safety
//!
//! All operations take `&self` and may be called from any number of threads.
//! Containers are immutable once published; a reader holding one keeps a
//! consistent view after it is replaced or deleted.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use memrepo_core::{
    DeleteTarget, Entity, EntityKey, EntitySearchResponse, KeyVersion, Reference, Repository,
    RepositoryHolder, RepositoryObserver, RepositorySettings, ResponseCode, Result,
    SearchRequest, SearchResponse, SignaturePolicy, VersionPolicy,
};
use memrepo_search::{SearchError, SearchHits, SearchRegistry};
use memrepo_storage::{
    ContainerParts, ContainerRef, EntityContainer, EntityIndex, SerializationContext,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::builder::{KeyMaker, PropertiesMaker, ReferenceMaker, RepositoryBuilder};
use crate::gate::Atomic;

const READ_ONLY_MESSAGE: &str = "Repository is read-only.";

/// In-memory implementation of [`Repository`]
pub struct MemoryRepository<K: EntityKey, E: Entity> {
    pub(crate) index: Atomic<EntityIndex<K, E>>,
    pub(crate) collection_id: String,
    pub(crate) read_only: bool,
    pub(crate) eager_deserialize: bool,
    pub(crate) key_maker: KeyMaker<K, E>,
    pub(crate) reference_maker: Option<ReferenceMaker<E>>,
    pub(crate) properties_maker: Option<PropertiesMaker<E>>,
    pub(crate) version_policy: Option<Arc<dyn VersionPolicy<E>>>,
    pub(crate) signature_policy: Option<Arc<dyn SignaturePolicy<E>>>,
    pub(crate) context: Arc<SerializationContext<E>>,
    pub(crate) searches: SearchRegistry<K, E>,
    pub(crate) observers: Vec<Arc<dyn RepositoryObserver<K>>>,
}

enum ReadOutcome<K, E> {
    Missing,
    Tampered(K),
    Found(ContainerRef<K, E>, E),
}

enum UpdateOutcome {
    Missing,
    Conflict,
    Stale,
    Replaced,
}

impl<K: EntityKey, E: Entity + Serialize + DeserializeOwned> MemoryRepository<K, E> {
    /// Start a builder with the JSON serializer preset
    pub fn builder<F>(key_maker: F) -> RepositoryBuilder<K, E>
    where
        F: Fn(&E) -> K + Send + Sync + 'static,
    {
        RepositoryBuilder::new(key_maker)
    }
}

impl<K: EntityKey, E: Entity> MemoryRepository<K, E> {
    // ========================================================================
    // Extra surface
    // ========================================================================

    /// Number of stored entities
    pub fn count(&self) -> usize {
        self.index.read(|index| index.len())
    }

    /// Number of live references
    pub fn count_reference(&self) -> usize {
        self.index.read(|index| index.reference_count())
    }

    /// True if an entity is stored under `key`
    pub fn contains_key(&self, key: &K) -> bool {
        self.index.read(|index| index.contains_key(key))
    }

    /// True if some entity owns `reference`
    pub fn contains_reference(&self, reference: &Reference) -> bool {
        self.index.read(|index| index.contains_reference(reference))
    }

    /// Current `<collectionInstanceId>:<revisionOrdinal>`
    pub fn etag(&self) -> String {
        self.index.read(|index| self.etag_of(index))
    }

    /// Identity generated at construction, the ETag prefix
    pub fn collection_id(&self) -> &str {
        &self.collection_id
    }

    /// Successful reads and version lookups since the entity was last written
    pub fn read_hits(&self, key: &K) -> Option<u64> {
        self.index.read(|index| index.read_hits(key))
    }

    /// True when writes are rejected with 400
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Search id used when a request names none
    pub fn default_search_id(&self) -> Option<&str> {
        self.searches.default_id()
    }

    /// Registered search ids (lowercase)
    pub fn search_ids(&self) -> Vec<String> {
        self.searches.ids().map(str::to_string).collect()
    }

    /// Search returning the matching entities instead of a table
    pub fn search_entity(
        &self,
        request: &SearchRequest,
        options: Option<&RepositorySettings>,
    ) -> RepositoryHolder<SearchRequest, EntitySearchResponse<E>> {
        self.search_internal(request, options, |hits| {
            let mut response = EntitySearchResponse::default();
            for hit in hits {
                response.data.push(hit.entity()?.clone());
            }
            Ok(response)
        })
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn notify<F: Fn(&dyn RepositoryObserver<K>)>(&self, event: F) {
        for observer in &self.observers {
            event(observer.as_ref());
        }
    }

    fn etag_of(&self, index: &EntityIndex<K, E>) -> String {
        format!("{}:{}", self.collection_id, index.revision())
    }

    /// Build the container for a write along with the decoded copy the
    /// caller gets back. Fails before any index access if the blob does
    /// not round-trip.
    fn build_container(
        &self,
        key: K,
        entity: &E,
        version_id: Option<String>,
    ) -> Result<(ContainerRef<K, E>, E)> {
        let mut parts = ContainerParts::new(key);
        if let Some(maker) = &self.reference_maker {
            parts.references = maker(entity);
        }
        if let Some(maker) = &self.properties_maker {
            parts.properties = maker(entity);
        }
        parts.signature = self
            .signature_policy
            .as_ref()
            .map(|policy| policy.calculate(entity, version_id.as_deref()));
        parts.version_id = version_id;

        let container = EntityContainer::new(parts, entity, &self.context, self.eager_deserialize)?;
        let stored = container.decode_copy()?;
        Ok((Arc::new(container), stored))
    }

    fn signature_valid(&self, container: &EntityContainer<K, E>, entity: &E) -> bool {
        match &self.signature_policy {
            None => true,
            Some(policy) => container
                .signature()
                .map_or(false, |sig| policy.verify(entity, container.version_id(), sig)),
        }
    }

    fn read_internal<F>(
        &self,
        lookup: F,
        options: Option<&RepositorySettings>,
    ) -> Result<RepositoryHolder<K, E>>
    where
        F: FnOnce(&EntityIndex<K, E>) -> Option<&ContainerRef<K, E>>,
    {
        let outcome = self.index.read(|index| -> Result<ReadOutcome<K, E>> {
            let Some(container) = lookup(index) else {
                return Ok(ReadOutcome::Missing);
            };
            let entity = container.entity()?;
            if !self.signature_valid(container, entity) {
                return Ok(ReadOutcome::Tampered(container.key().clone()));
            }
            index.record_read_hit(container.key());
            Ok(ReadOutcome::Found(Arc::clone(container), entity.clone()))
        })?;

        let holder = match outcome {
            ReadOutcome::Missing => RepositoryHolder::new(ResponseCode::NotFound),
            ReadOutcome::Tampered(key) => {
                warn!(
                    target: "memrepo::repository",
                    collection = %self.collection_id,
                    key = ?key,
                    "Entity read signature verification failed"
                );
                RepositoryHolder::new(ResponseCode::Forbidden).with_key(Some(key))
            }
            ReadOutcome::Found(container, entity) => RepositoryHolder::new(ResponseCode::Ok)
                .with_key(Some(container.key().clone()))
                .with_entity(Some(entity))
                .with_reference(container.reference().cloned()),
        };
        Ok(holder.with_settings(options))
    }

    fn version_internal<F>(
        &self,
        lookup: F,
        requested: Option<&K>,
        options: Option<&RepositorySettings>,
    ) -> RepositoryHolder<K, KeyVersion<K>>
    where
        F: FnOnce(&EntityIndex<K, E>) -> Option<&ContainerRef<K, E>>,
    {
        let found = self.index.read(|index| {
            let container = lookup(index)?;
            index.record_read_hit(container.key());
            Some(Arc::clone(container))
        });

        let holder = match found {
            Some(container) => {
                let key = container.key().clone();
                let version = container.version_id().unwrap_or_default().to_string();
                RepositoryHolder::new(ResponseCode::Ok)
                    .with_key(Some(key.clone()))
                    .with_entity(Some((key, version)))
                    .with_reference(container.reference().cloned())
            }
            None => RepositoryHolder::new(ResponseCode::NotFound)
                .with_key(requested.cloned())
                .with_entity(requested.map(|k| (k.clone(), String::new()))),
        };
        holder.with_settings(options)
    }

    fn delete_internal<F>(
        &self,
        remove: F,
        target: DeleteTarget<'_, K>,
        options: Option<&RepositorySettings>,
    ) -> RepositoryHolder<K, KeyVersion<K>>
    where
        F: FnOnce(&mut EntityIndex<K, E>) -> Option<ContainerRef<K, E>>,
    {
        let requested = target.key();
        if self.read_only {
            return RepositoryHolder::new(ResponseCode::BadRequest)
                .with_key(requested.cloned())
                .with_entity(requested.map(|k| (k.clone(), String::new())))
                .with_message(READ_ONLY_MESSAGE)
                .with_settings(options);
        }

        self.notify(|observer| observer.before_delete(target));
        let holder = match self.index.write(remove) {
            Some(container) => {
                let key = container.key().clone();
                debug!(target: "memrepo::repository", key = ?key, "Entity deleted");
                RepositoryHolder::new(ResponseCode::Ok)
                    .with_key(Some(key.clone()))
                    .with_entity(Some((key, String::new())))
                    .with_reference(container.reference().cloned())
            }
            None => RepositoryHolder::new(ResponseCode::NotFound)
                .with_key(requested.cloned())
                .with_entity(requested.map(|k| (k.clone(), String::new()))),
        };
        holder.with_settings(options)
    }

    fn search_internal<S, F>(
        &self,
        request: &SearchRequest,
        options: Option<&RepositorySettings>,
        load: F,
    ) -> RepositoryHolder<SearchRequest, S>
    where
        S: Paged,
        F: for<'a> FnOnce(SearchHits<'a, K, E>) -> std::result::Result<S, SearchError>,
    {
        self.notify(|observer| observer.before_search(request));
        let holder = RepositoryHolder::new(ResponseCode::Ok)
            .with_key(Some(request.clone()))
            .with_settings(options);

        let search_id = self
            .searches
            .resolve_id(request.id.as_deref())
            .unwrap_or_default();
        let Some(algorithm) = self.searches.get(&search_id) else {
            debug!(target: "memrepo::repository", search = %search_id, "Search algorithm not found");
            self.notify(|observer| observer.after_search(request, ResponseCode::NotFound, 0));
            return holder
                .with_message(format!("Search algorithm '{}' cannot be found.", search_id))
                .with_response_code(ResponseCode::NotFound);
        };

        // Snapshot under shared access; the algorithm runs with the gate released.
        let snapshot = self
            .index
            .read(|index| index.snapshot(self.etag_of(index)));

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let hits = algorithm.search(&snapshot, request)?;
            load(hits)
        }));

        let failure = match outcome {
            Ok(Ok(mut response)) => {
                response.set_paging(
                    snapshot.etag().to_string(),
                    request.skip_value(),
                    request.top_value(),
                );
                let hits = response.hit_count();
                self.notify(|observer| observer.after_search(request, ResponseCode::Ok, hits));
                return holder.with_entity(Some(response));
            }
            Ok(Err(e)) => e,
            Err(panic) => SearchError::Failed(format!("panicked: {}", panic_message(panic.as_ref()))),
        };

        error!(
            target: "memrepo::repository",
            search = %search_id,
            error = %failure,
            "Search algorithm unexpected exception"
        );
        self.notify(|observer| observer.after_search(request, ResponseCode::InternalError, 0));
        holder
            .with_message(format!("Search algorithm '{}' unexpected exception.", search_id))
            .with_error(Arc::new(failure))
            .with_response_code(ResponseCode::InternalError)
    }
}

impl<K: EntityKey, E: Entity> Repository<K, E> for MemoryRepository<K, E> {
    fn create(
        &self,
        entity: &E,
        options: Option<&RepositorySettings>,
    ) -> Result<RepositoryHolder<K, E>> {
        let key = (self.key_maker)(entity);
        if self.read_only {
            return Ok(RepositoryHolder::new(ResponseCode::BadRequest)
                .with_key(Some(key))
                .with_message(READ_ONLY_MESSAGE)
                .with_settings(options));
        }

        let version = self
            .version_policy
            .as_ref()
            .and_then(|policy| policy.version_of(entity));
        let (container, stored) = self.build_container(key.clone(), entity, version)?;

        if !self.index.write(|index| index.add(Arc::clone(&container))) {
            debug!(target: "memrepo::repository", key = ?key, "Create rejected: key or reference conflict");
            return Ok(RepositoryHolder::new(ResponseCode::Conflict)
                .with_key(Some(key))
                .with_settings(options));
        }

        debug!(target: "memrepo::repository", key = ?key, "Entity created");
        Ok(RepositoryHolder::new(ResponseCode::Created)
            .with_key(Some(key))
            .with_entity(Some(stored))
            .with_reference(container.reference().cloned())
            .with_settings(options))
    }

    fn read(&self, key: &K, options: Option<&RepositorySettings>) -> Result<RepositoryHolder<K, E>> {
        self.read_internal(|index| index.get(key), options)
    }

    fn read_by_ref(
        &self,
        ref_key: &str,
        ref_value: &str,
        options: Option<&RepositorySettings>,
    ) -> Result<RepositoryHolder<K, E>> {
        let reference = Reference::new(ref_key, ref_value);
        self.read_internal(|index| index.get_by_reference(&reference), options)
    }

    fn update(
        &self,
        entity: &E,
        options: Option<&RepositorySettings>,
    ) -> Result<RepositoryHolder<K, E>> {
        let key = (self.key_maker)(entity);
        if self.read_only {
            return Ok(RepositoryHolder::new(ResponseCode::BadRequest)
                .with_key(Some(key))
                .with_message(READ_ONLY_MESSAGE)
                .with_settings(options));
        }

        // The replacement is fully built before the gate is taken; only the
        // comparisons against the stored container need exclusive access.
        let ((candidate, stored), incoming_version) = match &self.version_policy {
            Some(policy) if policy.supports_optimistic_locking() => {
                let incoming = policy.version_of(entity);
                let mut next = entity.clone();
                let version = policy.apply_new_version(&mut next);
                (self.build_container(key.clone(), &next, Some(version))?, Some(incoming))
            }
            Some(policy) => (
                self.build_container(key.clone(), entity, policy.version_of(entity))?,
                None,
            ),
            None => (self.build_container(key.clone(), entity, None)?, None),
        };

        let outcome = self.index.write(|index| {
            let Some(old) = index.get(&key).cloned() else {
                return UpdateOutcome::Missing;
            };
            if index.reference_existing_match(candidate.references(), true, &key) {
                return UpdateOutcome::Conflict;
            }
            if let Some(incoming) = &incoming_version {
                if incoming.as_deref() != old.version_id() {
                    return UpdateOutcome::Stale;
                }
            }
            if index.replace(&old, Arc::clone(&candidate)) {
                UpdateOutcome::Replaced
            } else {
                UpdateOutcome::Conflict
            }
        });

        let holder = match outcome {
            UpdateOutcome::Missing => {
                RepositoryHolder::new(ResponseCode::NotFound).with_key(Some(key))
            }
            UpdateOutcome::Conflict => {
                debug!(target: "memrepo::repository", key = ?key, "Update rejected: reference conflict");
                RepositoryHolder::new(ResponseCode::Conflict).with_key(Some(key))
            }
            UpdateOutcome::Stale => {
                warn!(
                    target: "memrepo::repository",
                    collection = %self.collection_id,
                    key = ?key,
                    "Update rejected: stale version"
                );
                RepositoryHolder::new(ResponseCode::Conflict).with_key(Some(key))
            }
            UpdateOutcome::Replaced => {
                debug!(target: "memrepo::repository", key = ?key, "Entity updated");
                RepositoryHolder::new(ResponseCode::Ok)
                    .with_key(Some(key))
                    .with_entity(Some(stored))
                    .with_reference(candidate.reference().cloned())
            }
        };
        Ok(holder.with_settings(options))
    }

    fn delete(
        &self,
        key: &K,
        options: Option<&RepositorySettings>,
    ) -> Result<RepositoryHolder<K, KeyVersion<K>>> {
        Ok(self.delete_internal(|index| index.delete(key), DeleteTarget::Key(key), options))
    }

    fn delete_by_ref(
        &self,
        ref_key: &str,
        ref_value: &str,
        options: Option<&RepositorySettings>,
    ) -> Result<RepositoryHolder<K, KeyVersion<K>>> {
        let reference = Reference::new(ref_key, ref_value);
        Ok(self.delete_internal(
            |index| index.delete_by_reference(&reference),
            DeleteTarget::Reference(&reference),
            options,
        ))
    }

    fn version(
        &self,
        key: &K,
        options: Option<&RepositorySettings>,
    ) -> Result<RepositoryHolder<K, KeyVersion<K>>> {
        Ok(self.version_internal(|index| index.get(key), Some(key), options))
    }

    fn version_by_ref(
        &self,
        ref_key: &str,
        ref_value: &str,
        options: Option<&RepositorySettings>,
    ) -> Result<RepositoryHolder<K, KeyVersion<K>>> {
        let reference = Reference::new(ref_key, ref_value);
        Ok(self.version_internal(|index| index.get_by_reference(&reference), None, options))
    }

    fn search(
        &self,
        request: &SearchRequest,
        options: Option<&RepositorySettings>,
    ) -> Result<RepositoryHolder<SearchRequest, SearchResponse>> {
        Ok(self.search_internal(request, options, |hits| {
            let mut response = SearchResponse::for_request(request);
            for hit in hits {
                let mut row = Vec::with_capacity(request.select.len() + 1);
                row.push(Some(hit.id().to_string()));
                row.extend(
                    request
                        .select
                        .iter()
                        .map(|field| hit.property(field).map(str::to_string)),
                );
                response.data.push(row);
            }
            Ok(response)
        }))
    }
}

impl<K: EntityKey, E: Entity> fmt::Debug for MemoryRepository<K, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryRepository")
            .field("collection_id", &self.collection_id)
            .field("read_only", &self.read_only)
            .field("context", &self.context)
            .field("searches", &self.searches.ids().collect::<Vec<_>>())
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Search responses carrying ETag and paging
pub(crate) trait Paged {
    fn set_paging(&mut self, etag: String, skip: usize, top: Option<usize>);

    fn hit_count(&self) -> usize;
}

impl Paged for SearchResponse {
    fn set_paging(&mut self, etag: String, skip: usize, top: Option<usize>) {
        self.etag = Some(etag);
        self.skip = skip;
        self.top = top;
    }

    fn hit_count(&self) -> usize {
        self.data.len()
    }
}

impl<E> Paged for EntitySearchResponse<E> {
    fn set_paging(&mut self, etag: String, skip: usize, top: Option<usize>) {
        self.etag = Some(etag);
        self.skip = skip;
        self.top = top;
    }

    fn hit_count(&self) -> usize {
        self.data.len()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("(non-string panic)")
}
