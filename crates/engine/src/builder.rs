//! Repository builder for fluent configuration
//!
//! Every injection point of a [`MemoryRepository`] is supplied here: the
//! key, reference and property makers, version and signature policies, the
//! serialization context, search algorithms, lifecycle observers and
//! entities to prepopulate.
//! Data-like settings come from a [`RepositoryConfig`].
//!
//! ```ignore
//! let repo = MemoryRepository::builder(|u: &User| u.id)
//!     .references(|u| [("email", u.email.clone())])
//!     .properties(|u| [("name", u.name.clone())])
//!     .version_policy(FnVersionPolicy::new(|u: &User| u.version.clone(), |u, v| u.version = v))
//!     .search_as_default(PropertyScanSearch::new())
//!     .build()?;
//! ```
//!
//! Setup mistakes fail fast from [`RepositoryBuilder::build`]: no serializer,
//! duplicate or empty search id, a default search that was never registered,
//! an unknown codec, or a prepopulated entity the repository rejects.

use std::fmt;
use std::sync::Arc;

use memrepo_core::{
    Entity, EntityKey, Reference, Repository, RepositoryError, RepositoryObserver, Result,
    SignaturePolicy, VersionPolicy,
};
use memrepo_search::{SearchAlgorithm, SearchRegistry};
use memrepo_storage::{
    EntityIndex, EntitySerializer, JsonSerializer, SerializationContext, StorageCodec,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::config::RepositoryConfig;
use crate::gate::Atomic;
use crate::repository::MemoryRepository;

/// Derives the primary key of an entity
pub type KeyMaker<K, E> = Arc<dyn Fn(&E) -> K + Send + Sync>;

/// Derives the references of an entity; the first is the designated one
pub type ReferenceMaker<E> = Arc<dyn Fn(&E) -> Vec<Reference> + Send + Sync>;

/// Derives the searchable `(name, value)` properties of an entity
pub type PropertiesMaker<E> = Arc<dyn Fn(&E) -> Vec<(String, String)> + Send + Sync>;

// ============================================================================
// RepositoryBuilder
// ============================================================================

/// Builder for [`MemoryRepository`]
pub struct RepositoryBuilder<K: EntityKey, E: Entity> {
    key_maker: KeyMaker<K, E>,
    reference_maker: Option<ReferenceMaker<E>>,
    properties_maker: Option<PropertiesMaker<E>>,
    version_policy: Option<Arc<dyn VersionPolicy<E>>>,
    signature_policy: Option<Arc<dyn SignaturePolicy<E>>>,
    serializer: Option<Arc<dyn EntitySerializer<E>>>,
    codec: Option<Arc<dyn StorageCodec>>,
    searches: Vec<Arc<dyn SearchAlgorithm<K, E>>>,
    default_search: Option<String>,
    prepopulate: Vec<E>,
    observers: Vec<Arc<dyn RepositoryObserver<K>>>,
    config: RepositoryConfig,
}

impl<K: EntityKey, E: Entity + Serialize + DeserializeOwned> RepositoryBuilder<K, E> {
    /// Create a builder with the JSON serializer preset
    pub fn new<F>(key_maker: F) -> Self
    where
        F: Fn(&E) -> K + Send + Sync + 'static,
    {
        Self::with_key_maker(key_maker).serializer(JsonSerializer)
    }
}

impl<K: EntityKey, E: Entity> RepositoryBuilder<K, E> {
    /// Create a builder with no serializer
    ///
    /// For entity types without serde support; a serializer must be
    /// supplied with [`serializer`](Self::serializer) before `build()`.
    pub fn with_key_maker<F>(key_maker: F) -> Self
    where
        F: Fn(&E) -> K + Send + Sync + 'static,
    {
        RepositoryBuilder {
            key_maker: Arc::new(key_maker),
            reference_maker: None,
            properties_maker: None,
            version_policy: None,
            signature_policy: None,
            serializer: None,
            codec: None,
            searches: Vec::new(),
            default_search: None,
            prepopulate: Vec::new(),
            observers: Vec::new(),
            config: RepositoryConfig::default(),
        }
    }

    /// Set the reference maker
    pub fn references<F, I, R>(mut self, maker: F) -> Self
    where
        F: Fn(&E) -> I + Send + Sync + 'static,
        I: IntoIterator<Item = R>,
        R: Into<Reference>,
    {
        self.reference_maker = Some(Arc::new(move |e: &E| {
            maker(e).into_iter().map(Into::into).collect::<Vec<Reference>>()
        }));
        self
    }

    /// Set the searchable property maker
    pub fn properties<F, I, N, V>(mut self, maker: F) -> Self
    where
        F: Fn(&E) -> I + Send + Sync + 'static,
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        self.properties_maker = Some(Arc::new(move |e: &E| {
            maker(e)
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect::<Vec<(String, String)>>()
        }));
        self
    }

    /// Enable versioning (and optimistic locking, if the policy supports it)
    pub fn version_policy(mut self, policy: impl VersionPolicy<E> + 'static) -> Self {
        self.version_policy = Some(Arc::new(policy));
        self
    }

    /// Enable integrity signatures
    pub fn signature_policy(mut self, policy: impl SignaturePolicy<E> + 'static) -> Self {
        self.signature_policy = Some(Arc::new(policy));
        self
    }

    /// Replace the entity serializer
    pub fn serializer(mut self, serializer: impl EntitySerializer<E> + 'static) -> Self {
        self.serializer = Some(Arc::new(serializer));
        self
    }

    /// Override the storage codec named in the config
    pub fn codec(mut self, codec: impl StorageCodec + 'static) -> Self {
        self.codec = Some(Arc::new(codec));
        self
    }

    /// Register a search algorithm
    pub fn search(mut self, algorithm: impl SearchAlgorithm<K, E> + 'static) -> Self {
        self.searches.push(Arc::new(algorithm));
        self
    }

    /// Register a search algorithm and make it the default
    pub fn search_as_default(mut self, algorithm: impl SearchAlgorithm<K, E> + 'static) -> Self {
        self.default_search = Some(algorithm.id().to_string());
        self.search(algorithm)
    }

    /// Search id used when a request names none (overrides the config)
    pub fn default_search(mut self, id: impl Into<String>) -> Self {
        self.default_search = Some(id.into());
        self
    }

    /// Entities created before the read-only flag takes effect
    pub fn prepopulate(mut self, entities: impl IntoIterator<Item = E>) -> Self {
        self.prepopulate.extend(entities);
        self
    }

    /// Add a lifecycle observer; observers are notified in the order added
    pub fn observer<O>(mut self, observer: O) -> Self
    where
        O: RepositoryObserver<K> + 'static,
    {
        self.observers.push(Arc::new(observer));
        self
    }

    /// Replace the whole config
    ///
    /// Overwrites earlier `read_only`, `collection_name` and
    /// `eager_deserialize` calls.
    pub fn config(mut self, config: RepositoryConfig) -> Self {
        self.config = config;
        self
    }

    /// Reject writes once built
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.config.read_only = read_only;
        self
    }

    /// Name used as the ETag prefix
    pub fn collection_name(mut self, name: impl Into<String>) -> Self {
        self.config.collection_name = Some(name.into());
        self
    }

    /// Decode entities when stored instead of on first read
    pub fn eager_deserialize(mut self, eager: bool) -> Self {
        self.config.eager_deserialize = eager;
        self
    }

    /// Validate the setup and build the repository
    ///
    /// # Errors
    ///
    /// Returns a configuration error if:
    /// - no serializer was registered
    /// - the config is invalid or names an unknown codec
    /// - a search id is empty or registered twice
    /// - the default search id was never registered
    /// - a prepopulated entity is not accepted with 201
    pub fn build(self) -> Result<MemoryRepository<K, E>> {
        self.config.validate()?;

        let serializer = self
            .serializer
            .ok_or_else(|| RepositoryError::configuration("no serializer registered"))?;
        let codec = match self.codec {
            Some(codec) => codec,
            None => self.config.storage_codec()?,
        };
        let context = Arc::new(SerializationContext::new(serializer, codec));

        let mut searches = SearchRegistry::new();
        for algorithm in self.searches {
            searches.register(algorithm)?;
        }
        if let Some(id) = self.default_search.as_ref().or(self.config.default_search.as_ref()) {
            searches.set_default(id)?;
        }

        let collection_name = self
            .config
            .collection_name
            .clone()
            .unwrap_or_else(|| short_type_name::<E>().to_string());
        let collection_id = format!(
            "{}:{}",
            collection_name,
            Uuid::new_v4().simple().to_string().to_uppercase()
        );

        let mut repository = MemoryRepository {
            index: Atomic::new(EntityIndex::new()),
            collection_id,
            read_only: false,
            eager_deserialize: self.config.eager_deserialize,
            key_maker: self.key_maker,
            reference_maker: self.reference_maker,
            properties_maker: self.properties_maker,
            version_policy: self.version_policy,
            signature_policy: self.signature_policy,
            context,
            searches,
            observers: self.observers,
        };

        for entity in &self.prepopulate {
            let holder = repository.create(entity, None)?;
            if !holder.is_success() {
                return Err(RepositoryError::configuration(format!(
                    "prepopulated entity {:?} rejected with {}",
                    holder.key, holder.response_code
                )));
            }
        }
        repository.read_only = self.config.read_only;

        info!(
            target: "memrepo::repository",
            collection = %repository.collection_id,
            entities = repository.count(),
            read_only = repository.read_only,
            "Repository created"
        );
        Ok(repository)
    }
}

impl<K: EntityKey, E: Entity> fmt::Debug for RepositoryBuilder<K, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryBuilder")
            .field("config", &self.config)
            .field("searches", &self.searches.len())
            .field("prepopulate", &self.prepopulate.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Last path segment of a type name, without generic arguments
fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
