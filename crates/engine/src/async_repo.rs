//! Async facade over [`MemoryRepository`]
//!
//! Each call runs the synchronous operation on tokio's blocking pool, so the
//! repository gate is acquired and released entirely on a blocking thread and
//! is never held across an `.await`.

use std::sync::Arc;

use memrepo_core::{
    Entity, EntityKey, EntitySearchResponse, KeyVersion, Repository, RepositoryError,
    RepositoryHolder, RepositorySettings, Result, SearchRequest, SearchResponse,
};

use crate::repository::MemoryRepository;

/// Cloneable async handle to a shared repository
pub struct AsyncRepository<K: EntityKey, E: Entity> {
    inner: Arc<MemoryRepository<K, E>>,
}

impl<K: EntityKey, E: Entity> Clone for AsyncRepository<K, E> {
    fn clone(&self) -> Self {
        AsyncRepository {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: EntityKey, E: Entity> AsyncRepository<K, E> {
    /// Wrap a repository
    pub fn new(repository: MemoryRepository<K, E>) -> Self {
        Self::from_shared(Arc::new(repository))
    }

    /// Wrap an already shared repository
    pub fn from_shared(inner: Arc<MemoryRepository<K, E>>) -> Self {
        AsyncRepository { inner }
    }

    /// The synchronous repository
    pub fn inner(&self) -> &Arc<MemoryRepository<K, E>> {
        &self.inner
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&MemoryRepository<K, E>) -> Result<T> + Send + 'static,
    {
        let repo = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || op(&*repo))
            .await
            .map_err(|e| RepositoryError::Internal(format!("repository task failed: {}", e)))?
    }

    /// See [`Repository::create`]
    pub async fn create(
        &self,
        entity: E,
        options: Option<RepositorySettings>,
    ) -> Result<RepositoryHolder<K, E>> {
        self.run(move |r| r.create(&entity, options.as_ref())).await
    }

    /// See [`Repository::read`]
    pub async fn read(
        &self,
        key: K,
        options: Option<RepositorySettings>,
    ) -> Result<RepositoryHolder<K, E>> {
        self.run(move |r| r.read(&key, options.as_ref())).await
    }

    /// See [`Repository::read_by_ref`]
    pub async fn read_by_ref(
        &self,
        ref_key: String,
        ref_value: String,
        options: Option<RepositorySettings>,
    ) -> Result<RepositoryHolder<K, E>> {
        self.run(move |r| r.read_by_ref(&ref_key, &ref_value, options.as_ref()))
            .await
    }

    /// See [`Repository::update`]
    pub async fn update(
        &self,
        entity: E,
        options: Option<RepositorySettings>,
    ) -> Result<RepositoryHolder<K, E>> {
        self.run(move |r| r.update(&entity, options.as_ref())).await
    }

    /// See [`Repository::delete`]
    pub async fn delete(
        &self,
        key: K,
        options: Option<RepositorySettings>,
    ) -> Result<RepositoryHolder<K, KeyVersion<K>>> {
        self.run(move |r| r.delete(&key, options.as_ref())).await
    }

    /// See [`Repository::delete_by_ref`]
    pub async fn delete_by_ref(
        &self,
        ref_key: String,
        ref_value: String,
        options: Option<RepositorySettings>,
    ) -> Result<RepositoryHolder<K, KeyVersion<K>>> {
        self.run(move |r| r.delete_by_ref(&ref_key, &ref_value, options.as_ref()))
            .await
    }

    /// See [`Repository::version`]
    pub async fn version(
        &self,
        key: K,
        options: Option<RepositorySettings>,
    ) -> Result<RepositoryHolder<K, KeyVersion<K>>> {
        self.run(move |r| r.version(&key, options.as_ref())).await
    }

    /// See [`Repository::version_by_ref`]
    pub async fn version_by_ref(
        &self,
        ref_key: String,
        ref_value: String,
        options: Option<RepositorySettings>,
    ) -> Result<RepositoryHolder<K, KeyVersion<K>>> {
        self.run(move |r| r.version_by_ref(&ref_key, &ref_value, options.as_ref()))
            .await
    }

    /// See [`Repository::search`]
    pub async fn search(
        &self,
        request: SearchRequest,
        options: Option<RepositorySettings>,
    ) -> Result<RepositoryHolder<SearchRequest, SearchResponse>> {
        self.run(move |r| r.search(&request, options.as_ref())).await
    }

    /// See [`MemoryRepository::search_entity`]
    pub async fn search_entity(
        &self,
        request: SearchRequest,
        options: Option<RepositorySettings>,
    ) -> Result<RepositoryHolder<SearchRequest, EntitySearchResponse<E>>> {
        self.run(move |r| Ok(r.search_entity(&request, options.as_ref())))
            .await
    }
}
