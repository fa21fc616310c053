//! Search algorithm trait
//!
//! An algorithm receives a detached [`IndexSnapshot`] plus the request and
//! yields matching [`SearchHit`]s. The repository takes the snapshot under
//! shared access and releases the gate before the algorithm runs, so
//! algorithms never extend the critical section. They must still be
//! synchronous and CPU-bound.

use std::fmt;
use std::sync::Arc;

use memrepo_core::{EntityKey, RepositoryError, SearchRequest};
use memrepo_storage::{ContainerRef, IndexSnapshot};
use thiserror::Error;

// ============================================================================
// SearchError
// ============================================================================

/// Failure inside a search algorithm
#[derive(Debug, Error)]
pub enum SearchError {
    /// The request cannot be evaluated by this algorithm
    #[error("Invalid search request: {0}")]
    InvalidRequest(String),

    /// The algorithm failed
    #[error("Search failed: {0}")]
    Failed(String),

    /// A matching entity could not be decoded
    #[error("Entity error: {0}")]
    Entity(#[from] RepositoryError),
}

// ============================================================================
// SearchHit
// ============================================================================

/// One match: the stored container, exposing its entity and properties
pub struct SearchHit<K, E> {
    container: ContainerRef<K, E>,
}

impl<K, E> SearchHit<K, E> {
    /// Wrap a container
    pub fn new(container: ContainerRef<K, E>) -> Self {
        SearchHit { container }
    }

    /// Entity id (the key rendered as a string)
    pub fn id(&self) -> &str {
        self.container.id()
    }

    /// Primary key
    pub fn key(&self) -> &K {
        self.container.key()
    }

    /// Decoded entity
    pub fn entity(&self) -> Result<&E, SearchError> {
        Ok(self.container.entity()?)
    }

    /// Searchable property value
    pub fn property(&self, name: &str) -> Option<&str> {
        self.container.property(name)
    }

    /// Underlying container
    pub fn container(&self) -> &ContainerRef<K, E> {
        &self.container
    }
}

impl<K, E> Clone for SearchHit<K, E> {
    fn clone(&self) -> Self {
        SearchHit {
            container: Arc::clone(&self.container),
        }
    }
}

impl<K: fmt::Debug, E> fmt::Debug for SearchHit<K, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchHit")
            .field("key", self.container.key())
            .finish()
    }
}

/// Lazy sequence of hits borrowing from a snapshot
pub type SearchHits<'a, K, E> = Box<dyn Iterator<Item = SearchHit<K, E>> + 'a>;

// ============================================================================
// SearchAlgorithm
// ============================================================================

/// Named, pluggable search strategy
///
/// # Thread Safety
///
/// Algorithms are shared by all callers and must be `Send + Sync`.
pub trait SearchAlgorithm<K: EntityKey, E>: Send + Sync {
    /// Identifier (matched case-insensitively)
    fn id(&self) -> &str;

    /// Execute against a snapshot
    fn search<'a>(
        &self,
        snapshot: &'a IndexSnapshot<K, E>,
        request: &SearchRequest,
    ) -> Result<SearchHits<'a, K, E>, SearchError>;
}

type SearchFn<K, E> = Arc<
    dyn Fn(&IndexSnapshot<K, E>, &SearchRequest) -> Result<Vec<SearchHit<K, E>>, SearchError>
        + Send
        + Sync,
>;

/// Closure-backed [`SearchAlgorithm`] that materializes its hits
pub struct FnSearchAlgorithm<K, E> {
    id: String,
    search: SearchFn<K, E>,
}

impl<K, E> FnSearchAlgorithm<K, E> {
    /// Create an algorithm from a closure
    pub fn new<F>(id: impl Into<String>, search: F) -> Self
    where
        F: Fn(&IndexSnapshot<K, E>, &SearchRequest) -> Result<Vec<SearchHit<K, E>>, SearchError>
            + Send
            + Sync
            + 'static,
    {
        FnSearchAlgorithm {
            id: id.into(),
            search: Arc::new(search),
        }
    }
}

impl<K: EntityKey, E: 'static> SearchAlgorithm<K, E> for FnSearchAlgorithm<K, E> {
    fn id(&self) -> &str {
        &self.id
    }

    fn search<'a>(
        &self,
        snapshot: &'a IndexSnapshot<K, E>,
        request: &SearchRequest,
    ) -> Result<SearchHits<'a, K, E>, SearchError> {
        let hits = (self.search)(snapshot, request)?;
        Ok(Box::new(hits.into_iter()))
    }
}

impl<K, E> fmt::Debug for FnSearchAlgorithm<K, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSearchAlgorithm").field("id", &self.id).finish()
    }
}
