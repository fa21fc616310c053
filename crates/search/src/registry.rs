//! Search algorithm registry
//!
//! Maps lowercase algorithm ids to implementations and remembers which one
//! runs when a request names none. Registration happens at setup; mistakes
//! (empty id, duplicate id, default that was never registered) are setup
//! errors rather than request-time failures.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use memrepo_core::{EntityKey, RepositoryError, Result};
use tracing::debug;

use crate::algorithm::SearchAlgorithm;

/// Shared handle to a registered algorithm
pub type AlgorithmRef<K, E> = Arc<dyn SearchAlgorithm<K, E>>;

/// Registered search algorithms keyed by lowercase id
pub struct SearchRegistry<K, E> {
    algorithms: BTreeMap<String, AlgorithmRef<K, E>>,
    default_id: Option<String>,
}

impl<K: EntityKey, E> SearchRegistry<K, E> {
    /// Create an empty registry
    pub fn new() -> Self {
        SearchRegistry {
            algorithms: BTreeMap::new(),
            default_id: None,
        }
    }

    /// Register an algorithm under its (lowercased) id
    pub fn register(&mut self, algorithm: AlgorithmRef<K, E>) -> Result<()> {
        let id = normalize(algorithm.id());
        if id.is_empty() {
            return Err(RepositoryError::configuration(
                "search id must be a non-empty string",
            ));
        }
        if self.algorithms.contains_key(&id) {
            return Err(RepositoryError::DuplicateSearch(id));
        }
        debug!(target: "memrepo::search", search = %id, "Search algorithm registered");
        self.algorithms.insert(id, algorithm);
        Ok(())
    }

    /// Register an algorithm and make it the default
    pub fn register_default(&mut self, algorithm: AlgorithmRef<K, E>) -> Result<()> {
        let id = normalize(algorithm.id());
        self.register(algorithm)?;
        self.default_id = Some(id);
        Ok(())
    }

    /// Make an already registered algorithm the default
    pub fn set_default(&mut self, id: &str) -> Result<()> {
        let id = normalize(id);
        if !self.algorithms.contains_key(&id) {
            return Err(RepositoryError::UnknownSearch(id));
        }
        self.default_id = Some(id);
        Ok(())
    }

    /// Lowercase id a request resolves to: its own id, else the default
    pub fn resolve_id(&self, requested: Option<&str>) -> Option<String> {
        requested
            .map(normalize)
            .or_else(|| self.default_id.clone())
    }

    /// Look up by id (case-insensitive)
    pub fn get(&self, id: &str) -> Option<&AlgorithmRef<K, E>> {
        self.algorithms.get(&normalize(id))
    }

    /// Default algorithm id
    pub fn default_id(&self) -> Option<&str> {
        self.default_id.as_deref()
    }

    /// Registered ids in sorted order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.algorithms.keys().map(String::as_str)
    }

    /// Number of registered algorithms
    pub fn len(&self) -> usize {
        self.algorithms.len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty()
    }
}

impl<K: EntityKey, E> Default for SearchRegistry<K, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, E> fmt::Debug for SearchRegistry<K, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchRegistry")
            .field("ids", &self.algorithms.keys().collect::<Vec<_>>())
            .field("default_id", &self.default_id)
            .finish()
    }
}

fn normalize(id: &str) -> String {
    id.trim().to_lowercase()
}
