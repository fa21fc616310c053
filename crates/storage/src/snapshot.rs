//! Point-in-time view of an index
//!
//! Captured under shared access and then used without any lock held.
//! Containers are immutable, so the snapshot stays consistent no matter
//! what writers do afterwards.

use crate::index::ContainerRef;

/// Detached copy of the index contents
#[derive(Debug)]
pub struct IndexSnapshot<K, E> {
    containers: Vec<ContainerRef<K, E>>,
    etag: String,
}

impl<K, E> IndexSnapshot<K, E> {
    /// Create a snapshot from captured containers
    pub fn new(containers: Vec<ContainerRef<K, E>>, etag: String) -> Self {
        IndexSnapshot { containers, etag }
    }

    /// Repository ETag at capture time
    #[inline]
    pub fn etag(&self) -> &str {
        &self.etag
    }

    /// Number of containers
    #[inline]
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    /// True when the index was empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Iterate containers in key order
    pub fn iter(&self) -> std::slice::Iter<'_, ContainerRef<K, E>> {
        self.containers.iter()
    }
}

impl<'a, K, E> IntoIterator for &'a IndexSnapshot<K, E> {
    type Item = &'a ContainerRef<K, E>;
    type IntoIter = std::slice::Iter<'a, ContainerRef<K, E>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
