//! Repository contract
//!
//! The operations consumed by API and message-handling layers. Every call
//! answers with a [`RepositoryHolder`]; `Err` is reserved for internal
//! failures such as a blob that no longer decodes.

use crate::error::Result;
use crate::holder::{KeyVersion, RepositoryHolder};
use crate::key::EntityKey;
use crate::search_types::{SearchRequest, SearchResponse};
use crate::settings::RepositorySettings;

/// Marker for types storable in a repository
pub trait Entity: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Entity for T {}

/// Generic entity repository contract
///
/// # Thread Safety
///
/// Implementations must be safe to call concurrently from many threads
/// sharing one instance.
pub trait Repository<K: EntityKey, E: Entity>: Send + Sync {
    /// Create a new entity (201, 409 on duplicate key/reference, 400 if read-only)
    fn create(
        &self,
        entity: &E,
        options: Option<&RepositorySettings>,
    ) -> Result<RepositoryHolder<K, E>>;

    /// Read by primary key (200, 404, 403 on signature failure)
    fn read(&self, key: &K, options: Option<&RepositorySettings>) -> Result<RepositoryHolder<K, E>>;

    /// Read by secondary reference (200, 404, 403 on signature failure)
    fn read_by_ref(
        &self,
        ref_key: &str,
        ref_value: &str,
        options: Option<&RepositorySettings>,
    ) -> Result<RepositoryHolder<K, E>>;

    /// Replace an existing entity (200, 404, 409 on conflict or stale version, 400 if read-only)
    fn update(
        &self,
        entity: &E,
        options: Option<&RepositorySettings>,
    ) -> Result<RepositoryHolder<K, E>>;

    /// Delete by primary key (200, 404, 400 if read-only)
    fn delete(
        &self,
        key: &K,
        options: Option<&RepositorySettings>,
    ) -> Result<RepositoryHolder<K, KeyVersion<K>>>;

    /// Delete by secondary reference (200, 404, 400 if read-only)
    fn delete_by_ref(
        &self,
        ref_key: &str,
        ref_value: &str,
        options: Option<&RepositorySettings>,
    ) -> Result<RepositoryHolder<K, KeyVersion<K>>>;

    /// Version token by primary key (200, 404)
    fn version(
        &self,
        key: &K,
        options: Option<&RepositorySettings>,
    ) -> Result<RepositoryHolder<K, KeyVersion<K>>>;

    /// Version token by secondary reference (200, 404)
    fn version_by_ref(
        &self,
        ref_key: &str,
        ref_value: &str,
        options: Option<&RepositorySettings>,
    ) -> Result<RepositoryHolder<K, KeyVersion<K>>>;

    /// Run a search (200, 404 unknown algorithm, 500 algorithm failure)
    fn search(
        &self,
        request: &SearchRequest,
        options: Option<&RepositorySettings>,
    ) -> Result<RepositoryHolder<SearchRequest, SearchResponse>>;
}
