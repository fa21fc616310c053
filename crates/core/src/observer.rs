//! Repository lifecycle observers
//!
//! A repository notifies its observers before a delete is attempted and
//! around every search. All callbacks have no-op defaults, so an observer
//! overrides only the notifications it cares about.

use std::fmt;

use crate::holder::ResponseCode;
use crate::reference::Reference;
use crate::search_types::SearchRequest;

/// What a delete was asked to remove
#[derive(Debug, PartialEq, Eq)]
pub enum DeleteTarget<'a, K> {
    /// Delete by primary key
    Key(&'a K),
    /// Delete by secondary reference
    Reference(&'a Reference),
}

impl<K> Clone for DeleteTarget<'_, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for DeleteTarget<'_, K> {}

impl<'a, K> DeleteTarget<'a, K> {
    /// The key, when the delete is by key
    pub fn key(&self) -> Option<&'a K> {
        match self {
            DeleteTarget::Key(key) => Some(key),
            DeleteTarget::Reference(_) => None,
        }
    }
}

/// Callbacks fired by a repository around deletes and searches
///
/// # Thread Safety
///
/// A single observer instance is shared by every thread using the
/// repository. Callbacks run with the index lock released.
pub trait RepositoryObserver<K>: Send + Sync + fmt::Debug {
    /// Called before a delete on a writable repository, whether or not the
    /// target exists
    fn before_delete(&self, target: DeleteTarget<'_, K>) {
        let _ = target;
    }

    /// Called before the search algorithm is resolved
    fn before_search(&self, request: &SearchRequest) {
        let _ = request;
    }

    /// Called once the search outcome is known
    ///
    /// `hits` is the number of rows or entities returned, zero on failure.
    fn after_search(&self, request: &SearchRequest, response_code: ResponseCode, hits: usize) {
        let _ = (request, response_code, hits);
    }
}
