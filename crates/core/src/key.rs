//! Primary key abstraction
//!
//! The store treats keys as opaque values. It only needs equality, ordering
//! (for deterministic index iteration) and a string rendering used for the
//! search id column, reference diagnostics and ETag display.

use std::fmt::Debug;
use std::hash::Hash;
use uuid::Uuid;

/// A primary key usable by the entity store
///
/// Implemented for the common key types. Custom key types implement
/// [`key_string`](EntityKey::key_string) to control how the key is rendered.
pub trait EntityKey: Clone + Eq + Ord + Hash + Debug + Send + Sync + 'static {
    /// Render the key as a string
    fn key_string(&self) -> String;
}

impl EntityKey for String {
    fn key_string(&self) -> String {
        self.clone()
    }
}

impl EntityKey for Uuid {
    /// Simple (hyphen-free) lowercase form
    fn key_string(&self) -> String {
        self.simple().to_string()
    }
}

macro_rules! impl_entity_key_for_int {
    ($($t:ty),*) => {
        $(
            impl EntityKey for $t {
                fn key_string(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

impl_entity_key_for_int!(i32, i64, u32, u64);
