//! Core types and traits for memrepo
//!
//! This crate defines the foundational types shared by the storage, search
//! and engine crates:
//! - EntityKey: primary key abstraction
//! - Reference: secondary `(key, value)` lookup pair
//! - RepositoryHolder / ResponseCode: uniform result envelope
//! - RepositorySettings: pass-through options bag
//! - Search types: SearchRequest, SearchResponse, EntitySearchResponse
//! - Policies: VersionPolicy, SignaturePolicy
//! - Repository: the generic repository contract
//! - RepositoryObserver: delete and search lifecycle callbacks
//! - Error: RepositoryError and Result alias

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod holder;
pub mod key;
pub mod observer;
pub mod policy;
pub mod reference;
pub mod search_types;
pub mod settings;
pub mod traits;

pub use error::{RepositoryError, Result};
pub use holder::{CapturedError, KeyVersion, RepositoryHolder, ResponseCode};
pub use key::EntityKey;
pub use observer::{DeleteTarget, RepositoryObserver};
pub use policy::{
    FieldSignaturePolicy, FnVersionPolicy, HashedSignaturePolicy, SignaturePolicy, VersionPolicy,
};
pub use reference::Reference;
pub use search_types::{
    EntitySearchResponse, FieldMetadata, FilterOp, OrderBy, SearchFilter, SearchRequest,
    SearchResponse, SortDirection, ID_FIELD,
};
pub use settings::RepositorySettings;
pub use traits::{Entity, Repository};
