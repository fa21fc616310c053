//! memrepo - concurrency-safe in-memory entity repository
//!
//! A generic repository over caller-defined key and entity types:
//! create/read/update/delete by primary key, lookup and delete by secondary
//! reference, optimistic-lock version queries and pluggable search. Every
//! call answers with a [`RepositoryHolder`] carrying an HTTP-style status.
//!
//! # Quick Start
//!
//! ```ignore
//! use memrepo::{MemoryRepository, PropertyScanSearch, Repository};
//!
//! let repo = MemoryRepository::builder(|u: &User| u.id.clone())
//!     .references(|u: &User| [("email", u.email.clone())])
//!     .search_as_default(PropertyScanSearch::new())
//!     .build()?;
//!
//! let rs = repo.create(&user, None)?;
//! assert_eq!(rs.status(), 201);
//! println!("{}", repo.etag()); // "User:<instance>:1"
//! ```
//!
//! # Architecture
//!
//! - `memrepo-core`: keys, references, result envelope, policies, contract
//! - `memrepo-storage`: containers, index, serializers and codecs
//! - `memrepo-search`: search algorithm trait, registry, property scan
//! - `memrepo-engine`: gate, config, builder and the repository itself

pub use memrepo_core::*;
pub use memrepo_engine::*;
pub use memrepo_search::{
    AlgorithmRef, FnSearchAlgorithm, PropertyScanSearch, SearchAlgorithm, SearchError, SearchHit,
    SearchHits, SearchRegistry, SCAN_SEARCH_ID,
};
pub use memrepo_storage::{
    get_codec, CodecError, ContainerParts, ContainerRef, EntityContainer, EntityIndex,
    EntitySerializer, IdentityCodec, IndexSnapshot, JsonSerializer, MessagePackSerializer,
    SerializationContext, StorageCodec, ZstdCodec, DEFAULT_ZSTD_LEVEL,
};
