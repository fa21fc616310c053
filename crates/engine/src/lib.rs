//! Repository engine for memrepo
//!
//! This crate ties the lower layers together:
//! - Atomic: the single reader-writer gate around an index
//! - RepositoryConfig: `memrepo.toml` settings
//! - RepositoryBuilder: injection of makers, policies, serializer and searches
//! - MemoryRepository: the in-memory implementation of the repository contract
//! - AsyncRepository: tokio facade (feature `async`)

#![warn(missing_docs)]
#![warn(clippy::all)]

#[cfg(feature = "async")]
pub mod async_repo;
pub mod builder;
pub mod config;
pub mod gate;
pub mod repository;

#[cfg(feature = "async")]
pub use async_repo::AsyncRepository;
pub use builder::{KeyMaker, PropertiesMaker, ReferenceMaker, RepositoryBuilder};
pub use config::{RepositoryConfig, CONFIG_FILE_NAME};
pub use gate::Atomic;
pub use repository::MemoryRepository;
