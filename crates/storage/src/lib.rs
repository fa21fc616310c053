//! Storage layer for memrepo
//!
//! This crate implements the in-memory storage primitives:
//! - EntityContainer: immutable stored entity with cached blob
//! - EntityIndex: primary map + reference map + revision ordinal
//! - IndexSnapshot: detached view used by search
//! - ReadHitTable: per-key read counters kept beside the index
//! - SerializationContext: entity serializer + compression codec
//! - codec: StorageCodec seam (identity, zstd)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod container;
pub mod index;
pub mod read_hits;
pub mod serializer;
pub mod snapshot;

pub use codec::{
    get_codec, CodecError, IdentityCodec, StorageCodec, ZstdCodec, DEFAULT_ZSTD_LEVEL,
};
pub use container::{ContainerParts, EntityContainer};
pub use index::{ContainerRef, EntityIndex};
pub use read_hits::ReadHitTable;
pub use serializer::{EntitySerializer, JsonSerializer, MessagePackSerializer, SerializationContext};
pub use snapshot::IndexSnapshot;
