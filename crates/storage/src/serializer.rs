//! Entity serialization
//!
//! A [`SerializationContext`] pairs an [`EntitySerializer`] (entity <-> bytes)
//! with a [`StorageCodec`] (compression pass). The default context is JSON
//! followed by zstd.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use memrepo_core::{RepositoryError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{StorageCodec, ZstdCodec};

/// Converts entities to and from raw bytes
pub trait EntitySerializer<E>: Send + Sync {
    /// Serialize an entity
    fn serialize(&self, entity: &E) -> Result<Vec<u8>>;

    /// Deserialize an entity
    fn deserialize(&self, bytes: &[u8]) -> Result<E>;

    /// Format identifier, e.g. `"json"`
    fn format_id(&self) -> &str;
}

/// JSON serializer backed by `serde_json`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl<E: Serialize + DeserializeOwned> EntitySerializer<E> for JsonSerializer {
    fn serialize(&self, entity: &E) -> Result<Vec<u8>> {
        serde_json::to_vec(entity).map_err(RepositoryError::serialization)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<E> {
        serde_json::from_slice(bytes).map_err(RepositoryError::serialization)
    }

    fn format_id(&self) -> &str {
        "json"
    }
}

/// MessagePack serializer backed by `rmp-serde` (named fields)
#[derive(Debug, Clone, Copy, Default)]
pub struct MessagePackSerializer;

impl<E: Serialize + DeserializeOwned> EntitySerializer<E> for MessagePackSerializer {
    fn serialize(&self, entity: &E) -> Result<Vec<u8>> {
        rmp_serde::to_vec_named(entity).map_err(RepositoryError::serialization)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<E> {
        rmp_serde::from_slice(bytes).map_err(RepositoryError::serialization)
    }

    fn format_id(&self) -> &str {
        "msgpack"
    }
}

/// Serializer plus compression codec used to build container blobs
pub struct SerializationContext<E> {
    serializer: Arc<dyn EntitySerializer<E>>,
    codec: Arc<dyn StorageCodec>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> SerializationContext<E> {
    /// Create a context from a serializer and a codec
    pub fn new(serializer: Arc<dyn EntitySerializer<E>>, codec: Arc<dyn StorageCodec>) -> Self {
        SerializationContext {
            serializer,
            codec,
            _entity: PhantomData,
        }
    }

    /// Serialize then compress
    pub fn encode(&self, entity: &E) -> Result<Vec<u8>> {
        let raw = self.serializer.serialize(entity)?;
        Ok(self.codec.encode(&raw)?)
    }

    /// Decompress then deserialize
    pub fn decode(&self, blob: &[u8]) -> Result<E> {
        let raw = self.codec.decode(blob)?;
        self.serializer.deserialize(&raw)
    }

    /// `"<format>+<codec>"`, e.g. `"json+zstd"`
    pub fn describe(&self) -> String {
        format!("{}+{}", self.serializer.format_id(), self.codec.codec_id())
    }
}

impl<E: Serialize + DeserializeOwned + 'static> SerializationContext<E> {
    /// JSON with the given codec
    pub fn json(codec: Arc<dyn StorageCodec>) -> Self {
        SerializationContext::new(Arc::new(JsonSerializer), codec)
    }
}

impl<E: Serialize + DeserializeOwned + 'static> Default for SerializationContext<E> {
    /// JSON with zstd compression
    fn default() -> Self {
        SerializationContext::json(Arc::new(ZstdCodec::default()))
    }
}

impl<E> fmt::Debug for SerializationContext<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializationContext")
            .field("format", &self.describe())
            .finish()
    }
}
