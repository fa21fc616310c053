//! Zstandard compression codec.
//!
//! The default compression pass applied to serialized entities.

use super::traits::{CodecError, StorageCodec};

/// Default zstd level: fast with a reasonable ratio for small JSON blobs.
pub const DEFAULT_ZSTD_LEVEL: i32 = 3;

/// Zstd compression codec
#[derive(Debug, Clone, Copy)]
pub struct ZstdCodec {
    level: i32,
}

impl ZstdCodec {
    /// Codec with an explicit compression level (1..=22; 0 = zstd default)
    pub fn new(level: i32) -> Self {
        ZstdCodec { level }
    }

    /// Configured compression level
    pub fn level(&self) -> i32 {
        self.level
    }
}

impl Default for ZstdCodec {
    fn default() -> Self {
        ZstdCodec::new(DEFAULT_ZSTD_LEVEL)
    }
}

impl StorageCodec for ZstdCodec {
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        zstd::encode_all(data, self.level).map_err(|e| CodecError::EncodeError(e.to_string()))
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        zstd::decode_all(data).map_err(|e| CodecError::DecodeError(e.to_string()))
    }

    fn codec_id(&self) -> &str {
        "zstd"
    }
}
