//! Storage codec trait definitions.

use memrepo_core::RepositoryError;

/// Storage codec trait.
///
/// Every serialized entity blob passes through the codec before it is
/// cached in a container, and back through it when the entity is decoded.
///
/// # Thread Safety
///
/// Codecs must be `Send + Sync` to allow concurrent encoding/decoding
/// from multiple threads.
pub trait StorageCodec: Send + Sync {
    /// Encode serialized bytes for storage.
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError>;

    /// Decode stored bytes.
    ///
    /// Reverses the encode operation. Returns an error if the data
    /// cannot be decoded (e.g. truncated or corrupt frame).
    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError>;

    /// Unique codec identifier, as used in configuration.
    fn codec_id(&self) -> &str;
}

/// Codec errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Encoding failed.
    #[error("Encode error: {0}")]
    EncodeError(String),

    /// Decoding failed (e.g. invalid frame).
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// Unknown codec identifier.
    #[error("Unknown codec: {0}")]
    UnknownCodec(String),
}

impl From<CodecError> for RepositoryError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::UnknownCodec(id) => {
                RepositoryError::Configuration(format!("unknown codec '{}'", id))
            }
            other => RepositoryError::Codec(other.to_string()),
        }
    }
}
