//! Storage codec abstraction.
//!
//! The codec seam is the compression pass applied after an entity has been
//! serialized. Known codecs:
//!
//! - `IdentityCodec` (`"identity"`): no transformation
//! - `ZstdCodec` (`"zstd"`): zstd compression, the default
//!
//! # Usage
//!
//! ```ignore
//! use memrepo_storage::codec::{get_codec, StorageCodec};
//!
//! let codec = get_codec("zstd", 3)?;
//! let encoded = codec.encode(b"hello world")?;
//! let decoded = codec.decode(&encoded)?;
//! ```

mod identity;
mod traits;
mod zstd_codec;

pub use zstd_codec::{ZstdCodec, DEFAULT_ZSTD_LEVEL};
pub use identity::IdentityCodec;
pub use traits::{CodecError, StorageCodec};

use std::sync::Arc;

/// Get a codec by its identifier.
///
/// `level` only applies to compressing codecs.
pub fn get_codec(codec_id: &str, level: i32) -> Result<Arc<dyn StorageCodec>, CodecError> {
    match codec_id {
        "identity" => Ok(Arc::new(IdentityCodec)),
        "zstd" => Ok(Arc::new(ZstdCodec::new(level))),
        _ => Err(CodecError::UnknownCodec(codec_id.to_string())),
    }
}
