//! Repository configuration via `memrepo.toml`
//!
//! Everything that can be expressed as data (read-only flag, collection
//! name, default search id, storage codec) lives here. Behavior (key maker,
//! policies, search algorithms) is injected through
//! [`RepositoryBuilder`](crate::RepositoryBuilder).

use std::path::Path;
use std::sync::Arc;

use memrepo_core::{RepositoryError, Result};
use memrepo_storage::{get_codec, StorageCodec, DEFAULT_ZSTD_LEVEL};
use serde::{Deserialize, Serialize};

/// Conventional config file name
pub const CONFIG_FILE_NAME: &str = "memrepo.toml";

/// Repository configuration
///
/// # Example
///
/// ```toml
/// read_only = false
/// collection_name = "users"
/// default_search = "scan"
/// codec = "zstd"
/// compression_level = 3
/// eager_deserialize = false
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Reject create/update/delete with 400 once built
    #[serde(default)]
    pub read_only: bool,
    /// Name used as the ETag prefix (defaults to the entity type name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,
    /// Search id used when a request names none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_search: Option<String>,
    /// Storage codec: `"zstd"` or `"identity"`
    #[serde(default = "default_codec")]
    pub codec: String,
    /// zstd compression level
    #[serde(default = "default_compression_level")]
    pub compression_level: i32,
    /// Decode each blob when the container is built instead of on first read
    #[serde(default)]
    pub eager_deserialize: bool,
}

fn default_codec() -> String {
    "zstd".to_string()
}

fn default_compression_level() -> i32 {
    DEFAULT_ZSTD_LEVEL
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        RepositoryConfig {
            read_only: false,
            collection_name: None,
            default_search: None,
            codec: default_codec(),
            compression_level: default_compression_level(),
            eager_deserialize: false,
        }
    }
}

impl RepositoryConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# memrepo repository configuration
#
# Reject create/update/delete once the repository is built (default: false).
# Prepopulated entities are still loaded.
read_only = false

# ETag prefix; defaults to the entity type name.
# collection_name = "users"

# Search algorithm used when a request does not name one.
# default_search = "scan"

# Storage codec for serialized entities: "zstd" (default) or "identity"
codec = "zstd"

# zstd level, 1-22 (default: 3)
compression_level = 3

# Decode entities when stored instead of on first read (default: false)
eager_deserialize = false
"#
    }

    /// Parse and validate config from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RepositoryConfig = toml::from_str(content).map_err(|e| {
            RepositoryError::configuration(format!("Failed to parse config: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            RepositoryError::Configuration(msg) => RepositoryError::Configuration(format!(
                "{} ('{}')",
                msg,
                path.display()
            )),
            other => other,
        })
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            RepositoryError::configuration(format!("Failed to serialize config: {}", e))
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Check the values that can be checked without the builder.
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.collection_name {
            if name.trim().is_empty() {
                return Err(RepositoryError::configuration(
                    "collection_name must not be empty",
                ));
            }
        }
        if let Some(id) = &self.default_search {
            if id.trim().is_empty() {
                return Err(RepositoryError::configuration(
                    "default_search must not be empty",
                ));
            }
        }
        if self.codec == "zstd" && !(1..=22).contains(&self.compression_level) {
            return Err(RepositoryError::configuration(format!(
                "compression_level {} out of range 1-22",
                self.compression_level
            )));
        }
        self.storage_codec().map(|_| ())
    }

    /// Resolve the configured storage codec.
    pub fn storage_codec(&self) -> Result<Arc<dyn StorageCodec>> {
        Ok(get_codec(&self.codec, self.compression_level)?)
    }
}
