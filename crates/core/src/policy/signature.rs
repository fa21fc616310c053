//! Integrity signatures
//!
//! A signature is a deterministic string derived from an entity's fields
//! (and optionally its version token). It is computed when a container is
//! built and re-validated on every read; a mismatch means the stored data no
//! longer matches what was signed.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

/// Computes and validates entity signatures
pub trait SignaturePolicy<E>: Send + Sync {
    /// Signature over the entity and, if the policy uses it, the version token
    fn calculate(&self, entity: &E, version_id: Option<&str>) -> String;

    /// Validate a stored signature
    fn verify(&self, entity: &E, version_id: Option<&str>, signature: &str) -> bool {
        self.calculate(entity, version_id) == signature
    }
}

type FieldFormatter<E> = Arc<dyn Fn(&E) -> String + Send + Sync>;

/// Signature built from a formatted field string
///
/// ```ignore
/// let policy = FieldSignaturePolicy::new(|e: &Account| {
///     format!("{}:{}:{}", e.id, e.user_id, e.second)
/// });
/// ```
pub struct FieldSignaturePolicy<E> {
    format: FieldFormatter<E>,
    include_version: bool,
}

impl<E> FieldSignaturePolicy<E> {
    /// Policy over the formatted fields only
    pub fn new<F>(format: F) -> Self
    where
        F: Fn(&E) -> String + Send + Sync + 'static,
    {
        FieldSignaturePolicy {
            format: Arc::new(format),
            include_version: false,
        }
    }

    /// Append the version token to the signed string
    pub fn including_version(mut self) -> Self {
        self.include_version = true;
        self
    }

    /// Wrap in a SHA-256 digest
    pub fn hashed(self) -> HashedSignaturePolicy<Self> {
        HashedSignaturePolicy::new(self)
    }
}

impl<E> SignaturePolicy<E> for FieldSignaturePolicy<E> {
    fn calculate(&self, entity: &E, version_id: Option<&str>) -> String {
        let fields = (self.format)(entity);
        if self.include_version {
            format!("{}:{}", fields, version_id.unwrap_or_default())
        } else {
            fields
        }
    }
}

impl<E> fmt::Debug for FieldSignaturePolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSignaturePolicy")
            .field("include_version", &self.include_version)
            .finish()
    }
}

/// SHA-256 digest (base64) over another policy's signature
#[derive(Debug, Clone)]
pub struct HashedSignaturePolicy<P> {
    inner: P,
}

impl<P> HashedSignaturePolicy<P> {
    /// Wrap an inner policy
    pub fn new(inner: P) -> Self {
        HashedSignaturePolicy { inner }
    }
}

impl<E, P: SignaturePolicy<E>> SignaturePolicy<E> for HashedSignaturePolicy<P> {
    fn calculate(&self, entity: &E, version_id: Option<&str>) -> String {
        let raw = self.inner.calculate(entity, version_id);
        STANDARD.encode(Sha256::digest(raw.as_bytes()))
    }
}
