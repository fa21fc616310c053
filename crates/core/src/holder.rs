//! Uniform result envelope
//!
//! Every repository operation answers with a [`RepositoryHolder`]. The
//! [`ResponseCode`] is the primary signaling channel: conflicts, missing
//! keys, integrity failures and read-only rejections are all reported here
//! rather than as `Err`.

use crate::reference::Reference;
use crate::settings::RepositorySettings;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Payload of delete and version responses: the key and a version token
///
/// Delete responses carry an empty token.
pub type KeyVersion<K> = (K, String);

/// Error captured into an envelope for diagnostics
pub type CapturedError = Arc<dyn std::error::Error + Send + Sync>;

/// Closed set of status codes carried in every envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum ResponseCode {
    /// Read, update, delete, version or search succeeded
    Ok = 200,
    /// Entity created
    Created = 201,
    /// Rejected: the repository is read-only
    BadRequest = 400,
    /// Integrity signature validation failed on read
    Forbidden = 403,
    /// Key, reference or search algorithm not found
    NotFound = 404,
    /// Duplicate key, duplicate reference or stale version
    Conflict = 409,
    /// Search algorithm failed unexpectedly
    InternalError = 500,
}

impl ResponseCode {
    /// Numeric HTTP-style code
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// True for 2xx codes
    #[inline]
    pub const fn is_success(self) -> bool {
        matches!(self, ResponseCode::Ok | ResponseCode::Created)
    }

    /// Map a numeric code back into the closed set
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            200 => Some(ResponseCode::Ok),
            201 => Some(ResponseCode::Created),
            400 => Some(ResponseCode::BadRequest),
            403 => Some(ResponseCode::Forbidden),
            404 => Some(ResponseCode::NotFound),
            409 => Some(ResponseCode::Conflict),
            500 => Some(ResponseCode::InternalError),
            _ => None,
        }
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

impl From<ResponseCode> for u16 {
    fn from(code: ResponseCode) -> Self {
        code.as_u16()
    }
}

/// Result envelope returned by every repository operation
///
/// `K` is the key type of the request (the entity key, or the search request
/// for searches) and `P` the payload (an entity, a [`KeyVersion`], or a search
/// response).
#[derive(Debug, Clone)]
pub struct RepositoryHolder<K, P> {
    /// Outcome of the call
    pub response_code: ResponseCode,
    /// Key the call resolved to, when known
    pub key: Option<K>,
    /// Entity or other payload
    pub entity: Option<P>,
    /// Designated reference of the affected entity
    pub key_reference: Option<Reference>,
    /// Human-readable detail for failures
    pub response_message: Option<String>,
    /// Error captured for diagnostics
    pub error: Option<CapturedError>,
    /// Settings bag passed in by the caller, returned unmodified
    pub settings: Option<RepositorySettings>,
}

impl<K, P> RepositoryHolder<K, P> {
    /// Create an empty envelope with the given code
    pub fn new(response_code: ResponseCode) -> Self {
        RepositoryHolder {
            response_code,
            key: None,
            entity: None,
            key_reference: None,
            response_message: None,
            error: None,
            settings: None,
        }
    }

    /// Replace the response code
    pub fn with_response_code(mut self, response_code: ResponseCode) -> Self {
        self.response_code = response_code;
        self
    }

    /// Set the key
    pub fn with_key(mut self, key: Option<K>) -> Self {
        self.key = key;
        self
    }

    /// Set the payload
    pub fn with_entity(mut self, entity: Option<P>) -> Self {
        self.entity = entity;
        self
    }

    /// Set the designated reference
    pub fn with_reference(mut self, reference: Option<Reference>) -> Self {
        self.key_reference = reference;
        self
    }

    /// Set the response message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.response_message = Some(message.into());
        self
    }

    /// Attach a captured error
    pub fn with_error(mut self, error: CapturedError) -> Self {
        self.error = Some(error);
        self
    }

    /// Echo the caller's settings
    pub fn with_settings(mut self, settings: Option<&RepositorySettings>) -> Self {
        self.settings = settings.cloned();
        self
    }

    /// Numeric status code
    #[inline]
    pub fn status(&self) -> u16 {
        self.response_code.as_u16()
    }

    /// True for 2xx outcomes
    #[inline]
    pub fn is_success(&self) -> bool {
        self.response_code.is_success()
    }
}
