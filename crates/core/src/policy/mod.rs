//! Strategy objects injected into a repository at construction
//!
//! - [`VersionPolicy`]: extracts and advances an entity's version token,
//!   enabling optimistic locking on update
//! - [`SignaturePolicy`]: computes and validates an integrity signature,
//!   detecting tampering on read
//!
//! Policies are stateless with respect to stored data; the engine depends
//! only on these traits.

pub mod signature;
pub mod version;

pub use signature::{FieldSignaturePolicy, HashedSignaturePolicy, SignaturePolicy};
pub use version::{FnVersionPolicy, VersionPolicy};
