//! Version policy for optimistic locking
//!
//! An update is accepted only when the incoming entity carries the token
//! currently stored for its key. On acceptance the engine clones the entity,
//! stamps a fresh token on the clone and stores that.

use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Extracts and advances entity version tokens
///
/// # Thread Safety
///
/// Policies are shared by every caller of a repository and must be
/// `Send + Sync`.
pub trait VersionPolicy<E>: Send + Sync {
    /// Whether stale updates are rejected
    ///
    /// When false the token is still recorded but never compared.
    fn supports_optimistic_locking(&self) -> bool {
        true
    }

    /// Current version token carried by the entity
    fn version_of(&self, entity: &E) -> Option<String>;

    /// Stamp a new token onto the entity and return it
    fn apply_new_version(&self, entity: &mut E) -> String;
}

type VersionGetter<E> = Arc<dyn Fn(&E) -> Option<String> + Send + Sync>;
type VersionSetter<E> = Arc<dyn Fn(&mut E, String) + Send + Sync>;
type TokenGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Closure-backed [`VersionPolicy`]
///
/// ```ignore
/// let policy = FnVersionPolicy::new(
///     |e: &Account| e.version_id.clone(),
///     |e: &mut Account, v| e.version_id = Some(v),
/// );
/// ```
pub struct FnVersionPolicy<E> {
    get: VersionGetter<E>,
    set: VersionSetter<E>,
    generate: TokenGenerator,
    optimistic: bool,
}

impl<E> FnVersionPolicy<E> {
    /// Policy with UUID v4 tokens and optimistic locking enabled
    pub fn new<G, S>(get: G, set: S) -> Self
    where
        G: Fn(&E) -> Option<String> + Send + Sync + 'static,
        S: Fn(&mut E, String) + Send + Sync + 'static,
    {
        FnVersionPolicy {
            get: Arc::new(get),
            set: Arc::new(set),
            generate: Arc::new(|| Uuid::new_v4().simple().to_string()),
            optimistic: true,
        }
    }

    /// Replace the token generator
    pub fn with_generator<F>(mut self, generate: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.generate = Arc::new(generate);
        self
    }

    /// Record tokens without rejecting stale updates
    pub fn without_optimistic_locking(mut self) -> Self {
        self.optimistic = false;
        self
    }
}

impl<E> VersionPolicy<E> for FnVersionPolicy<E> {
    fn supports_optimistic_locking(&self) -> bool {
        self.optimistic
    }

    fn version_of(&self, entity: &E) -> Option<String> {
        (self.get)(entity)
    }

    fn apply_new_version(&self, entity: &mut E) -> String {
        let token = (self.generate)();
        (self.set)(entity, token.clone());
        token
    }
}

impl<E> fmt::Debug for FnVersionPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnVersionPolicy")
            .field("optimistic", &self.optimistic)
            .finish()
    }
}
