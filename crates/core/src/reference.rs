//! Secondary references
//!
//! A reference is an ordered `(key, value)` pair such as
//! `("email", "jo@example.com")` that acts as an alternate lookup key.
//! At most one live entity may own a given pair.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Secondary lookup key owned by at most one entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Reference {
    /// Reference type, e.g. `"email"`
    pub key: String,
    /// Reference value, e.g. `"jo@example.com"`
    pub value: String,
}

impl Reference {
    /// Create a new reference pair
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Reference {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Borrow the pair as a tuple
    pub fn as_pair(&self) -> (&str, &str) {
        (&self.key, &self.value)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

impl<K: Into<String>, V: Into<String>> From<(K, V)> for Reference {
    fn from((key, value): (K, V)) -> Self {
        Reference::new(key, value)
    }
}
