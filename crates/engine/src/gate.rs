//! Concurrency gate
//!
//! One reader-writer region per repository guards the whole index. Writes
//! (create, update, delete) take exclusive access; everything else shares.
//! There is no per-key locking: writes serialize across all keys.
//!
//! Access is only ever granted for the duration of a closure, so a guard
//! can never leak out of an operation or be held across an `.await`.

use parking_lot::RwLock;

/// Reader-writer region around a value
#[derive(Debug, Default)]
pub struct Atomic<T> {
    inner: RwLock<T>,
}

impl<T> Atomic<T> {
    /// Wrap a value
    pub fn new(value: T) -> Self {
        Atomic {
            inner: RwLock::new(value),
        }
    }

    /// Run `f` with shared access
    #[inline]
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.inner.read();
        f(&guard)
    }

    /// Run `f` with exclusive access
    #[inline]
    pub fn write<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.inner.write();
        f(&mut guard)
    }

    /// Unwrap the value
    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}
