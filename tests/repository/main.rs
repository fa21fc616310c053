//! Repository integration tests
//!
//! Exercises `MemoryRepository` through the public `memrepo` facade.

#[path = "../common/mod.rs"]
mod common;

mod concurrency;
mod contract;
mod properties;
mod search;
