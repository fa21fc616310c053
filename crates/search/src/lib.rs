//! Search infrastructure for memrepo
//!
//! This crate provides:
//! - SearchAlgorithm trait for pluggable, named search strategies
//! - SearchHit wrapper exposing a matched container's entity and properties
//! - SearchRegistry mapping case-insensitive ids to algorithms, with a default
//! - PropertyScanSearch: filter / order / page over searchable properties
//! - FnSearchAlgorithm for closure-based algorithms
//!
//! Algorithms run over an [`IndexSnapshot`](memrepo_storage::IndexSnapshot)
//! captured by the repository; no lock is held while they execute.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithm;
pub mod registry;
pub mod scan;

pub use algorithm::{FnSearchAlgorithm, SearchAlgorithm, SearchError, SearchHit, SearchHits};
pub use registry::{AlgorithmRef, SearchRegistry};
pub use scan::{PropertyScanSearch, SCAN_SEARCH_ID};
