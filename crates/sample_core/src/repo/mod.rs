//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define one data-access call per storage statement.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Every failure leaving this layer is already a `SampleError`.
//! - Soft-deleted rows are invisible to every read.

pub mod sample_repo;
