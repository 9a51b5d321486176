//! Domain model for the sample aggregate.
//!
//! # Responsibility
//! - Define the aggregate root (`Sample`) and its child (`Translation`).
//! - Define the inbound request shape and pagination envelopes.
//!
//! # Invariants
//! - A `Sample` is the unit of consistency and version control.
//! - Translations have no identity outside their parent.
//! - Deletion is a soft-delete tombstone; tombstoned rows are never read back.

pub mod page;
pub mod sample;
