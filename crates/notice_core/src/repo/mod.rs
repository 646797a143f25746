//! Notice repository.
//!
//! # Responsibility
//! - Hold every notice of one option record in memory.
//! - Flush the record back to option storage only when its content changed.
//!
//! # Invariants
//! - Creating over an existing id and reading an absent id are errors.
//! - Deleting is notice-level idempotent; it never errors on absent ids.

pub mod notice_repo;
