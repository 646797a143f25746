//! Admin notice domain model.
//!
//! # Responsibility
//! - Define the notice field schema and its defaults.
//! - Provide the dirty-tracked notice entity.
//!
//! # Invariants
//! - Every notice is identified by a string id unique within one repository.
//! - Pending changes and committed data stay separate until merged.

pub mod fields;
pub mod notice;
