//! Notice use-case services.
//!
//! # Responsibility
//! - Expose functional entry points over the repository.
//! - Run display, formatting and dismissal for one request.

pub mod format;
pub mod notice_api;
pub mod notice_manager;
