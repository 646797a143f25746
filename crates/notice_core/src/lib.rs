//! Core domain logic for admin notices.
//! Notices are stored as one option record, shown once per request and
//! dismissed either globally or per user.

pub mod config;
pub mod db;
pub mod hooks;
pub mod host;
pub mod logging;
pub mod markup;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{ConfigError, NoticeConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use hooks::{HookList, DEFAULT_PRIORITY};
pub use host::{AdminHost, StandaloneHost};
pub use logging::{default_log_level, init_logging, logging_status};
pub use markup::{admin_notice_html, dismiss_script, NoticeMarkupArgs};
pub use model::fields::{NoticeChanges, NoticeData, NoticeField, NoticeType, RawNotice, UserId};
pub use model::notice::{DataContext, Notice};
pub use repo::notice_repo::{NoticeRepository, RepoError, RepoResult};
pub use service::format::{lighten_color, FormatHooks, NoticeView};
pub use service::notice_api::{
    clear_notices, create_notice, delete_notice, get_notice, get_notices, ListInput, NewNotice,
};
pub use service::notice_manager::{DismissRequest, ManagerError, NoticeManager, RenderedNotice};
pub use store::{MemoryOptionStore, OptionStore, SqliteOptionStore, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
