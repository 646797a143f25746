//! Named option storage.
//!
//! # Responsibility
//! - Abstract the host's key/value option table behind one trait.
//! - Load and save whole JSON blobs by option name.
//!
//! # Invariants
//! - Options are read and written wholesale; there is no partial update.
//! - Last writer wins; implementations do no locking.

use crate::db::DbError;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryOptionStore;
pub use sqlite::SqliteOptionStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Option storage failure.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Json(serde_json::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "invalid option payload: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Host option table contract.
pub trait OptionStore {
    /// Returns the stored value, or `None` when the option is absent.
    fn load_option(&self, name: &str) -> StoreResult<Option<Value>>;

    /// Inserts or replaces the option value.
    fn save_option(&mut self, name: &str, value: &Value, autoload: bool) -> StoreResult<()>;

    /// Removes the option. Returns whether it existed.
    fn delete_option(&mut self, name: &str) -> StoreResult<bool>;
}
