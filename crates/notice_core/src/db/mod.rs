//! Option table database.
//!
//! Notices live in one row of the `options` table; this module owns opening
//! that database and bringing the table schema up to date.
//!
//! # Invariants
//! - The table schema version is mirrored to `PRAGMA user_version`.
//! - A database written by a newer build is refused, never downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

/// Table holding named option records.
pub const OPTIONS_TABLE: &str = "options";

pub type DbResult<T> = Result<T, DbError>;

/// Failure opening or migrating the option database.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The option table was migrated by a newer build.
    NewerOptionSchema {
        table: &'static str,
        found: u32,
        supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "option database error: {err}"),
            Self::NewerOptionSchema {
                table,
                found,
                supported,
            } => write!(
                f,
                "`{table}` table is at schema {found}, this build only knows up to {supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::NewerOptionSchema { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
