//! SQLite-backed option store.
//!
//! # Invariants
//! - Values are stored as JSON text in `options.option_value`.
//! - The connection must have migrations applied (see `db::open_db`).

use super::{OptionStore, StoreResult};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

/// Option store over the `options` table of a borrowed connection.
pub struct SqliteOptionStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOptionStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl OptionStore for SqliteOptionStore<'_> {
    fn load_option(&self, name: &str) -> StoreResult<Option<Value>> {
        let text: Option<String> = self
            .conn
            .query_row(
                "SELECT option_value FROM options WHERE option_name = ?1;",
                [name],
                |row| row.get(0),
            )
            .optional()?;

        match text {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn save_option(&mut self, name: &str, value: &Value, autoload: bool) -> StoreResult<()> {
        let text = serde_json::to_string(value)?;
        self.conn.execute(
            "INSERT INTO options (option_name, option_value, autoload)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(option_name) DO UPDATE SET
                option_value = excluded.option_value,
                autoload = excluded.autoload,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![name, text, i64::from(autoload)],
        )?;
        debug!(
            "event=option_save module=store status=ok name={name} bytes={}",
            text.len()
        );
        Ok(())
    }

    fn delete_option(&mut self, name: &str) -> StoreResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM options WHERE option_name = ?1;", [name])?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteOptionStore;
    use crate::db::open_db_in_memory;
    use crate::store::{OptionStore, StoreError};
    use serde_json::json;

    #[test]
    fn save_replaces_existing_value() {
        let conn = open_db_in_memory().expect("open db");
        let mut store = SqliteOptionStore::new(&conn);

        assert_eq!(store.load_option("blob").expect("load empty"), None);
        store
            .save_option("blob", &json!({"v": 1}), true)
            .expect("first save");
        store
            .save_option("blob", &json!({"v": 2}), false)
            .expect("second save");

        assert_eq!(
            store.load_option("blob").expect("load"),
            Some(json!({"v": 2}))
        );
        let autoload: i64 = conn
            .query_row(
                "SELECT autoload FROM options WHERE option_name = 'blob';",
                [],
                |row| row.get(0),
            )
            .expect("autoload column");
        assert_eq!(autoload, 0);
    }

    #[test]
    fn corrupt_payload_is_reported() {
        let conn = open_db_in_memory().expect("open db");
        conn.execute(
            "INSERT INTO options (option_name, option_value) VALUES ('bad', '{not json');",
            [],
        )
        .expect("seed corrupt row");

        let store = SqliteOptionStore::new(&conn);
        let err = store.load_option("bad").expect_err("corrupt json must fail");
        assert!(matches!(err, StoreError::Json(_)));
    }

    #[test]
    fn delete_reports_presence() {
        let conn = open_db_in_memory().expect("open db");
        let mut store = SqliteOptionStore::new(&conn);
        store.save_option("gone", &json!(1), true).expect("save");

        assert!(store.delete_option("gone").expect("delete"));
        assert!(!store.delete_option("gone").expect("delete again"));
    }
}
