//! Notice repository over a single option record.
//!
//! # Responsibility
//! - Load the whole id → raw field map once, at construction.
//! - Apply create/read/update/delete against the in-memory map.
//! - Persist the map wholesale, short-circuiting on an unchanged content hash.
//!
//! # Invariants
//! - `persist` writes only when forced or while the end-of-request flush runs.
//! - `persist` never writes when the content hash equals the last stored hash.
//! - Mutations operate on `apply_changes()` + `data(Save)` snapshots.

use crate::config::NoticeConfig;
use crate::model::fields::RawNotice;
use crate::model::notice::{DataContext, Notice};
use crate::store::{OptionStore, StoreError};
use log::{debug, info, warn};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for notice lookups and persistence.
#[derive(Debug)]
pub enum RepoError {
    /// A notice with this id is already stored.
    DuplicateId(String),
    /// No notice with this id is stored.
    UnknownId(String),
    Storage(StoreError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateId(id) => write!(f, "notice id already exists: `{id}`"),
            Self::UnknownId(id) => write!(f, "invalid notice id: `{id}`"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::DuplicateId(_) | Self::UnknownId(_) => None,
        }
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Storage(value)
    }
}

/// Request-scoped notice repository.
pub struct NoticeRepository<S: OptionStore> {
    store: S,
    option_name: String,
    notices: BTreeMap<String, RawNotice>,
    hash: String,
    flushing: bool,
}

impl<S: OptionStore> NoticeRepository<S> {
    /// Loads the notice record named `option_name` from `store`.
    ///
    /// Entries that are not JSON objects are skipped.
    pub fn load(store: S, option_name: impl Into<String>) -> RepoResult<Self> {
        let option_name = option_name.into();
        let mut notices = BTreeMap::new();

        match store.load_option(&option_name)? {
            Some(Value::Object(entries)) => {
                for (id, entry) in entries {
                    match entry {
                        Value::Object(raw) => {
                            notices.insert(id, raw);
                        }
                        _ => warn!(
                            "event=repo_load module=repo status=skip reason=not_an_object id={id}"
                        ),
                    }
                }
            }
            Some(_) => warn!(
                "event=repo_load module=repo status=skip reason=not_a_map option={option_name}"
            ),
            None => {}
        }

        let hash = content_hash(&notices);
        info!(
            "event=repo_load module=repo status=ok option={option_name} count={}",
            notices.len()
        );

        Ok(Self {
            store,
            option_name,
            notices,
            hash,
            flushing: false,
        })
    }

    /// Loads the notice record named by `config`.
    pub fn with_config(store: S, config: &NoticeConfig) -> RepoResult<Self> {
        Self::load(store, config.option_name.as_str())
    }

    pub fn option_name(&self) -> &str {
        &self.option_name
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn has(&self, id: &str) -> bool {
        self.notices.contains_key(id)
    }

    /// Stored notice ids in key order.
    pub fn ids(&self) -> Vec<String> {
        self.notices.keys().cloned().collect()
    }

    /// Loads one notice, or `None` when absent.
    pub fn get(&self, id: &str) -> Option<Notice> {
        if !self.has(id) {
            return None;
        }
        Notice::load(id, self).ok()
    }

    /// Loads every stored notice in key order.
    pub fn all(&self) -> Vec<Notice> {
        self.notices
            .keys()
            .filter_map(|id| Notice::load(id, self).ok())
            .collect()
    }

    /// Stores a new notice.
    ///
    /// # Errors
    /// - `RepoError::DuplicateId` when the id is already stored.
    pub fn create(&mut self, notice: &mut Notice) -> RepoResult<()> {
        if self.has(notice.id()) {
            return Err(RepoError::DuplicateId(notice.id().to_string()));
        }

        self.append(notice);
        debug!("event=notice_create module=repo status=ok id={}", notice.id());
        Ok(())
    }

    /// Fills `notice` from its stored record and marks it read.
    ///
    /// The record key stays the notice id, whatever `id` the record holds.
    ///
    /// # Errors
    /// - `RepoError::UnknownId` when the id is empty or not stored.
    pub fn read(&self, notice: &mut Notice) -> RepoResult<()> {
        let raw = self
            .notices
            .get(notice.id())
            .filter(|_| !notice.id().is_empty())
            .ok_or_else(|| RepoError::UnknownId(notice.id().to_string()))?;

        let id = notice.id().to_string();
        notice.set_props(raw).set_id(id).set_object_read(true);
        Ok(())
    }

    /// Stores the notice under its id, replacing any previous record.
    pub fn update(&mut self, notice: &mut Notice) -> RepoResult<()> {
        self.append(notice);
        debug!("event=notice_update module=repo status=ok id={}", notice.id());
        Ok(())
    }

    /// Removes the notice record and persists when `now` is set.
    ///
    /// Returns `false` when no record was stored under the notice id.
    pub fn delete(&mut self, notice: &Notice, now: bool) -> RepoResult<bool> {
        let removed = self.notices.remove(notice.id()).is_some();
        debug!(
            "event=notice_delete module=repo status=ok id={} removed={removed}",
            notice.id()
        );

        self.persist(now)?;
        Ok(removed)
    }

    /// Drops every notice and forces the next persist to write.
    pub fn clear(&mut self, force: bool) -> RepoResult<()> {
        self.notices.clear();
        self.hash = format!("cleared-{}", Uuid::new_v4());
        info!("event=repo_clear module=repo status=ok force={force}");

        self.persist(force)?;
        Ok(())
    }

    /// Writes the record when forced or during the end-of-request flush.
    ///
    /// Returns whether storage was written.
    pub fn persist(&mut self, force: bool) -> RepoResult<bool> {
        if !force && !self.flushing {
            return Ok(false);
        }

        let hash = content_hash(&self.notices);
        if hash == self.hash {
            debug!(
                "event=repo_persist module=repo status=skip reason=unchanged option={}",
                self.option_name
            );
            return Ok(false);
        }

        self.store
            .save_option(&self.option_name, &snapshot(&self.notices), false)?;
        self.hash = hash;
        info!(
            "event=repo_persist module=repo status=ok option={} count={}",
            self.option_name,
            self.notices.len()
        );
        Ok(true)
    }

    /// End-of-request flush.
    pub fn shutdown(&mut self) -> RepoResult<bool> {
        self.flushing = true;
        let written = self.persist(false);
        self.flushing = false;
        written
    }

    /// Whether the in-memory record differs from what was last loaded or stored.
    pub fn is_dirty(&self) -> bool {
        content_hash(&self.notices) != self.hash
    }

    fn append(&mut self, notice: &mut Notice) {
        let raw = notice.apply_changes().data(DataContext::Save);
        self.notices.insert(notice.id().to_string(), raw);
    }
}

fn snapshot(notices: &BTreeMap<String, RawNotice>) -> Value {
    Value::Object(
        notices
            .iter()
            .map(|(id, raw)| (id.clone(), Value::Object(raw.clone())))
            .collect::<Map<String, Value>>(),
    )
}

/// SHA-256 over the canonical JSON text of the record.
fn content_hash(notices: &BTreeMap<String, RawNotice>) -> String {
    let encoded = snapshot(notices).to_string();
    hex::encode(Sha256::digest(encoded.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::{NoticeRepository, RepoError};
    use crate::model::notice::Notice;
    use crate::store::{MemoryOptionStore, OptionStore};
    use serde_json::json;

    const OPTION: &str = "test_notices";

    fn empty_repo() -> NoticeRepository<MemoryOptionStore> {
        NoticeRepository::load(MemoryOptionStore::new(), OPTION).expect("load repo")
    }

    fn new_notice(id: &str) -> Notice {
        let mut notice = Notice::new();
        notice.set_id(id).set_message("body");
        notice
    }

    #[test]
    fn loads_seeded_record_and_skips_malformed_entries() {
        let store = MemoryOptionStore::new().with_option(
            OPTION,
            json!({
                "ok": {"id": "ok", "message": "stored", "persistent": true},
                "broken": "not an object"
            }),
        );
        let repo = NoticeRepository::load(store, OPTION).expect("load repo");

        assert_eq!(repo.len(), 1);
        let notice = repo.get("ok").expect("stored notice");
        assert_eq!(notice.message(), "stored");
        assert!(notice.persistent());
        assert!(notice.is_read());
        assert!(!notice.has_changes());
        assert!(!repo.is_dirty());
    }

    #[test]
    fn create_rejects_duplicate_id() {
        let mut repo = empty_repo();
        repo.create(&mut new_notice("dup")).expect("first create");

        let err = repo
            .create(&mut new_notice("dup"))
            .expect_err("duplicate must fail");
        assert!(matches!(err, RepoError::DuplicateId(id) if id == "dup"));
    }

    #[test]
    fn read_rejects_unknown_and_empty_ids() {
        let repo = empty_repo();
        let err = Notice::load("missing", &repo).expect_err("unknown id must fail");
        assert!(matches!(err, RepoError::UnknownId(id) if id == "missing"));

        let err = Notice::load("", &repo).expect_err("empty id must fail");
        assert!(matches!(err, RepoError::UnknownId(_)));
    }

    #[test]
    fn persist_writes_only_when_allowed_and_changed() {
        let mut repo = empty_repo();
        repo.create(&mut new_notice("a")).expect("create");

        assert!(!repo.persist(false).expect("unforced persist"));
        assert_eq!(repo.store().writes(), 0);

        assert!(repo.persist(true).expect("forced persist"));
        assert_eq!(repo.store().writes(), 1);

        assert!(!repo.persist(true).expect("unchanged persist"));
        assert_eq!(repo.store().writes(), 1);

        let mut notice = repo.get("a").expect("stored");
        notice.set_message("body");
        repo.update(&mut notice).expect("no-op update");
        assert!(!repo.persist(true).expect("same content"));
        assert_eq!(repo.store().writes(), 1);
    }

    #[test]
    fn shutdown_flushes_pending_content() {
        let mut repo = empty_repo();
        repo.create(&mut new_notice("late")).expect("create");
        assert!(repo.is_dirty());

        assert!(repo.shutdown().expect("shutdown flush"));
        assert!(!repo.is_dirty());
        assert!(!repo.shutdown().expect("second flush"));
        assert_eq!(repo.store().writes(), 1);
    }

    #[test]
    fn clear_forces_a_write_even_when_already_empty() {
        let mut repo = empty_repo();
        repo.clear(true).expect("clear");

        assert_eq!(repo.store().writes(), 1);
        assert!(repo.is_empty());
    }

    #[test]
    fn stores_only_non_default_fields() {
        let mut repo = empty_repo();
        let mut notice = new_notice("slim");
        notice.set_persistent(true);
        repo.create(&mut notice).expect("create");
        repo.persist(true).expect("persist");

        let stored = repo
            .store()
            .load_option(OPTION)
            .expect("load option")
            .expect("stored record");
        assert_eq!(
            stored,
            json!({"slim": {"id": "slim", "message": "body", "persistent": true}})
        );
    }

    #[test]
    fn delete_reports_whether_a_record_was_removed() {
        let mut repo = empty_repo();
        assert!(!repo.delete(&new_notice("ghost"), true).expect("absent delete"));
        assert_eq!(repo.store().writes(), 0);

        repo.create(&mut new_notice("z")).expect("create");
        let mut first = Notice::load("z", &repo).expect("first copy");
        let mut stale = Notice::load("z", &repo).expect("second copy");

        assert!(first.delete(&mut repo, true).expect("first delete"));
        assert!(!stale.delete(&mut repo, true).expect("stale delete"));
        assert!(repo.is_empty());
    }

    #[test]
    fn record_key_wins_over_stored_id() {
        let store = MemoryOptionStore::new().with_option(
            OPTION,
            json!({"a": {"id": "b", "message": "mismatched"}}),
        );
        let mut repo = NoticeRepository::load(store, OPTION).expect("load repo");

        let mut notices = repo.all();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].id(), "a");
        assert_eq!(notices[0].message(), "mismatched");

        assert!(notices[0].delete(&mut repo, false).expect("delete"));
        assert!(!repo.has("a"));
    }
}
