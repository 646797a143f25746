//! In-process option store.

use super::{OptionStore, StoreResult};
use serde_json::Value;
use std::collections::BTreeMap;

/// Option store kept in memory, counting every write it receives.
#[derive(Debug, Clone, Default)]
pub struct MemoryOptionStore {
    options: BTreeMap<String, (Value, bool)>,
    writes: usize,
}

impl MemoryOptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an option without counting it as a write.
    pub fn with_option(mut self, name: impl Into<String>, value: Value) -> Self {
        self.options.insert(name.into(), (value, true));
        self
    }

    /// Number of `save_option`/`delete_option` calls that reached the store.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn autoload(&self, name: &str) -> Option<bool> {
        self.options.get(name).map(|(_, autoload)| *autoload)
    }
}

impl OptionStore for MemoryOptionStore {
    fn load_option(&self, name: &str) -> StoreResult<Option<Value>> {
        Ok(self.options.get(name).map(|(value, _)| value.clone()))
    }

    fn save_option(&mut self, name: &str, value: &Value, autoload: bool) -> StoreResult<()> {
        self.writes += 1;
        self.options
            .insert(name.to_string(), (value.clone(), autoload));
        Ok(())
    }

    fn delete_option(&mut self, name: &str) -> StoreResult<bool> {
        self.writes += 1;
        Ok(self.options.remove(name).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryOptionStore;
    use crate::store::OptionStore;
    use serde_json::json;

    #[test]
    fn counts_writes_but_not_seeds() {
        let mut store = MemoryOptionStore::new().with_option("seeded", json!({"a": 1}));
        assert_eq!(store.writes(), 0);

        store
            .save_option("fresh", &json!([1, 2]), false)
            .expect("save");
        assert_eq!(store.writes(), 1);
        assert_eq!(store.autoload("fresh"), Some(false));
        assert_eq!(
            store.load_option("fresh").expect("load"),
            Some(json!([1, 2]))
        );

        assert!(store.delete_option("seeded").expect("delete"));
        assert!(!store.delete_option("seeded").expect("delete again"));
        assert_eq!(store.writes(), 3);
    }
}
