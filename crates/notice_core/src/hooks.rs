//! Prioritized callback registries.
//!
//! # Responsibility
//! - Keep extension callbacks in priority order for filter chains and actions.
//!
//! # Invariants
//! - Lower priority runs first.
//! - Callbacks with equal priority run in registration order.

use std::fmt::{Debug, Formatter};

/// Priority used when callers have no ordering preference.
pub const DEFAULT_PRIORITY: i32 = 10;

struct HookEntry<F: ?Sized> {
    priority: i32,
    callback: Box<F>,
}

/// Ordered list of callbacks of one signature.
pub struct HookList<F: ?Sized> {
    entries: Vec<HookEntry<F>>,
}

impl<F: ?Sized> Default for HookList<F> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<F: ?Sized> Debug for HookList<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookList")
            .field(
                "priorities",
                &self.entries.iter().map(|entry| entry.priority).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<F: ?Sized> HookList<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` after every entry with a priority `<= priority`.
    pub fn add(&mut self, priority: i32, callback: Box<F>) {
        let position = self
            .entries
            .partition_point(|entry| entry.priority <= priority);
        self.entries
            .insert(position, HookEntry { priority, callback });
    }

    /// Callbacks in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &F> + '_ {
        self.entries.iter().map(|entry| entry.callback.as_ref())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::HookList;

    type Step = dyn Fn(String) -> String;

    #[test]
    fn runs_by_priority_then_registration_order() {
        let mut hooks: HookList<Step> = HookList::new();
        hooks.add(10, Box::new(|s: String| s + "b"));
        hooks.add(5, Box::new(|s: String| s + "a"));
        hooks.add(10, Box::new(|s: String| s + "c"));
        hooks.add(20, Box::new(|s: String| s + "d"));

        let out = hooks.iter().fold(String::new(), |acc, step| step(acc));
        assert_eq!(out, "abcd");
        assert_eq!(hooks.len(), 4);
    }

    #[test]
    fn clear_removes_every_callback() {
        let mut hooks: HookList<Step> = HookList::new();
        hooks.add(1, Box::new(|s: String| s));
        hooks.clear();
        assert!(hooks.is_empty());
    }
}
