//! File Scope Tracker - Which views each source unit declared.
//!
//! Every execution of a source unit records the names it declares. When the
//! unit finishes, the new record is diffed against the previous one; names
//! that disappeared are returned so the caller can delete them.
//!
//! ```text
//! load #1: {A, B}        → record {A, B}
//! load #2: {A}           → removed [B], record {A}
//! ```

use std::collections::HashMap;

use indexmap::IndexSet;

#[derive(Debug, Default)]
pub struct FileScopeTracker {
    /// Names declared during each unit's most recent completed execution.
    records: HashMap<String, IndexSet<String>>,
    /// Names declared so far by executions in progress.
    pending: HashMap<String, IndexSet<String>>,
}

impl FileScopeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an execution of `file`, discarding anything pending for it.
    pub fn begin(&mut self, file: &str) {
        self.pending.insert(file.to_string(), IndexSet::new());
    }

    /// Record a declaration made by `file`.
    pub fn record(&mut self, file: &str, name: &str) {
        self.pending
            .entry(file.to_string())
            .or_default()
            .insert(name.to_string());
    }

    /// Take the names recorded since [`begin`](Self::begin).
    pub fn take_pending(&mut self, file: &str) -> IndexSet<String> {
        self.pending.remove(file).unwrap_or_default()
    }

    /// Finish an execution: store `declared` and return the names that vanished.
    pub fn finish(&mut self, file: &str, declared: IndexSet<String>) -> Vec<String> {
        let removed = self
            .records
            .get(file)
            .map(|previous| {
                previous
                    .iter()
                    .filter(|name| !declared.contains(*name))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        self.pending.remove(file);
        self.records.insert(file.to_string(), declared);
        removed
    }

    /// Drop everything known about `file`, returning its last record.
    pub fn forget(&mut self, file: &str) -> Vec<String> {
        self.pending.remove(file);
        self.records
            .remove(file)
            .map(|names| names.into_iter().collect())
            .unwrap_or_default()
    }

    /// Names from the most recent completed execution of `file`.
    pub fn declared_in(&self, file: &str) -> Option<&IndexSet<String>> {
        self.records.get(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> IndexSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_finish_removes_nothing() {
        let mut tracker = FileScopeTracker::new();
        assert!(tracker.finish("app.views", names(&["A", "B"])).is_empty());
        assert_eq!(tracker.declared_in("app.views"), Some(&names(&["A", "B"])));
    }

    #[test]
    fn test_reload_diff() {
        let mut tracker = FileScopeTracker::new();
        tracker.finish("app.views", names(&["A", "B", "C"]));

        let removed = tracker.finish("app.views", names(&["C", "A"]));
        assert_eq!(removed, vec!["B".to_string()]);
        assert_eq!(tracker.declared_in("app.views"), Some(&names(&["C", "A"])));
    }

    #[test]
    fn test_pending_records() {
        let mut tracker = FileScopeTracker::new();
        tracker.begin("a");
        tracker.record("a", "X");
        tracker.record("a", "Y");
        tracker.record("a", "X");
        tracker.record("b", "Z");

        assert_eq!(tracker.take_pending("a"), names(&["X", "Y"]));
        assert!(tracker.take_pending("a").is_empty());

        // begin discards a stale pending record
        tracker.begin("b");
        assert!(tracker.take_pending("b").is_empty());
    }

    #[test]
    fn test_forget() {
        let mut tracker = FileScopeTracker::new();
        tracker.finish("a", names(&["X"]));

        assert_eq!(tracker.forget("a"), vec!["X".to_string()]);
        assert!(tracker.declared_in("a").is_none());
        assert!(tracker.forget("a").is_empty());
    }
}
