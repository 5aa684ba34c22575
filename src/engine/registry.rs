//! View Registry - Named view definitions across reload cycles.
//!
//! Manages the lifecycle of view definitions:
//! - Declare: create, reuse (same fingerprint) or replace (new fingerprint)
//! - Duplicate guard: a second declaration before the first render is fatal to that view
//! - Lookup with sub-view addressing (`Parent.Child` before `Child`)
//! - Snapshot / restore for error rollback
//! - Changed-view bookkeeping for targeted refresh

use std::collections::HashMap;

use indexmap::IndexSet;
use tracing::debug;

use super::component::{Component, ViewBody};
use super::hasher::Fingerprint;

// =============================================================================
// Types
// =============================================================================

/// Result of declaring a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclareOutcome {
    /// First declaration of this name.
    Created,
    /// Same fingerprint as the installed entry. Nothing re-renders.
    Unchanged,
    /// New fingerprint. Entry replaced and scheduled for refresh.
    Changed,
    /// Declared twice before the first render. Entry replaced by an error placeholder.
    DuplicateDefinition,
}

/// A registry entry.
#[derive(Debug, Clone)]
pub struct ViewDefinition {
    pub name: String,
    /// `None` for placeholders, so any later declaration counts as a change.
    pub fingerprint: Option<Fingerprint>,
    pub component: Component,
}

impl ViewDefinition {
    fn compiled(name: &str, body: ViewBody) -> Self {
        let component = Component::compile(name, body);
        Self {
            name: name.to_string(),
            fingerprint: component.fingerprint(),
            component,
        }
    }

    fn duplicate(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fingerprint: None,
            component: Component::DuplicateDefinition(name.to_string()),
        }
    }
}

/// Full copy of the registry at a point in time.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    views: HashMap<String, ViewDefinition>,
}

impl RegistrySnapshot {
    pub fn get(&self, name: &str) -> Option<&ViewDefinition> {
        self.views.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.views.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Mapping of view name to definition. At most one live entry per name.
#[derive(Debug, Default)]
pub struct ViewRegistry {
    views: HashMap<String, ViewDefinition>,
    changed: IndexSet<String>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a view.
    ///
    /// # Arguments
    /// * `guard_duplicates` - true until the first render has started; an
    ///   existing entry then means the name was declared twice.
    pub fn declare(&mut self, name: &str, body: ViewBody, guard_duplicates: bool) -> DeclareOutcome {
        let fingerprint = Fingerprint::of(body.source());

        let outcome = match self.views.get(name) {
            None => DeclareOutcome::Created,
            Some(_) if guard_duplicates => DeclareOutcome::DuplicateDefinition,
            Some(existing) if existing.fingerprint == Some(fingerprint) => DeclareOutcome::Unchanged,
            Some(_) => DeclareOutcome::Changed,
        };

        match outcome {
            DeclareOutcome::Created | DeclareOutcome::Changed => {
                self.views
                    .insert(name.to_string(), ViewDefinition::compiled(name, body));
                self.changed.insert(name.to_string());
            }
            DeclareOutcome::DuplicateDefinition => {
                self.views
                    .insert(name.to_string(), ViewDefinition::duplicate(name));
            }
            DeclareOutcome::Unchanged => {}
        }

        debug!(view = name, %fingerprint, ?outcome, "declare");
        outcome
    }

    /// Install unconditionally, with no duplicate guard or change tracking.
    pub fn install(&mut self, name: &str, body: ViewBody) -> DeclareOutcome {
        let previous = self
            .views
            .insert(name.to_string(), ViewDefinition::compiled(name, body));
        if previous.is_some() {
            DeclareOutcome::Changed
        } else {
            DeclareOutcome::Created
        }
    }

    /// Delete an entry. Idempotent.
    pub fn remove(&mut self, name: &str) -> Option<ViewDefinition> {
        self.changed.shift_remove(name);
        self.views.remove(name)
    }

    /// Resolve a view, trying `Parent.Name` before `Name`.
    ///
    /// Never fails: a miss yields [`Component::NotFound`].
    pub fn lookup(&self, name: &str, parent: Option<&str>) -> Component {
        let scoped = parent.and_then(|parent| self.views.get(&format!("{parent}.{name}")));
        scoped
            .or_else(|| self.views.get(name))
            .map(|definition| definition.component.clone())
            .unwrap_or_else(|| Component::NotFound(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&ViewDefinition> {
        self.views.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.views.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.views.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    // =========================================================================
    // Changed Views
    // =========================================================================

    /// Views created or changed since the last reset, in declaration order.
    pub fn changed(&self) -> impl Iterator<Item = &str> {
        self.changed.iter().map(String::as_str)
    }

    /// Take the changed set, leaving it empty.
    pub fn take_changed(&mut self) -> IndexSet<String> {
        std::mem::take(&mut self.changed)
    }

    pub fn reset_changed(&mut self) {
        self.changed.clear();
    }

    // =========================================================================
    // Snapshot / Rollback
    // =========================================================================

    /// Copy the current entries.
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            views: self.views.clone(),
        }
    }

    /// Replace every live entry with the snapshot's entry of the same name.
    ///
    /// Names missing from the snapshot are removed. The new map is built
    /// first and swapped in, so no half-restored state is ever visible.
    pub fn restore_from(&mut self, snapshot: &RegistrySnapshot) {
        let restored: HashMap<String, ViewDefinition> = self
            .views
            .keys()
            .filter_map(|name| {
                snapshot
                    .get(name)
                    .map(|definition| (name.clone(), definition.clone()))
            })
            .collect();
        self.views = restored;
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn body(source: &str) -> ViewBody {
        ViewBody::new(source)
    }

    #[test]
    fn test_created_then_unchanged() {
        let mut registry = ViewRegistry::new();

        assert_eq!(registry.declare("A", body("a1"), false), DeclareOutcome::Created);
        assert_eq!(registry.changed().collect::<Vec<_>>(), vec!["A"]);

        registry.reset_changed();
        assert_eq!(registry.declare("A", body("a1"), false), DeclareOutcome::Unchanged);
        assert_eq!(registry.changed().count(), 0);
    }

    #[test]
    fn test_changed_replaces_entry() {
        let mut registry = ViewRegistry::new();
        registry.declare("A", body("a1"), false);
        let before = registry.lookup("A", None);

        registry.reset_changed();
        assert_eq!(registry.declare("A", body("a2"), false), DeclareOutcome::Changed);
        assert_eq!(registry.changed().collect::<Vec<_>>(), vec!["A"]);

        let after = registry.lookup("A", None);
        assert!(!before.same_as(&after));
        assert_eq!(after.fingerprint(), Some(Fingerprint::of("a2")));
    }

    #[test]
    fn test_duplicate_guard() {
        let mut registry = ViewRegistry::new();
        registry.declare("A", body("a1"), true);

        assert_eq!(
            registry.declare("A", body("a2"), true),
            DeclareOutcome::DuplicateDefinition
        );
        assert!(matches!(
            registry.lookup("A", None),
            Component::DuplicateDefinition(ref name) if name == "A"
        ));

        // once the guard is off, the placeholder is replaced even by identical source
        assert_eq!(registry.declare("A", body("a2"), false), DeclareOutcome::Changed);
        assert!(!registry.lookup("A", None).is_placeholder());
    }

    #[test]
    fn test_lookup_prefers_sub_view() {
        let mut registry = ViewRegistry::new();
        registry.declare("Item", body("plain"), false);
        registry.declare("List.Item", body("scoped"), false);

        let scoped = registry.lookup("Item", Some("List"));
        assert_eq!(scoped.fingerprint(), Some(Fingerprint::of("scoped")));

        let plain = registry.lookup("Item", Some("Other"));
        assert_eq!(plain.fingerprint(), Some(Fingerprint::of("plain")));

        assert!(matches!(
            registry.lookup("Missing", Some("List")),
            Component::NotFound(ref name) if name == "Missing"
        ));
    }

    #[test]
    fn test_remove_idempotent() {
        let mut registry = ViewRegistry::new();
        registry.declare("A", body("a"), false);

        assert!(registry.remove("A").is_some());
        assert!(registry.remove("A").is_none());
        assert!(!registry.contains("A"));
        assert_eq!(registry.changed().count(), 0);
    }

    #[test]
    fn test_install_skips_guard() {
        let mut registry = ViewRegistry::new();
        assert_eq!(registry.install("A", body("a1")), DeclareOutcome::Created);
        assert_eq!(registry.install("A", body("a1")), DeclareOutcome::Changed);
        assert_eq!(registry.changed().count(), 0);
    }

    #[test]
    fn test_restore_from_snapshot() {
        let mut registry = ViewRegistry::new();
        registry.declare("A", body("a1"), false);
        registry.declare("B", body("b1"), false);
        let snapshot = registry.snapshot();
        let a1 = registry.lookup("A", None);

        registry.declare("A", body("a2"), false);
        registry.declare("C", body("c1"), false);
        registry.remove("B");

        registry.restore_from(&snapshot);

        assert!(registry.lookup("A", None).same_as(&a1));
        // C was never snapshotted
        assert!(!registry.contains("C"));
        // B was not live at rollback time
        assert!(!registry.contains("B"));
        assert_eq!(snapshot.len(), 2);
    }
}
