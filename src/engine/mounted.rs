//! Mounted-Instance Tracker - Live instances per view name.
//!
//! After a hot reload only the instances of views that actually changed are
//! refreshed. Instances that report themselves unmounted are dropped instead.
//!
//! The runtime redraws its own instances from the props they were created
//! with. The built-in [`ViewInstance`] also exposes a refresh counter as a
//! reactive signal, so code outside the runtime can react to forced updates:
//!
//! ```ignore
//! let refreshes = instance.refreshes();
//! effect(move || {
//!     let _ = refreshes.get();
//!     redraw_instance();
//! });
//! ```

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use spark_signals::{signal, Signal};

use crate::types::ViewProps;

// =============================================================================
// Instance Handles
// =============================================================================

/// A live instance of a view.
pub trait MountedInstance {
    /// Whether the instance is still part of the output.
    fn is_mounted(&self) -> bool;

    /// Re-render the instance in place.
    fn force_update(&self);
}

/// Instance handle created for every view instantiation.
pub struct ViewInstance {
    view: String,
    path: String,
    props: ViewProps,
    mounted: Cell<bool>,
    refreshes: Signal<u64>,
}

impl ViewInstance {
    pub fn new(view: impl Into<String>, path: impl Into<String>) -> Rc<Self> {
        Self::with_props(view, path, ViewProps::default())
    }

    /// Instance remembering the external props it was created with.
    pub fn with_props(
        view: impl Into<String>,
        path: impl Into<String>,
        props: ViewProps,
    ) -> Rc<Self> {
        Rc::new(Self {
            view: view.into(),
            path: path.into(),
            props,
            mounted: Cell::new(true),
            refreshes: signal(0),
        })
    }

    pub fn view(&self) -> &str {
        &self.view
    }

    /// Instance path, e.g. `Main,List,Item.2`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn props(&self) -> &ViewProps {
        &self.props
    }

    /// Whether this instance is `root` or lives below it.
    pub fn is_within(&self, root: &str) -> bool {
        self.path
            .strip_prefix(root)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(','))
    }

    /// Mark the instance as gone from the output.
    pub fn unmount(&self) {
        self.mounted.set(false);
    }

    /// Reactive refresh counter.
    pub fn refreshes(&self) -> Signal<u64> {
        self.refreshes.clone()
    }

    pub fn refresh_count(&self) -> u64 {
        self.refreshes.get()
    }
}

impl MountedInstance for ViewInstance {
    fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    fn force_update(&self) {
        self.refreshes.set(self.refreshes.get() + 1);
    }
}

/// Counts from one refresh pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Instances that were still mounted and got force-updated.
    pub refreshed: usize,
    /// Instances that reported themselves unmounted and were dropped.
    pub dropped: usize,
    /// Subtrees of the committed output that were re-instantiated.
    pub redrawn: usize,
}

/// Force-update every handle that is still mounted, counting the rest.
pub fn refresh_handles(handles: &[Rc<dyn MountedInstance>]) -> RefreshReport {
    let mut report = RefreshReport::default();
    for instance in handles {
        if instance.is_mounted() {
            instance.force_update();
            report.refreshed += 1;
        } else {
            report.dropped += 1;
        }
    }
    report
}

// =============================================================================
// Instance Set
// =============================================================================

#[derive(Default)]
pub struct MountedInstanceSet {
    instances: HashMap<String, Vec<Rc<dyn MountedInstance>>>,
}

impl MountedInstanceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a live instance of `view`.
    pub fn track(&mut self, view: &str, instance: Rc<dyn MountedInstance>) {
        self.instances
            .entry(view.to_string())
            .or_default()
            .push(instance);
    }

    /// Forget every instance of `view`.
    pub fn remove_view(&mut self, view: &str) -> Vec<Rc<dyn MountedInstance>> {
        self.instances.remove(view).unwrap_or_default()
    }

    /// Handles for the given views, cloned so callers can run them without
    /// holding a borrow of the set.
    pub fn handles<'a>(
        &self,
        views: impl IntoIterator<Item = &'a str>,
    ) -> Vec<Rc<dyn MountedInstance>> {
        views
            .into_iter()
            .filter_map(|view| self.instances.get(view))
            .flat_map(|list| list.iter().cloned())
            .collect()
    }

    /// Drop unmounted instances of the given views.
    pub fn prune<'a>(&mut self, views: impl IntoIterator<Item = &'a str>) {
        for view in views {
            if let Some(list) = self.instances.get_mut(view) {
                list.retain(|instance| instance.is_mounted());
            }
        }
    }

    /// Drop unmounted instances of every view.
    pub fn prune_all(&mut self) {
        for list in self.instances.values_mut() {
            list.retain(|instance| instance.is_mounted());
        }
        self.instances.retain(|_, list| !list.is_empty());
    }

    /// Number of tracked instances of `view`.
    pub fn count(&self, view: &str) -> usize {
        self.instances.get(view).map_or(0, Vec::len)
    }

    pub fn contains(&self, view: &str) -> bool {
        self.instances.contains_key(view)
    }
}
