//! Inspector - Per-instance state cache for development tooling.
//!
//! Every view instance is addressed by its path (`Main,List,Item.2`). The
//! inspector keeps the last props and the state of each path. A tool watches
//! one path at a time and is notified whenever that path's state changes; it
//! can edit the state back through [`WriteBack`], which re-renders.

use std::collections::HashMap;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::error::RenderError;
use crate::pipeline::RenderOutcome;
use crate::runtime::Runtime;

/// Instance state: key to value.
pub type StateMap = Map<String, Value>;

/// Inspection callback.
pub type InspectFn = Rc<dyn Fn(&Runtime, &InspectorEvent)>;

/// View name addressed by an instance path.
///
/// The last comma segment, up to its first `.` (which starts the key).
pub fn view_name_of(path: &str) -> &str {
    let segment = path.rsplit(',').next().unwrap_or(path);
    segment.split('.').next().unwrap_or(segment)
}

// =============================================================================
// Events
// =============================================================================

/// Handle a tool uses to edit the inspected instance's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteBack {
    path: String,
}

impl WriteBack {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Set the value at `keys` in the instance state, then render.
    pub fn apply(
        &self,
        runtime: &Runtime,
        keys: &[&str],
        value: Value,
    ) -> Result<RenderOutcome, RenderError> {
        runtime.write_back(&self.path, keys, value)
    }
}

/// What an inspection callback receives.
#[derive(Debug, Clone)]
pub struct InspectorEvent {
    pub view_name: String,
    pub props: Value,
    pub state: StateMap,
    pub write_back: WriteBack,
}

// =============================================================================
// Inspector
// =============================================================================

#[derive(Default)]
pub struct Inspector {
    props: HashMap<String, Value>,
    states: HashMap<String, StateMap>,
    watched: Option<(String, InspectFn)>,
}

impl Inspector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Watch `path`, replacing any previous watch.
    pub fn watch(&mut self, path: &str, callback: InspectFn) {
        self.watched = Some((path.to_string(), callback));
    }

    pub fn unwatch(&mut self) {
        self.watched = None;
    }

    pub fn watched_path(&self) -> Option<&str> {
        self.watched.as_ref().map(|(path, _)| path.as_str())
    }

    /// Remember the props an instance was rendered with.
    pub fn record_props(&mut self, path: &str, props: &Value) {
        self.props.insert(path.to_string(), props.clone());
    }

    /// Drop props and state of every path `keep` rejects.
    pub fn retain_paths(&mut self, keep: impl Fn(&str) -> bool) {
        self.props.retain(|path, _| keep(path));
        self.states.retain(|path, _| keep(path));
    }

    pub fn props(&self, path: &str) -> Option<&Value> {
        self.props.get(path)
    }

    pub fn state(&self, path: &str) -> Option<&StateMap> {
        self.states.get(path)
    }

    pub fn get(&self, path: &str, key: &str) -> Option<&Value> {
        self.states.get(path).and_then(|state| state.get(key))
    }

    pub fn set(&mut self, path: &str, key: &str, value: Value) {
        self.states
            .entry(path.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    /// Set a nested value, creating intermediate objects.
    ///
    /// With no keys, an object value replaces the whole state.
    pub fn write_path(&mut self, path: &str, keys: &[&str], value: Value) {
        let state = self.states.entry(path.to_string()).or_default();
        let Some((last, parents)) = keys.split_last() else {
            if let Value::Object(map) = value {
                *state = map;
            }
            return;
        };

        let mut target = state;
        for key in parents {
            let slot = target
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            let Value::Object(next) = slot else {
                return;
            };
            target = next;
        }
        target.insert(last.to_string(), value);
    }

    /// Callback and event for `path`, if it is the watched one.
    ///
    /// Returned by value so the caller can invoke it without holding a borrow.
    pub fn notification(&self, path: &str) -> Option<(InspectFn, InspectorEvent)> {
        let (watched, callback) = self.watched.as_ref()?;
        if watched != path {
            return None;
        }
        let event = InspectorEvent {
            view_name: view_name_of(path).to_string(),
            props: self.props.get(path).cloned().unwrap_or(Value::Null),
            state: self.states.get(path).cloned().unwrap_or_default(),
            write_back: WriteBack {
                path: path.to_string(),
            },
        };
        Some((callback.clone(), event))
    }
}
