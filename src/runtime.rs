//! Runtime - The context object that owns every piece of view state.
//!
//! One `Runtime` per running application. It is passed by reference to
//! everything that needs it; nothing lives in process-wide globals.
//!
//! # Example
//!
//! ```ignore
//! use spark_views::{Runtime, RuntimeConfig, ViewBody, ElementProps};
//!
//! let runtime = Runtime::new(RuntimeConfig::default());
//!
//! runtime.file_load("app.views", |rt, _exports| {
//!     rt.view("Main", ViewBody::new("<Main>Hello</Main>").render(|scope| {
//!         Ok(scope.element("div", ElementProps::new().named("Main"), vec![scope.text("Hello")]))
//!     }))?;
//!     Ok(())
//! })?;
//!
//! runtime.render_supervised()?;
//! ```
//!
//! # Hot Reload
//!
//! Re-running a file through [`Runtime::file_load`] redeclares its views.
//! Views it no longer declares are removed. Views whose fingerprint changed
//! are queued; [`Runtime::run_idle`] then refreshes only their mounted
//! instances and redraws them in the committed output.

use std::cell::{Cell, RefCell};
use std::error::Error;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use spark_signals::Signal;
use tracing::{debug, info, warn};

use crate::config::RuntimeConfig;
use crate::engine::{
    refresh_handles, Component, DeclareOutcome, FileScopeTracker, MountedInstance,
    MountedInstanceSet, RefreshReport, RegistrySnapshot, ViewBody, ViewInstance, ViewRegistry,
};
use crate::error::{ErrorContext, RenderError, ViewError};
use crate::pipeline::{
    DocumentSurface, ErrorReporter, MountSink, MountTarget, OutputSink, PreloadTask,
    RenderOutcome, RenderState, TracingReporter,
};
use crate::state::{
    Event, EventEmitter, EventKind, InspectFn, Inspector, InspectorEvent, StateMap,
};
use crate::types::{Cleanup, Node};

/// Callback receiving each serialized output.
pub type OutputCallback = Rc<dyn Fn(&str)>;

// =============================================================================
// File Exports
// =============================================================================

/// Values a file exposes to the application while it loads.
///
/// An object exported as `default` is spread into its keys.
#[derive(Debug, Clone, Default)]
pub struct FileExports {
    values: IndexMap<String, Value>,
}

impl FileExports {
    pub fn export(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn into_entries(self) -> Vec<(String, Value)> {
        let mut entries = Vec::with_capacity(self.values.len());
        for (name, value) in self.values {
            match value {
                Value::Object(spread) if name == "default" => entries.extend(spread),
                value => entries.push((name, value)),
            }
        }
        entries
    }
}

// =============================================================================
// Runtime
// =============================================================================

pub struct Runtime {
    config: RuntimeConfig,
    pub(crate) registry: RefCell<ViewRegistry>,
    scopes: RefCell<FileScopeTracker>,
    pub(crate) mounted: RefCell<MountedInstanceSet>,
    pub(crate) live_instances: RefCell<Vec<Rc<ViewInstance>>>,
    pub(crate) last_working: RefCell<RegistrySnapshot>,
    pub(crate) render_state: Cell<RenderState>,
    current_file: RefCell<Option<String>>,
    pending_refresh: RefCell<IndexSet<String>>,
    pub(crate) preloaders: RefCell<Vec<PreloadTask>>,
    pub(crate) sink: RefCell<OutputSink>,
    pub(crate) committed: RefCell<Option<Node>>,
    output_callback: Option<OutputCallback>,
    surface: Option<RefCell<Box<dyn DocumentSurface>>>,
    reporter: Box<dyn ErrorReporter>,
    pub(crate) events: EventEmitter,
    inspector: RefCell<Inspector>,
    exports: RefCell<IndexMap<String, Value>>,
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            registry: RefCell::new(ViewRegistry::new()),
            scopes: RefCell::new(FileScopeTracker::new()),
            mounted: RefCell::new(MountedInstanceSet::new()),
            live_instances: RefCell::new(Vec::new()),
            last_working: RefCell::new(RegistrySnapshot::default()),
            render_state: Cell::new(RenderState::default()),
            current_file: RefCell::new(None),
            pending_refresh: RefCell::new(IndexSet::new()),
            preloaders: RefCell::new(Vec::new()),
            sink: RefCell::new(OutputSink::default()),
            committed: RefCell::new(None),
            output_callback: None,
            surface: None,
            reporter: Box::new(TracingReporter),
            events: EventEmitter::new(),
            inspector: RefCell::new(Inspector::new()),
            exports: RefCell::new(IndexMap::new()),
        }
    }

    /// Replace the default tracing reporter.
    pub fn with_reporter(mut self, reporter: impl ErrorReporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    /// Mount into `target` instead of serializing.
    pub fn with_mount(mut self, sink: impl MountSink + 'static, target: MountTarget) -> Self {
        self.sink = RefCell::new(OutputSink::Mount {
            sink: Box::new(sink),
            target,
        });
        self
    }

    /// Attach a document surface for body background propagation.
    pub fn with_surface(mut self, surface: impl DocumentSurface + 'static) -> Self {
        self.surface = Some(RefCell::new(Box::new(surface)));
        self
    }

    /// Receive each serialized output after it is committed.
    pub fn on_output(mut self, callback: impl Fn(&str) + 'static) -> Self {
        self.output_callback = Some(Rc::new(callback));
        self
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn render_state(&self) -> RenderState {
        self.render_state.get()
    }

    pub fn is_first_render(&self) -> bool {
        self.render_state.get().first_render
    }

    pub(crate) fn output_callback(&self) -> Option<OutputCallback> {
        self.output_callback.clone()
    }

    /// Hand an error to the configured reporter.
    pub fn report(&self, error: &dyn Error, context: &ErrorContext) {
        self.reporter.report(error, context);
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    /// Declare a view on behalf of `file`.
    ///
    /// A duplicate before the first render is reported and returned as an
    /// error; the name then resolves to an error placeholder.
    pub fn declare(&self, file: &str, name: &str, body: ViewBody) -> Result<DeclareOutcome, ViewError> {
        self.declare_in(Some(file), name, body)
    }

    /// Declare a view on behalf of the file currently loading, if any.
    pub fn view(&self, name: &str, body: ViewBody) -> Result<DeclareOutcome, ViewError> {
        let file = self.current_file.borrow().clone();
        self.declare_in(file.as_deref(), name, body)
    }

    fn declare_in(
        &self,
        file: Option<&str>,
        name: &str,
        body: ViewBody,
    ) -> Result<DeclareOutcome, ViewError> {
        if self.config.production {
            return Ok(self.registry.borrow_mut().install(name, body));
        }

        if let Some(file) = file {
            self.scopes.borrow_mut().record(file, name);
        }

        let guard_duplicates = self.render_state.get().first_render;
        let outcome = self
            .registry
            .borrow_mut()
            .declare(name, body, guard_duplicates);

        match outcome {
            DeclareOutcome::DuplicateDefinition => {
                let error = ViewError::DuplicateView {
                    name: name.to_string(),
                };
                warn!(view = name, file = ?file, "duplicate view definition");
                self.report(&error, &ErrorContext::declare(name, file));
                Err(error)
            }
            DeclareOutcome::Changed => {
                self.events.emit(self, &Event::ViewLoaded(name.to_string()));
                Ok(outcome)
            }
            DeclareOutcome::Created | DeclareOutcome::Unchanged => Ok(outcome),
        }
    }

    /// Delete a view. Idempotent.
    pub fn remove_view(&self, name: &str) {
        self.registry.borrow_mut().remove(name);
        self.mounted.borrow_mut().remove_view(name);
    }

    /// Resolve a view, trying `parent.name` first. Misses yield a placeholder.
    pub fn get_view(&self, name: &str, parent: Option<&str>) -> Component {
        self.registry.borrow().lookup(name, parent)
    }

    /// Names created or changed since the current file load began.
    pub fn changed_views(&self) -> Vec<String> {
        self.registry
            .borrow()
            .changed()
            .map(str::to_string)
            .collect()
    }

    // =========================================================================
    // File Loading
    // =========================================================================

    /// Run one source unit.
    ///
    /// Declarations made through [`view`](Self::view) inside `run` are
    /// attributed to `file`. Afterwards the file's views are diffed against
    /// its previous load and its exports are published.
    pub fn file_load<F>(&self, file: &str, run: F) -> Result<(), ViewError>
    where
        F: FnOnce(&Runtime, &mut FileExports) -> Result<(), ViewError>,
    {
        let mut exports = FileExports::default();

        if self.config.production {
            let result = run(self, &mut exports);
            self.publish_exports(exports);
            return result;
        }

        self.scopes.borrow_mut().begin(file);
        self.registry.borrow_mut().reset_changed();
        let previous = self.current_file.replace(Some(file.to_string()));
        debug!(file, "file load");

        let result = run(self, &mut exports);

        *self.current_file.borrow_mut() = previous;
        self.publish_exports(exports);
        let declared = self.scopes.borrow_mut().take_pending(file);
        self.end_file_load(file, declared);
        result
    }

    /// Finish loading `file` with the names it declared.
    ///
    /// Removes views the previous load declared but this one did not, and
    /// queues the changed views for the next refresh pass. Returns the
    /// removed names.
    pub fn end_file_load(
        &self,
        file: &str,
        declared: impl IntoIterator<Item = String>,
    ) -> Vec<String> {
        let declared: IndexSet<String> = declared.into_iter().collect();
        let removed = self.scopes.borrow_mut().finish(file, declared);
        for name in &removed {
            self.remove_view(name);
            debug!(view = %name, file, "view removed on reload");
        }

        let changed = self.registry.borrow_mut().take_changed();
        if !self.is_first_render() && !changed.is_empty() {
            debug!(file, views = changed.len(), "refresh scheduled");
            self.pending_refresh.borrow_mut().extend(changed);
        }
        removed
    }

    /// Remove every view `file` declared, then render.
    pub fn delete_file(&self, file: &str) -> Result<RenderOutcome, RenderError> {
        let names = self.scopes.borrow_mut().forget(file);
        for name in &names {
            self.remove_view(name);
        }
        info!(file, views = names.len(), "file deleted");
        self.render_supervised()
    }

    fn publish_exports(&self, exports: FileExports) {
        if exports.is_empty() {
            return;
        }
        self.exports.borrow_mut().extend(exports.into_entries());
    }

    /// All values exported by loaded files.
    pub fn exports(&self) -> IndexMap<String, Value> {
        self.exports.borrow().clone()
    }

    pub fn exported(&self, name: &str) -> Option<Value> {
        self.exports.borrow().get(name).cloned()
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Whether a refresh pass is waiting for [`run_idle`](Self::run_idle).
    pub fn refresh_pending(&self) -> bool {
        !self.pending_refresh.borrow().is_empty()
    }

    /// Run the deferred refresh pass over every view queued since the last one.
    ///
    /// Mounted handles of the queued views are force-updated, stale ones are
    /// dropped, and the runtime's own instances are re-instantiated in the
    /// committed output. A failing redraw is recovered like
    /// [`render_supervised`](Self::render_supervised).
    pub fn run_idle(&self) -> Result<RefreshReport, RenderError> {
        let changed = std::mem::take(&mut *self.pending_refresh.borrow_mut());
        if changed.is_empty() {
            return Ok(RefreshReport::default());
        }

        let views = || changed.iter().map(String::as_str);
        let handles = self.mounted.borrow().handles(views());
        let mut report = refresh_handles(&handles);
        self.mounted.borrow_mut().prune(views());

        report.redrawn = self
            .redraw(&changed)
            .inspect_err(|err| self.recover(err))?;

        info!(
            views = changed.len(),
            refreshed = report.refreshed,
            dropped = report.dropped,
            redrawn = report.redrawn,
            "refresh pass"
        );
        Ok(report)
    }

    /// Track an externally created instance of `view`.
    pub fn track_instance(&self, view: &str, instance: Rc<dyn MountedInstance>) {
        self.mounted.borrow_mut().track(view, instance);
    }

    pub fn mounted_count(&self, view: &str) -> usize {
        self.mounted.borrow().count(view)
    }

    /// Instances created by the last committed render.
    pub fn live_instances(&self) -> Vec<Rc<ViewInstance>> {
        self.live_instances.borrow().clone()
    }

    // =========================================================================
    // Preload, Events, Output
    // =========================================================================

    /// Register a task the next render awaits before instantiating anything.
    pub fn add_preloader<F>(&self, task: F)
    where
        F: Fn() -> LocalBoxFuture<'static, ()> + 'static,
    {
        self.preloaders.borrow_mut().push(Box::new(task));
    }

    /// Subscribe to a runtime event. Returns cleanup function.
    pub fn on<F>(&self, kind: EventKind, handler: F) -> Cleanup
    where
        F: Fn(&Runtime, &Event) + 'static,
    {
        self.events.on(kind, handler)
    }

    /// Latest serialized output, when serializing.
    pub fn rendered_to_string(&self) -> Option<String> {
        match &*self.sink.borrow() {
            OutputSink::Serialize(sink) => sink.latest(),
            OutputSink::Mount { .. } => None,
        }
    }

    /// Reactive handle on the serialized output, when serializing.
    pub fn output_signal(&self) -> Option<Signal<Option<String>>> {
        match &*self.sink.borrow() {
            OutputSink::Serialize(sink) => Some(sink.output()),
            OutputSink::Mount { .. } => None,
        }
    }

    pub(crate) fn propagate_body_background(&self, background: Option<&str>) {
        if let Some(surface) = &self.surface {
            surface.borrow_mut().set_body_background(background);
        }
    }

    // =========================================================================
    // Inspector
    // =========================================================================

    /// Watch the instance at `path`. The callback fires now and on every state change.
    pub fn inspect<F>(&self, path: &str, callback: F)
    where
        F: Fn(&Runtime, &InspectorEvent) + 'static,
    {
        let callback: InspectFn = Rc::new(callback);
        self.inspector.borrow_mut().watch(path, callback);
        self.notify_inspector(path);
    }

    pub fn state(&self, path: &str, key: &str) -> Option<Value> {
        self.inspector.borrow().get(path, key).cloned()
    }

    pub fn instance_state(&self, path: &str) -> StateMap {
        self.inspector.borrow().state(path).cloned().unwrap_or_default()
    }

    pub fn set_state(&self, path: &str, key: &str, value: Value) {
        self.inspector.borrow_mut().set(path, key, value);
        self.notify_inspector(path);
    }

    /// Edit instance state from outside, then render.
    pub fn write_back(
        &self,
        path: &str,
        keys: &[&str],
        value: Value,
    ) -> Result<RenderOutcome, RenderError> {
        self.inspector.borrow_mut().write_path(path, keys, value);
        self.notify_inspector(path);
        self.render_supervised()
    }

    pub(crate) fn record_props(&self, path: &str, props: &Value) {
        self.inspector.borrow_mut().record_props(path, props);
    }

    /// Forget inspector data of instance paths `keep` rejects.
    pub(crate) fn retain_inspected(&self, keep: impl Fn(&str) -> bool) {
        self.inspector.borrow_mut().retain_paths(keep);
    }

    fn notify_inspector(&self, path: &str) {
        let notification = self.inspector.borrow().notification(path);
        if let Some((callback, event)) = notification {
            callback(self, &event);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
