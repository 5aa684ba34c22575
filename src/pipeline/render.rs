//! Render Cycle Controller.
//!
//! One cycle:
//!
//! ```text
//! first_render = false
//!   → await preload tasks
//!   → depth += 1 (abort past max_render_depth)
//!   → resolve entry view (live, else last working, else not-found)
//!   → instantiate tree (panics caught)
//!   → commit to sink → swap mounted instances → emit AfterRender
//!   → depth = 0 → capture last working snapshot
//! ```
//!
//! The committed tree is kept. The idle refresh pass patches it in place:
//! each changed view's instance subtree is re-instantiated at its path from
//! the props it was created with, then the patched tree is committed again.
//!
//! The depth counter only comes back to zero when a cycle ends, so a render
//! triggered from inside a render (or from an `AfterRender` handler) counts
//! towards the limit. That bounds render storms without rejecting ordinary
//! sequential renders.

use std::any::Any;
use std::cell::Cell;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use futures::executor::block_on;
use futures::future::{join_all, LocalBoxFuture};
use indexmap::IndexSet;
use tracing::{debug, warn};

use super::scope::{instantiate, CycleState};
use super::sink::Commit;
use crate::engine::{Component, ViewInstance};
use crate::error::RenderError;
use crate::runtime::Runtime;
use crate::state::Event;
use crate::types::{Node, ViewNode, ViewProps};

// =============================================================================
// Types
// =============================================================================

/// Render bookkeeping kept across cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderState {
    /// Nesting depth of the cycle in progress, 0 when idle.
    pub depth: u32,
    /// True until the first render starts.
    pub first_render: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            depth: 0,
            first_render: true,
        }
    }
}

/// Result of a render call that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Output was committed.
    Committed(Commit),
    /// Nesting passed the depth limit. Nothing was instantiated.
    Aborted { depth: u32 },
}

impl RenderOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, RenderOutcome::Committed(_))
    }

    /// Serialized output, if this commit produced one.
    pub fn output(&self) -> Option<&str> {
        match self {
            RenderOutcome::Committed(Commit::Serialized(html)) => Some(html),
            _ => None,
        }
    }
}

/// Asynchronous task awaited before the next render.
pub type PreloadTask = Box<dyn Fn() -> LocalBoxFuture<'static, ()>>;

/// Puts the depth counter back to zero when a cycle ends, errors included.
struct DepthReset<'a>(&'a Cell<RenderState>);

impl Drop for DepthReset<'_> {
    fn drop(&mut self) {
        let mut state = self.0.get();
        state.depth = 0;
        self.0.set(state);
    }
}

// =============================================================================
// Render
// =============================================================================

impl Runtime {
    /// Run one render cycle.
    pub fn render(&self) -> Result<RenderOutcome, RenderError> {
        self.update_render_state(|state| state.first_render = false);
        self.await_preloaders();

        let depth = self.update_render_state(|state| {
            state.depth += 1;
            state.depth
        });
        if depth > self.config().max_render_depth {
            warn!(depth, "render depth limit reached, cycle aborted");
            return Ok(RenderOutcome::Aborted { depth });
        }
        let reset = DepthReset(&self.render_state);

        let root = self.resolve_root();
        let path = root.name().to_string();
        debug!(depth, view = %path, "render");

        let cycle = CycleState::default();
        let tree = self.instantiate_caught(&cycle, root, ViewProps::default(), path)?;
        let commit = self.commit_tree(tree)?;

        self.replace_live_instances(cycle.into_instances());
        self.events.emit(self, &Event::AfterRender);

        drop(reset);
        *self.last_working.borrow_mut() = self.registry.borrow().snapshot();
        Ok(RenderOutcome::Committed(commit))
    }

    /// Re-instantiate, in the committed output, every view instance of `views`.
    ///
    /// Only the topmost instance of a nested pair is rebuilt; its subtree
    /// comes along. The patched tree is committed to the sink. Returns the
    /// number of rebuilt subtrees, 0 when nothing has been committed yet.
    pub(crate) fn redraw(&self, views: &IndexSet<String>) -> Result<usize, RenderError> {
        let Some(mut tree) = self.committed.borrow().clone() else {
            return Ok(0);
        };

        let cycle = CycleState::default();
        let mut roots = Vec::new();
        let mut rebuild = |node: &ViewNode| -> Result<Option<Node>, RenderError> {
            let instance = self
                .live_instances
                .borrow()
                .iter()
                .find(|instance| instance.path() == node.path)
                .cloned();
            let Some(instance) = instance else {
                return Ok(None);
            };

            let component = self.get_view(&node.view, None);
            let fresh = self.instantiate_caught(
                &cycle,
                component,
                instance.props().clone(),
                node.path.clone(),
            )?;
            roots.push(node.path.clone());
            Ok(Some(fresh))
        };
        let redrawn = redraw_subtrees(&mut tree, views, &mut rebuild)?;
        if redrawn == 0 {
            return Ok(0);
        }

        self.commit_tree(tree)?;
        self.swap_live_subtrees(&roots, cycle.into_instances());
        self.events.emit(self, &Event::AfterRender);
        *self.last_working.borrow_mut() = self.registry.borrow().snapshot();
        Ok(redrawn)
    }

    pub(crate) fn update_render_state<R>(&self, update: impl FnOnce(&mut RenderState) -> R) -> R {
        let mut state = self.render_state.get();
        let result = update(&mut state);
        self.render_state.set(state);
        result
    }

    /// Instantiate a component, turning a panic into [`RenderError::Panicked`].
    fn instantiate_caught(
        &self,
        cycle: &CycleState,
        component: Component,
        props: ViewProps,
        path: String,
    ) -> Result<Node, RenderError> {
        panic::catch_unwind(AssertUnwindSafe(|| {
            instantiate(self, cycle, component, props, path)
        }))
        .map_err(|payload| RenderError::Panicked {
            message: panic_message(payload.as_ref()),
        })?
    }

    /// Hand a finished tree to the sink and keep it for later redraws.
    fn commit_tree(&self, tree: Node) -> Result<Commit, RenderError> {
        let commit = self.sink.borrow_mut().commit(&tree)?;
        *self.committed.borrow_mut() = Some(tree);
        if let (Commit::Serialized(html), Some(callback)) = (&commit, self.output_callback()) {
            callback(html);
        }
        Ok(commit)
    }

    /// Live entry, else the last working one, else a not-found placeholder.
    fn resolve_root(&self) -> Component {
        let entry = &self.config().entry;
        let live = self
            .registry
            .borrow()
            .get(entry)
            .map(|definition| definition.component.clone());

        match live {
            Some(component) if !component.is_placeholder() => component,
            live => self
                .last_working
                .borrow()
                .get(entry)
                .map(|definition| definition.component.clone())
                .or(live)
                .unwrap_or_else(|| Component::NotFound(entry.clone())),
        }
    }

    /// Run every registered preload task to completion and drop them.
    fn await_preloaders(&self) {
        let tasks: Vec<_> = self.preloaders.borrow_mut().drain(..).collect();
        if tasks.is_empty() {
            return;
        }
        debug!(count = tasks.len(), "awaiting preload tasks");
        block_on(join_all(tasks.iter().map(|task| task())));
    }

    /// Unmount the previous cycle's instances and track the new ones.
    fn replace_live_instances(&self, instances: Vec<Rc<ViewInstance>>) {
        let previous = self.live_instances.replace(instances.clone());
        for instance in &previous {
            instance.unmount();
        }
        self.track_live(instances);
    }

    /// Unmount the instances below each of `roots` and add their replacements.
    fn swap_live_subtrees(&self, roots: &[String], fresh: Vec<Rc<ViewInstance>>) {
        self.live_instances.borrow_mut().retain(|instance| {
            let replaced = roots.iter().any(|root| instance.is_within(root));
            if replaced {
                instance.unmount();
            }
            !replaced
        });
        self.live_instances
            .borrow_mut()
            .extend(fresh.iter().cloned());
        self.track_live(fresh);
    }

    fn track_live(&self, instances: Vec<Rc<ViewInstance>>) {
        let live: HashSet<String> = self
            .live_instances
            .borrow()
            .iter()
            .map(|instance| instance.path().to_string())
            .collect();
        self.retain_inspected(|path| live.contains(path));

        if self.config().production {
            return;
        }
        let mut mounted = self.mounted.borrow_mut();
        for instance in instances {
            let view = instance.view().to_string();
            mounted.track(&view, instance);
        }
        mounted.prune_all();
    }
}

/// Replace each [`ViewNode`] of `views` with what `rebuild` returns for it.
///
/// Nodes `rebuild` declines are searched further down. Returns the number of
/// replaced nodes.
fn redraw_subtrees(
    node: &mut Node,
    views: &IndexSet<String>,
    rebuild: &mut dyn FnMut(&ViewNode) -> Result<Option<Node>, RenderError>,
) -> Result<usize, RenderError> {
    let fresh = match &*node {
        Node::View(view) if views.contains(&view.view) => rebuild(view)?,
        _ => None,
    };
    if let Some(fresh) = fresh {
        *node = fresh;
        return Ok(1);
    }

    match node {
        Node::Text(_) => Ok(0),
        Node::View(view) => redraw_subtrees(&mut view.content, views, rebuild),
        Node::Element(element) => redraw_children(&mut element.children, views, rebuild),
        Node::Fragment(nodes) => redraw_children(nodes, views, rebuild),
    }
}

fn redraw_children(
    children: &mut [Node],
    views: &IndexSet<String>,
    rebuild: &mut dyn FnMut(&ViewNode) -> Result<Option<Node>, RenderError>,
) -> Result<usize, RenderError> {
    let mut count = 0;
    for child in children {
        count += redraw_subtrees(child, views, rebuild)?;
    }
    Ok(count)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
