//! Runtime Events - Subscriptions to render and reload notifications.
//!
//! Handlers are stored as `(id, handler)` pairs per event kind. Subscribing
//! returns a [`Cleanup`] that removes exactly that handler.
//!
//! # Example
//!
//! ```ignore
//! let cleanup = runtime.on(EventKind::AfterRender, |_rt, _event| {
//!     tracing::info!("frame committed");
//! });
//!
//! // Later: unsubscribe
//! cleanup();
//! ```
//!
//! Dispatch clones the handler list first, so a handler may subscribe,
//! unsubscribe or trigger another render without a borrow conflict.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::runtime::Runtime;
use crate::types::Cleanup;

// =============================================================================
// Types
// =============================================================================

/// A notification emitted by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A render cycle committed its output.
    AfterRender,
    /// A view was redeclared with a new fingerprint.
    ViewLoaded(String),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::AfterRender => EventKind::AfterRender,
            Event::ViewLoaded(_) => EventKind::ViewLoaded,
        }
    }
}

/// Subscription key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    AfterRender,
    ViewLoaded,
}

/// Event handler. Receives the runtime that emitted the event.
pub type EventHandler = Rc<dyn Fn(&Runtime, &Event)>;

// =============================================================================
// Emitter
// =============================================================================

#[derive(Default)]
struct HandlerRegistry {
    handlers: HashMap<EventKind, Vec<(usize, EventHandler)>>,
    next_id: usize,
}

impl HandlerRegistry {
    fn next_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Per-runtime event subscriptions.
#[derive(Default)]
pub struct EventEmitter {
    registry: Rc<RefCell<HandlerRegistry>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to `kind`. Returns cleanup function.
    pub fn on<F>(&self, kind: EventKind, handler: F) -> Cleanup
    where
        F: Fn(&Runtime, &Event) + 'static,
    {
        let id = {
            let mut reg = self.registry.borrow_mut();
            let id = reg.next_id();
            reg.handlers
                .entry(kind)
                .or_default()
                .push((id, Rc::new(handler)));
            id
        };

        // Weak so a forgotten cleanup does not keep the registry alive.
        let registry: Weak<RefCell<HandlerRegistry>> = Rc::downgrade(&self.registry);
        Box::new(move || {
            if let Some(registry) = registry.upgrade() {
                let mut reg = registry.borrow_mut();
                if let Some(list) = reg.handlers.get_mut(&kind) {
                    list.retain(|(handler_id, _)| *handler_id != id);
                }
            }
        })
    }

    /// Call every handler subscribed to the event's kind, in subscription order.
    pub fn emit(&self, runtime: &Runtime, event: &Event) {
        let handlers: Vec<EventHandler> = self
            .registry
            .borrow()
            .handlers
            .get(&event.kind())
            .map(|list| list.iter().map(|(_, handler)| handler.clone()).collect())
            .unwrap_or_default();

        for handler in handlers {
            handler(runtime, event);
        }
    }

    /// Number of handlers subscribed to `kind`.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.registry
            .borrow()
            .handlers
            .get(&kind)
            .map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use std::cell::Cell;

    #[test]
    fn test_emit_reaches_matching_kind_only() {
        let runtime = Runtime::new(RuntimeConfig::default());
        let emitter = EventEmitter::new();
        let renders = Rc::new(Cell::new(0));
        let loaded = Rc::new(RefCell::new(Vec::new()));

        let r = renders.clone();
        let _c1 = emitter.on(EventKind::AfterRender, move |_, _| r.set(r.get() + 1));
        let l = loaded.clone();
        let _c2 = emitter.on(EventKind::ViewLoaded, move |_, event| {
            if let Event::ViewLoaded(name) = event {
                l.borrow_mut().push(name.clone());
            }
        });

        emitter.emit(&runtime, &Event::AfterRender);
        emitter.emit(&runtime, &Event::ViewLoaded("Card".into()));

        assert_eq!(renders.get(), 1);
        assert_eq!(*loaded.borrow(), vec!["Card".to_string()]);
    }

    #[test]
    fn test_cleanup_removes_only_its_handler() {
        let runtime = Runtime::new(RuntimeConfig::default());
        let emitter = EventEmitter::new();
        let count = Rc::new(Cell::new(0));

        let a = count.clone();
        let cleanup = emitter.on(EventKind::AfterRender, move |_, _| a.set(a.get() + 1));
        let b = count.clone();
        let _keep = emitter.on(EventKind::AfterRender, move |_, _| b.set(b.get() + 10));

        cleanup();
        assert_eq!(emitter.handler_count(EventKind::AfterRender), 1);

        emitter.emit(&runtime, &Event::AfterRender);
        assert_eq!(count.get(), 10);
    }

    #[test]
    fn test_cleanup_after_emitter_dropped() {
        let emitter = EventEmitter::new();
        let cleanup = emitter.on(EventKind::AfterRender, |_, _| {});
        drop(emitter);
        cleanup();
    }
}
