//! # spark-views
//!
//! Hot-reloadable view registry and cascading style resolution for component UIs.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for reactive
//! output handles and instance refresh counters.
//!
//! ## Architecture
//!
//! Views are declared by name from source units ("files"). Each declaration is
//! fingerprinted, so reloading a file only replaces what actually changed, and
//! only the mounted instances of changed views are refreshed:
//!
//! ```text
//! file_load → declare → ViewRegistry ──► render() → Scope → Node tree → OutputSink
//!                │                            │        │
//!          FileScopeTracker           LastWorkingSnapshot  resolve_styles
//!         (removed-view diff)          (error rollback)   (cascade + shorthands)
//! ```
//!
//! All state lives in an explicit [`Runtime`] value owned by the application.
//!
//! ## Modules
//!
//! - [`types`] - Core types (Node, Element, ElementProps, ViewProps, StyleMap)
//! - [`engine`] - Fingerprints, view registry, file scopes, mounted instances
//! - [`style`] - Style sheets, precedence resolution, shorthand normalization
//! - [`pipeline`] - Render cycle, instantiation scope, output sinks, recovery
//! - [`state`] - Runtime events and the inspector
//! - [`runtime`] - The runtime context and its public operations
//! - [`config`] / [`logging`] / [`error`] - Ambient plumbing

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod runtime;
pub mod state;
pub mod style;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use config::{ConfigError, RuntimeConfig};

pub use error::{ErrorContext, ErrorPhase, RenderError, SinkError, ViewError};

pub use engine::{
    Component, DeclareOutcome, Fingerprint, MountedInstance, RefreshReport, RegistrySnapshot,
    ViewBody, ViewDefinition, ViewInstance,
};

pub use pipeline::{
    render_to_string, Commit, DocumentSurface, ErrorReporter, MountSink, MountTarget,
    RenderOutcome, RenderState, Scope, TerminalMount, TracingReporter,
};

pub use runtime::{FileExports, Runtime};

pub use state::{Event, EventKind, InspectorEvent, WriteBack};

pub use style::{SelectorKey, StyleOutput, StyleRule, StyleSheet};
