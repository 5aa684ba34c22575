//! Render Pipeline
//!
//! Connects the view registry to an output sink.
//!
//! # Pipeline Architecture
//!
//! ```text
//! Registry → entry view → Scope (instantiate + resolve styles) → Node tree → OutputSink
//!                                                                     │
//!                                        mounted instances ◄──────────┤
//!                                        AfterRender       ◄──────────┘
//! ```
//!
//! ## Modules
//!
//! 1. **scope** - What a render function sees, view instantiation
//! 2. **render** - The render cycle, depth guard, preloading
//! 3. **sink** - Serializing and mounting sinks
//! 4. **recovery** - Error reporting and registry rollback
//!
//! ## Key Design Principles
//!
//! - **Committed or untouched**: a failing cycle commits nothing and leaves the
//!   previous output in place
//! - **Last working snapshot**: captured only after a clean commit

pub mod recovery;
pub mod render;
pub mod scope;
pub mod sink;

// Re-exports
pub use recovery::{ErrorReporter, TracingReporter};
pub use render::{PreloadTask, RenderOutcome, RenderState};
pub use scope::{Scope, PLACEHOLDER_CLASS};
pub use sink::{
    render_to_string, Commit, DocumentSurface, MountSink, MountTarget, OutputSink, StringSink,
    TerminalMount,
};
