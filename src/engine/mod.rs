//! View Engine - Registry, file scopes and mounted instances.
//!
//! The engine owns the state that survives across reload cycles:
//! - Hasher: content fingerprints for change detection
//! - Component: view bodies and the compiled components lookups return
//! - Registry: name → definition, duplicate guard, snapshot/restore
//! - FileScope: per-source-unit declared names, diffed on reload
//! - Mounted: live instances per view, refreshed after hot reloads
//!
//! # Reload Cycle
//!
//! ```text
//! file_load("app") → declare(A) declare(B) … → end_file_load
//!                         │                        │
//!                         ▼                        ▼
//!                 Created/Unchanged/Changed   removed = previous − declared
//!                         │                        │
//!                         └──── changed views ─────┴──► deferred refresh pass
//! ```

mod component;
mod file_scope;
mod hasher;
mod mounted;
mod registry;

pub use component::*;
pub use file_scope::*;
pub use hasher::*;
pub use mounted::*;
pub use registry::*;
