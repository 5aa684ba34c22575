//! State Module - Runtime notifications and tooling state
//!
//! - **Events** - `AfterRender` / `ViewLoaded` subscriptions with cleanup handles
//! - **Inspector** - Per-instance props and state cache, watched-path notifications

mod events;
mod inspector;

pub use events::*;
pub use inspector::*;
