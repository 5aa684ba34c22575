//! Error Recovery Controller.
//!
//! When a render fails the error is handed to the configured
//! [`ErrorReporter`] and the registry is restored from the last snapshot
//! that rendered cleanly:
//!
//! ```text
//! render() ──Err──► report(error) ──► rollback(last_working) ──► next render uses old bodies
//! ```

use std::error::Error;

use tracing::{error, warn};

use crate::engine::RegistrySnapshot;
use crate::error::{ErrorContext, RenderError};
use crate::runtime::Runtime;

use super::render::RenderOutcome;

/// Receives every error the runtime reports.
pub trait ErrorReporter {
    fn report(&self, error: &dyn Error, context: &ErrorContext);
}

impl<F> ErrorReporter for F
where
    F: Fn(&dyn Error, &ErrorContext),
{
    fn report(&self, error: &dyn Error, context: &ErrorContext) {
        self(error, context)
    }
}

/// Default reporter: logs through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, err: &dyn Error, context: &ErrorContext) {
        error!(
            phase = ?context.phase,
            view = ?context.view,
            file = ?context.file,
            "{err}"
        );
    }
}

impl Runtime {
    /// Replace every live registry entry with its snapshot counterpart.
    ///
    /// Entries the snapshot does not know are removed.
    pub fn rollback(&self, snapshot: &RegistrySnapshot) {
        self.registry.borrow_mut().restore_from(snapshot);
        warn!(views = snapshot.len(), "registry rolled back");
    }

    /// Registry state as of the last clean render.
    pub fn last_working_snapshot(&self) -> RegistrySnapshot {
        self.last_working.borrow().clone()
    }

    /// Report a render failure and roll back to the last working snapshot.
    pub fn recover(&self, error: &RenderError) {
        self.report(error, &ErrorContext::render(error.view()));
        let snapshot = self.last_working_snapshot();
        self.rollback(&snapshot);
    }

    /// [`render`](Runtime::render), recovering from failure before returning it.
    pub fn render_supervised(&self) -> Result<RenderOutcome, RenderError> {
        self.render().inspect_err(|err| self.recover(err))
    }
}
