//! Error types for spark-views.
//!
//! Failures fall into two classes with different propagation:
//!
//! - [`ViewError`] - registry mutation failures. Local to the offending view:
//!   the view is replaced with a visible placeholder, other views keep loading.
//! - [`RenderError`] - anything thrown while instantiating the output tree or
//!   resolving styles. Process-wide: reported, then the registry rolls back to
//!   the last snapshot that rendered cleanly.
//!
//! Render storms are not errors. A cycle past the depth limit returns
//! [`RenderOutcome::Aborted`](crate::pipeline::RenderOutcome::Aborted).

use thiserror::Error;

/// Registry mutation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    /// Same name declared twice before the first render.
    #[error("view `{name}` is defined twice")]
    DuplicateView {
        /// The duplicated view name.
        name: String,
    },
}

/// Output sink failure.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Writing to the underlying device failed.
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure while instantiating or committing the output tree.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A view body returned an error.
    #[error("runtime error in view `{view}`: {message}")]
    Runtime {
        /// View whose body failed.
        view: String,
        /// Error description.
        message: String,
    },

    /// A view body or style function panicked.
    #[error("view panicked: {message}")]
    Panicked {
        /// Panic payload, if it was a string.
        message: String,
    },

    /// The output sink rejected the tree.
    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl RenderError {
    /// Create a runtime error attributed to a view.
    pub fn runtime(view: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Runtime {
            view: view.into(),
            message: message.into(),
        }
    }

    /// View the error is attributed to, if known.
    pub fn view(&self) -> Option<&str> {
        match self {
            Self::Runtime { view, .. } => Some(view),
            _ => None,
        }
    }
}

// =============================================================================
// Error Context
// =============================================================================

/// Where an error surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPhase {
    /// While declaring a view during file load.
    Declare,
    /// While running a render cycle.
    Render,
}

/// Context handed to the error reporter alongside the error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    pub phase: ErrorPhase,
    pub view: Option<String>,
    pub file: Option<String>,
}

impl ErrorContext {
    pub fn declare(view: &str, file: Option<&str>) -> Self {
        Self {
            phase: ErrorPhase::Declare,
            view: Some(view.to_string()),
            file: file.map(str::to_string),
        }
    }

    pub fn render(view: Option<&str>) -> Self {
        Self {
            phase: ErrorPhase::Render,
            view: view.map(str::to_string),
            file: None,
        }
    }
}
