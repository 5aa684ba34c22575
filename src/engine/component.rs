//! View bodies and compiled components.
//!
//! A [`ViewBody`] is what a source unit declares: its serialized source (for
//! fingerprinting), its style sheet and its render functions. Once installed
//! in the registry it becomes a [`Component`], which is cheap to clone and is
//! what lookups hand out.

use std::fmt;
use std::rc::Rc;

use super::hasher::Fingerprint;
use crate::error::RenderError;
use crate::pipeline::Scope;
use crate::style::StyleSheet;
use crate::types::Node;

/// One output of a view. Receives the instantiation scope.
pub type RenderFn = Rc<dyn Fn(&mut Scope<'_>) -> Result<Node, RenderError>>;

// =============================================================================
// ViewBody
// =============================================================================

/// Declared content of a view.
#[derive(Clone)]
pub struct ViewBody {
    source: String,
    styles: Rc<StyleSheet>,
    renders: Vec<RenderFn>,
}

impl ViewBody {
    /// Create a body from its serialized source.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            styles: Rc::new(StyleSheet::new()),
            renders: Vec::new(),
        }
    }

    /// Attach a style sheet.
    pub fn styles(mut self, sheet: StyleSheet) -> Self {
        self.styles = Rc::new(sheet);
        self
    }

    /// Add an output.
    pub fn render(
        mut self,
        render: impl Fn(&mut Scope<'_>) -> Result<Node, RenderError> + 'static,
    ) -> Self {
        self.renders.push(Rc::new(render));
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn style_sheet(&self) -> &Rc<StyleSheet> {
        &self.styles
    }

    pub fn renders(&self) -> &[RenderFn] {
        &self.renders
    }

    /// Number of output elements. Drives root style recipient qualification.
    pub fn output_count(&self) -> usize {
        self.renders.len()
    }
}

impl fmt::Debug for ViewBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewBody")
            .field("source", &self.source)
            .field("styles", &self.styles.len())
            .field("renders", &self.renders.len())
            .finish()
    }
}

// =============================================================================
// Component
// =============================================================================

/// A view body installed under a name.
#[derive(Debug)]
pub struct CompiledView {
    pub name: String,
    pub fingerprint: Fingerprint,
    pub body: ViewBody,
}

/// What a lookup resolves to.
#[derive(Debug, Clone)]
pub enum Component {
    /// A compiled view.
    View(Rc<CompiledView>),
    /// Lookup missed. Renders a diagnostic naming the requested view.
    NotFound(String),
    /// Name was declared twice before the first render.
    DuplicateDefinition(String),
}

impl Component {
    pub(crate) fn compile(name: &str, body: ViewBody) -> Self {
        let fingerprint = Fingerprint::of(body.source());
        Self::View(Rc::new(CompiledView {
            name: name.to_string(),
            fingerprint,
            body,
        }))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::View(view) => &view.name,
            Self::NotFound(name) | Self::DuplicateDefinition(name) => name,
        }
    }

    /// Fingerprint of the compiled body, `None` for placeholders.
    pub fn fingerprint(&self) -> Option<Fingerprint> {
        match self {
            Self::View(view) => Some(view.fingerprint),
            _ => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        !matches!(self, Self::View(_))
    }

    /// Identity comparison: same compiled body, or same placeholder.
    pub fn same_as(&self, other: &Component) -> bool {
        match (self, other) {
            (Self::View(a), Self::View(b)) => Rc::ptr_eq(a, b),
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::DuplicateDefinition(a), Self::DuplicateDefinition(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_fingerprints_source() {
        let body = ViewBody::new("<h1>hi</h1>").render(|scope| Ok(scope.text("hi")));
        assert_eq!(body.output_count(), 1);

        let component = Component::compile("Main", body);
        assert_eq!(component.name(), "Main");
        assert_eq!(component.fingerprint(), Some(Fingerprint::of("<h1>hi</h1>")));
        assert!(!component.is_placeholder());
        assert!(component.same_as(&component.clone()));
    }

    #[test]
    fn test_placeholders() {
        let missing = Component::NotFound("Nope".into());
        assert!(missing.is_placeholder());
        assert_eq!(missing.fingerprint(), None);
        assert!(missing.same_as(&Component::NotFound("Nope".into())));
        assert!(!missing.same_as(&Component::DuplicateDefinition("Nope".into())));
    }
}
