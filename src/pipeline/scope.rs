//! Instantiation scope - What a render function sees.
//!
//! Each view instantiation gets a [`Scope`]: the owning view, its external
//! props, its instance path and a handle back to the runtime. Elements built
//! through the scope have their styles resolved on the spot.
//!
//! ```ignore
//! ViewBody::new(source).render(|scope| {
//!     let title = scope.element("h1", ElementProps::new().named("title"), vec![scope.text("Hi")]);
//!     let list = scope.view("List", ViewProps::new().class("compact"))?;
//!     Ok(scope.element("div", ElementProps::new().named("Main"), vec![title, list]))
//! })
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use crate::engine::{CompiledView, Component, ViewInstance};
use crate::error::RenderError;
use crate::runtime::Runtime;
use crate::style::{body_background, resolve_styles, ElementStyleContext};
use crate::types::{Element, ElementProps, Node, ViewNode, ViewProps};

/// Class on the diagnostic element rendered in place of a broken view.
pub const PLACEHOLDER_CLASS: &str = "spark-views-error";

/// Instances created during one render cycle.
#[derive(Default)]
pub(crate) struct CycleState {
    instances: RefCell<Vec<Rc<ViewInstance>>>,
}

impl CycleState {
    pub(crate) fn into_instances(self) -> Vec<Rc<ViewInstance>> {
        self.instances.into_inner()
    }
}

// =============================================================================
// Scope
// =============================================================================

pub struct Scope<'rt> {
    runtime: &'rt Runtime,
    cycle: &'rt CycleState,
    view: Rc<CompiledView>,
    props: ViewProps,
    path: String,
}

impl<'rt> Scope<'rt> {
    pub fn runtime(&self) -> &'rt Runtime {
        self.runtime
    }

    pub fn view_name(&self) -> &str {
        &self.view.name
    }

    /// External props this instance was created with.
    pub fn props(&self) -> &ViewProps {
        &self.props
    }

    /// Data props, `Value::Null` when none were passed.
    pub fn data(&self) -> &Value {
        &self.props.data
    }

    /// Instance path, e.g. `Main,List,Item.2`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn text(&self, content: impl Into<String>) -> Node {
        Node::text(content)
    }

    /// Build an element with resolved styles.
    ///
    /// The entry view's root style recipient also pushes its background to
    /// the document surface.
    pub fn element(&self, tag: &str, props: ElementProps, children: Vec<Node>) -> Node {
        let name = props.name.clone().unwrap_or_else(|| tag.to_string());
        let cx = ElementStyleContext {
            view_name: &self.view.name,
            tag,
            name: &name,
            props: &props,
            view_props: &self.props,
            output_count: self.view.body.output_count(),
        };
        let style = resolve_styles(self.view.body.style_sheet(), &cx);

        if self.view.name == self.runtime.config().entry && cx.is_root_recipient() {
            let background = style.as_ref().and_then(body_background);
            self.runtime.propagate_body_background(background.as_deref());
        }

        Node::Element(Element {
            tag: tag.to_string(),
            name,
            class: props.class,
            style,
            children,
        })
    }

    /// Instantiate a child view.
    ///
    /// `Parent.Name` sub-views win over plain names. Unless the caller passed
    /// its own, the child receives this view's style sheet as passed styles.
    pub fn view(&self, name: &str, mut props: ViewProps) -> Result<Node, RenderError> {
        let component = self.runtime.get_view(name, Some(self.view.name.as_str()));
        if props.passed_styles.is_none() {
            props.passed_styles = Some(self.view.body.style_sheet().clone());
        }

        let mut path = format!("{},{name}", self.path);
        if let Some(key) = &props.key {
            path.push('.');
            path.push_str(key);
        }

        instantiate(self.runtime, self.cycle, component, props, path)
    }

    /// Read a state value of this instance.
    pub fn state(&self, key: &str) -> Option<Value> {
        self.runtime.state(&self.path, key)
    }

    /// Write a state value of this instance.
    pub fn set_state(&self, key: &str, value: Value) {
        self.runtime.set_state(&self.path, key, value);
    }
}

// =============================================================================
// Instantiation
// =============================================================================

/// Instantiate a component at `path`.
///
/// Placeholders turn into a diagnostic element. A view's output is wrapped in
/// a [`ViewNode`] carrying its path: a single output as is, several as a
/// fragment.
pub(crate) fn instantiate(
    runtime: &Runtime,
    cycle: &CycleState,
    component: Component,
    props: ViewProps,
    path: String,
) -> Result<Node, RenderError> {
    let view = match component {
        Component::View(view) => view,
        Component::NotFound(name) => {
            return Ok(placeholder(&name, format!("View `{name}` not found")));
        }
        Component::DuplicateDefinition(name) => {
            return Ok(placeholder(&name, format!("View `{name}` is defined twice")));
        }
    };

    runtime.record_props(&path, &props.data);
    cycle.instances.borrow_mut().push(ViewInstance::with_props(
        view.name.clone(),
        path.clone(),
        props.clone(),
    ));

    let name = view.name.clone();
    let renders = view.body.renders().to_vec();
    let mut scope = Scope {
        runtime,
        cycle,
        view,
        props,
        path,
    };

    let mut outputs = renders
        .iter()
        .map(|render| render(&mut scope))
        .collect::<Result<Vec<Node>, RenderError>>()?;

    let content = if outputs.len() == 1 {
        outputs.remove(0)
    } else {
        Node::Fragment(outputs)
    };
    Ok(Node::View(ViewNode {
        view: name,
        path: scope.path,
        content: Box::new(content),
    }))
}

fn placeholder(name: &str, message: String) -> Node {
    Node::Element(Element {
        tag: "div".to_string(),
        name: name.to_string(),
        class: Some(PLACEHOLDER_CLASS.to_string()),
        style: None,
        children: vec![Node::Text(message)],
    })
}
