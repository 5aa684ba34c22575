//! Output Sinks - Where a committed tree goes.
//!
//! Two flavors:
//!
//! - **Serialize** - the tree becomes an HTML string, published through a
//!   reactive signal. Used for server-side output and for tests.
//! - **Mount** - the tree is handed to a [`MountSink`] together with a
//!   [`MountTarget`]. [`TerminalMount`] draws a text outline with crossterm.
//!
//! # Example
//!
//! ```ignore
//! use spark_views::pipeline::{MountTarget, TerminalMount};
//!
//! let runtime = Runtime::new(config)
//!     .with_mount(TerminalMount::stdout(), MountTarget::new("app"));
//! runtime.render()?;
//! ```

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use crossterm::cursor::{MoveTo, MoveToNextLine};
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use heck::ToKebabCase;
use serde_json::Value;
use spark_signals::{signal, Signal};

use crate::error::SinkError;
use crate::style::shorthand::format_number;
use crate::types::{Element, Node, StyleMap};

// =============================================================================
// Targets and Commits
// =============================================================================

/// Opaque handle naming where a mounted tree lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MountTarget(String);

impl MountTarget {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

/// What a committed render produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Commit {
    /// The serialized output string.
    Serialized(String),
    /// The tree was mounted into this target.
    Mounted(MountTarget),
}

/// Host document hooks. Receives the entry view's root background.
pub trait DocumentSurface {
    fn set_body_background(&mut self, background: Option<&str>);
}

/// Interactive output device.
pub trait MountSink {
    /// Replace whatever `target` shows with `tree`.
    fn mount(&mut self, tree: &Node, target: &MountTarget) -> Result<(), SinkError>;
}

/// Shared sinks, so the application keeps a handle to the device it mounted.
impl<S: MountSink + ?Sized> MountSink for Rc<RefCell<S>> {
    fn mount(&mut self, tree: &Node, target: &MountTarget) -> Result<(), SinkError> {
        self.borrow_mut().mount(tree, target)
    }
}

// =============================================================================
// Output Sink
// =============================================================================

/// The configured output of a runtime.
pub enum OutputSink {
    Serialize(StringSink),
    Mount {
        sink: Box<dyn MountSink>,
        target: MountTarget,
    },
}

impl OutputSink {
    pub fn commit(&mut self, tree: &Node) -> Result<Commit, SinkError> {
        match self {
            OutputSink::Serialize(sink) => Ok(Commit::Serialized(sink.commit(tree))),
            OutputSink::Mount { sink, target } => {
                sink.mount(tree, target)?;
                Ok(Commit::Mounted(target.clone()))
            }
        }
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self, OutputSink::Mount { .. })
    }
}

impl Default for OutputSink {
    fn default() -> Self {
        OutputSink::Serialize(StringSink::new())
    }
}

/// Serializing sink. The latest output is a reactive signal.
pub struct StringSink {
    output: Signal<Option<String>>,
}

impl StringSink {
    pub fn new() -> Self {
        Self {
            output: signal(None),
        }
    }

    /// Signal holding the most recent output.
    pub fn output(&self) -> Signal<Option<String>> {
        self.output.clone()
    }

    pub fn latest(&self) -> Option<String> {
        self.output.get()
    }

    fn commit(&self, tree: &Node) -> String {
        let html = render_to_string(tree);
        self.output.set(Some(html.clone()));
        html
    }
}

impl Default for StringSink {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Serialization
// =============================================================================

/// Serialize a tree to HTML.
///
/// Style keys are kebab-cased. Nested blocks (pseudo states, `@` rules) have
/// no inline form and are skipped.
pub fn render_to_string(tree: &Node) -> String {
    let mut out = String::new();
    write_node(tree, &mut out);
    out
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => escape_into(text, false, out),
        Node::Fragment(nodes) => nodes.iter().for_each(|node| write_node(node, out)),
        Node::Element(element) => write_element(element, out),
        Node::View(view) => write_node(&view.content, out),
    }
}

fn write_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.tag);
    if let Some(class) = &element.class {
        out.push_str(" class=\"");
        escape_into(class, true, out);
        out.push('"');
    }
    if let Some(css) = element.style.as_ref().and_then(inline_css) {
        out.push_str(" style=\"");
        escape_into(&css, true, out);
        out.push('"');
    }
    out.push('>');
    for child in &element.children {
        write_node(child, out);
    }
    out.push_str("</");
    out.push_str(&element.tag);
    out.push('>');
}

fn inline_css(style: &StyleMap) -> Option<String> {
    let declarations: Vec<String> = style
        .iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::String(text) => text.clone(),
                Value::Number(number) => format_number(number),
                _ => return None,
            };
            Some(format!("{}: {value}", key.to_kebab_case()))
        })
        .collect();

    (!declarations.is_empty()).then(|| declarations.join("; "))
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
}

// =============================================================================
// Terminal Mount
// =============================================================================

/// Draws each committed tree as an indented text outline.
pub struct TerminalMount<W: Write> {
    out: W,
    frames: usize,
}

impl TerminalMount<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalMount<W> {
    pub fn new(out: W) -> Self {
        Self { out, frames: 0 }
    }

    /// Number of frames drawn so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> MountSink for TerminalMount<W> {
    fn mount(&mut self, tree: &Node, _target: &MountTarget) -> Result<(), SinkError> {
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        for line in outline(tree) {
            queue!(self.out, Print(line), MoveToNextLine(1))?;
        }
        self.out.flush()?;
        self.frames += 1;
        Ok(())
    }
}

/// Text lines, indented two spaces per element level.
fn outline(tree: &Node) -> Vec<String> {
    fn walk(node: &Node, depth: usize, lines: &mut Vec<String>) {
        match node {
            Node::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    lines.push(format!("{}{text}", "  ".repeat(depth)));
                }
            }
            Node::Fragment(nodes) => nodes.iter().for_each(|node| walk(node, depth, lines)),
            Node::View(view) => walk(&view.content, depth, lines),
            Node::Element(element) => element
                .children
                .iter()
                .for_each(|child| walk(child, depth + 1, lines)),
        }
    }

    let mut lines = Vec::new();
    walk(tree, 0, &mut lines);
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{style_map, ViewNode};
    use serde_json::json;

    fn element(tag: &str, style: Option<StyleMap>, children: Vec<Node>) -> Node {
        Node::Element(Element {
            tag: tag.into(),
            name: tag.into(),
            class: None,
            style,
            children,
        })
    }

    #[test]
    fn test_render_to_string_escapes_and_kebabs() {
        let tree = element(
            "div",
            Some(style_map(json!({
                "backgroundColor": "red",
                "fontSize": 1.0,
                ":hover": { "color": "blue" }
            }))),
            vec![Node::text("a < b & \"c\"")],
        );

        assert_eq!(
            render_to_string(&tree),
            "<div style=\"background-color: red; font-size: 1\">a &lt; b &amp; \"c\"</div>"
        );
    }

    #[test]
    fn test_fragment_serializes_siblings() {
        let tree = Node::Fragment(vec![
            element("h1", None, vec![Node::text("one")]),
            element("p", None, vec![Node::text("two")]),
        ]);
        assert_eq!(render_to_string(&tree), "<h1>one</h1><p>two</p>");
    }

    #[test]
    fn test_string_sink_publishes_signal() {
        let mut sink = OutputSink::default();
        let output = match &sink {
            OutputSink::Serialize(inner) => inner.output(),
            OutputSink::Mount { .. } => unreachable!(),
        };
        assert_eq!(output.get(), None);

        let commit = sink.commit(&element("p", None, vec![])).unwrap();
        assert_eq!(commit, Commit::Serialized("<p></p>".into()));
        assert_eq!(output.get(), Some("<p></p>".into()));
        assert!(!sink.is_interactive());
    }

    #[test]
    fn test_terminal_mount_outline() {
        let tree = element(
            "div",
            None,
            vec![
                Node::text("Title"),
                element("ul", None, vec![element("li", None, vec![Node::text("one")])]),
            ],
        );
        assert_eq!(outline(&tree), vec!["  Title", "      one"]);

        let mut mount = TerminalMount::new(Vec::new());
        mount.mount(&tree, &MountTarget::new("app")).unwrap();
        assert_eq!(mount.frames(), 1);
        let written = String::from_utf8(mount.into_inner()).unwrap();
        assert!(written.contains("Title"));
        assert!(written.contains("one"));
    }

    #[test]
    fn test_shared_mount_and_view_nodes() {
        let shared = Rc::new(RefCell::new(TerminalMount::new(Vec::new())));
        let mut sink = OutputSink::Mount {
            sink: Box::new(shared.clone()),
            target: MountTarget::new("app"),
        };
        let tree = Node::View(ViewNode {
            view: "Main".into(),
            path: "Main".into(),
            content: Box::new(element("p", None, vec![Node::text("hi")])),
        });

        assert_eq!(sink.commit(&tree).unwrap(), Commit::Mounted(MountTarget::new("app")));
        assert!(sink.is_interactive());
        assert_eq!(shared.borrow().frames(), 1);
        assert_eq!(render_to_string(&tree), "<p>hi</p>");
    }
}
