//! Core types for spark-views.
//!
//! These types define the foundation that everything builds on.
//! View bodies produce [`Node`] trees, the style engine fills in each
//! element's resolved [`StyleMap`], and output sinks consume the finished tree.

use std::rc::Rc;

use serde_json::Value;

use crate::style::StyleSheet;

// =============================================================================
// Style Map
// =============================================================================

/// A flat style object: property name to value.
///
/// Backed by an insertion-ordered JSON object, so iteration follows
/// declaration order (`transform` tokens rely on this).
pub type StyleMap = serde_json::Map<String, Value>;

/// Cleanup function returned by subscriptions.
///
/// Call this to unsubscribe and release the handler.
pub type Cleanup = Box<dyn FnOnce()>;

// =============================================================================
// Output Tree
// =============================================================================

/// One node of an instantiated output tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A styled element.
    Element(Element),
    /// Raw text content.
    Text(String),
    /// Several sibling nodes without a wrapper (views with more than one output).
    Fragment(Vec<Node>),
    /// Output of one view instance. Transparent when serialized.
    View(ViewNode),
}

impl Node {
    /// Create a text node.
    pub fn text(content: impl Into<String>) -> Self {
        Node::Text(content.into())
    }

    /// Get the element if this node is one.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Concatenated text content of this node and all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => {
                for child in &element.children {
                    child.collect_text(out);
                }
            }
            Node::Fragment(nodes) => {
                for node in nodes {
                    node.collect_text(out);
                }
            }
            Node::View(view) => view.content.collect_text(out),
        }
    }

    /// Depth-first search for the first element with the given name.
    pub fn find(&self, name: &str) -> Option<&Element> {
        match self {
            Node::Text(_) => None,
            Node::Element(element) => {
                if element.name == name {
                    return Some(element);
                }
                element.children.iter().find_map(|child| child.find(name))
            }
            Node::Fragment(nodes) => nodes.iter().find_map(|node| node.find(name)),
            Node::View(view) => view.content.find(name),
        }
    }

    /// Find the output of the view instance at `path`.
    pub fn find_view(&self, path: &str) -> Option<&ViewNode> {
        match self {
            Node::Text(_) => None,
            Node::View(view) if view.path == path => Some(view),
            Node::View(view) => view.content.find_view(path),
            Node::Element(element) => element.children.iter().find_map(|child| child.find_view(path)),
            Node::Fragment(nodes) => nodes.iter().find_map(|node| node.find_view(path)),
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

/// An instantiated element with its resolved styles.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    /// Tag name (`div`, `h1`, ...).
    pub tag: String,
    /// Declared name. Equals the tag when the element was not named.
    pub name: String,
    /// Class attribute as given.
    pub class: Option<String>,
    /// Final normalized styles, `None` when nothing applied.
    pub style: Option<StyleMap>,
    /// Child nodes.
    pub children: Vec<Node>,
}

/// The output of one view instance, addressed by its instance path.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewNode {
    /// Registry name of the view.
    pub view: String,
    /// Instance path, e.g. `Main,List,Item.2`.
    pub path: String,
    /// What the view rendered.
    pub content: Box<Node>,
}

// =============================================================================
// Props
// =============================================================================

/// Properties of a single element, as written in a view body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementProps {
    /// Element name (`<title-h1>` has name `title`, tag `h1`).
    pub name: Option<String>,
    /// Space-separated class tokens.
    pub class: Option<String>,
    /// Inline style. Wins over every other source.
    pub style: Option<StyleMap>,
    /// Explicitly flagged as the view's wrapper element.
    pub wrapper: bool,
    /// Position inside a repeated list, passed to parameterized styles.
    pub repeat: Option<usize>,
}

impl ElementProps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn style(mut self, style: StyleMap) -> Self {
        self.style = Some(style);
        self
    }

    pub fn wrapper(mut self) -> Self {
        self.wrapper = true;
        self
    }

    pub fn repeat(mut self, index: usize) -> Self {
        self.repeat = Some(index);
        self
    }
}

/// External props a parent hands to a child view.
#[derive(Debug, Clone, Default)]
pub struct ViewProps {
    /// Instance key, appended to the instance path (`Main,Item.3`).
    pub key: Option<String>,
    /// Class tokens on the view itself, resolved against the parent's styles.
    pub class: Option<String>,
    /// Explicit style for the view's root style recipient.
    pub style: Option<StyleMap>,
    /// Style sheet of the parent view, for styles addressed to this view.
    pub passed_styles: Option<Rc<StyleSheet>>,
    /// Arbitrary data props.
    pub data: Value,
}

impl ViewProps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn style(mut self, style: StyleMap) -> Self {
        self.style = Some(style);
        self
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}

/// Class tokens eligible for style lookup.
///
/// Tokens starting with an uppercase letter address views, not styles, and are skipped.
pub fn class_tokens(class: &str) -> impl Iterator<Item = &str> {
    class
        .split_whitespace()
        .filter(|token| token.chars().next().is_some_and(|c| !c.is_uppercase()))
}

/// Build a [`StyleMap`] from a JSON object literal.
///
/// Non-object values produce an empty map.
pub fn style_map(value: Value) -> StyleMap {
    match value {
        Value::Object(map) => map,
        _ => StyleMap::new(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_class_tokens_skip_uppercase() {
        let tokens: Vec<_> = class_tokens("big  Child red-1 Other").collect();
        assert_eq!(tokens, vec!["big", "red-1"]);
    }

    #[test]
    fn test_text_content_and_find() {
        let tree = Node::Element(Element {
            tag: "div".into(),
            name: "main".into(),
            children: vec![
                Node::text("a"),
                Node::Fragment(vec![Node::Element(Element {
                    tag: "h1".into(),
                    name: "title".into(),
                    children: vec![Node::text("b")],
                    ..Default::default()
                })]),
            ],
            ..Default::default()
        });

        assert_eq!(tree.text_content(), "ab");
        assert_eq!(tree.find("title").map(|e| e.tag.as_str()), Some("h1"));
        assert!(tree.find("missing").is_none());
    }

    #[test]
    fn test_find_view_by_path() {
        let card = Node::View(ViewNode {
            view: "Card".into(),
            path: "Main,Card.1".into(),
            content: Box::new(Node::text("c")),
        });
        let tree = Node::View(ViewNode {
            view: "Main".into(),
            path: "Main".into(),
            content: Box::new(Node::Fragment(vec![Node::text("m"), card])),
        });

        assert_eq!(tree.text_content(), "mc");
        assert_eq!(tree.find_view("Main,Card.1").map(|v| v.view.as_str()), Some("Card"));
        assert_eq!(tree.find_view("Main").map(|v| v.view.as_str()), Some("Main"));
        assert!(tree.find_view("Main,Card").is_none());
    }

    #[test]
    fn test_style_map_from_json() {
        let map = style_map(json!({ "color": "red", "width": 10 }));
        assert_eq!(map.len(), 2);
        assert!(style_map(json!([1, 2])).is_empty());
    }
}
