//! Style sheets - per-view style sources keyed by selector.
//!
//! A view declares its styles as rules under selector keys:
//!
//! - `$` - the root selector, applied to the view's root style recipient
//! - a tag name (`h1`), an element name (`title`) or a class token (`big`)
//! - a child view name (`Card`), addressed to that child from the parent
//!
//! Each rule has an optional static part and an optional dynamic part. The
//! dynamic part receives the repeat index so one selector can vary across a
//! repeated list.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use serde_json::json;
//! use spark_views::style::{StyleSheet, StyleRule, StyleOutput};
//! use spark_views::style_map;
//!
//! let sheet = StyleSheet::new()
//!     .rule("$", StyleRule::fixed(style_map(json!({ "padding": 10 }))))
//!     .rule("li", StyleRule::dynamic(Rc::new(|index: Option<usize>| {
//!         let shade = if index.unwrap_or(0) % 2 == 0 { "white" } else { "gray" };
//!         StyleOutput::from(json!({ "background": shade }))
//!     })));
//!
//! assert_eq!(sheet.len(), 2);
//! ```

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::types::StyleMap;

// =============================================================================
// StyleOutput - What a style function produces
// =============================================================================

/// Result of evaluating a style source.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum StyleOutput {
    /// Nothing to apply.
    #[default]
    Absent,
    /// A concrete style object.
    Map(StyleMap),
    /// A sequence of outputs, merged left to right.
    List(Vec<StyleOutput>),
}

impl StyleOutput {
    /// Check if this output contributes nothing.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl From<StyleMap> for StyleOutput {
    fn from(map: StyleMap) -> Self {
        Self::Map(map)
    }
}

impl From<Option<StyleMap>> for StyleOutput {
    fn from(map: Option<StyleMap>) -> Self {
        map.map_or(Self::Absent, Self::Map)
    }
}

/// Objects become maps, arrays become lists, anything else is absent.
impl From<Value> for StyleOutput {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Map(map),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            _ => Self::Absent,
        }
    }
}

impl From<Vec<StyleOutput>> for StyleOutput {
    fn from(items: Vec<StyleOutput>) -> Self {
        Self::List(items)
    }
}

/// Parameterized style source. Receives the repeat index, if any.
pub type StyleFn = Rc<dyn Fn(Option<usize>) -> StyleOutput>;

// =============================================================================
// SelectorKey
// =============================================================================

/// Key a style rule is declared under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SelectorKey {
    /// The distinguished root selector (`$`).
    Root,
    /// Tag, element name, class token or child view name.
    Named(String),
}

impl SelectorKey {
    /// Prefix that marks the root selector.
    pub const ROOT_PREFIX: &'static str = "$";

    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Root => Self::ROOT_PREFIX,
            Self::Named(name) => name,
        }
    }
}

/// `"$"` is the root selector, anything else is named.
impl From<&str> for SelectorKey {
    fn from(key: &str) -> Self {
        if key == Self::ROOT_PREFIX {
            Self::Root
        } else {
            Self::Named(key.to_string())
        }
    }
}

impl fmt::Display for SelectorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// StyleRule
// =============================================================================

/// Styles declared under one selector.
///
/// The static part is also used by the class override pass: when a class
/// token matches, its static keys replace keys already set by earlier stages.
#[derive(Clone, Default)]
pub struct StyleRule {
    pub static_styles: Option<StyleMap>,
    pub dynamic: Option<StyleFn>,
}

impl StyleRule {
    /// Rule with only static styles.
    pub fn fixed(styles: StyleMap) -> Self {
        Self {
            static_styles: Some(styles),
            dynamic: None,
        }
    }

    /// Rule with only a parameterized style function.
    pub fn dynamic(style_fn: StyleFn) -> Self {
        Self {
            static_styles: None,
            dynamic: Some(style_fn),
        }
    }

    /// Add a static part to this rule.
    pub fn with_static(mut self, styles: StyleMap) -> Self {
        self.static_styles = Some(styles);
        self
    }

    /// Evaluate the rule. Dynamic styles land after static ones.
    pub fn evaluate(&self, index: Option<usize>) -> StyleOutput {
        match (&self.static_styles, &self.dynamic) {
            (None, None) => StyleOutput::Absent,
            (Some(styles), None) => StyleOutput::Map(styles.clone()),
            (None, Some(style_fn)) => style_fn(index),
            (Some(styles), Some(style_fn)) => {
                StyleOutput::List(vec![StyleOutput::Map(styles.clone()), style_fn(index)])
            }
        }
    }
}

impl fmt::Debug for StyleRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleRule")
            .field("static_styles", &self.static_styles)
            .field("dynamic", &self.dynamic.is_some())
            .finish()
    }
}

// =============================================================================
// StyleSheet
// =============================================================================

/// All style rules of one view, in declaration order.
#[derive(Clone, Default, Debug)]
pub struct StyleSheet {
    rules: IndexMap<SelectorKey, StyleRule>,
}

impl StyleSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn rule(mut self, key: impl Into<SelectorKey>, rule: StyleRule) -> Self {
        self.insert(key, rule);
        self
    }

    /// Insert or replace a rule.
    pub fn insert(&mut self, key: impl Into<SelectorKey>, rule: StyleRule) {
        self.rules.insert(key.into(), rule);
    }

    /// Get the rule under a key.
    pub fn get(&self, key: &SelectorKey) -> Option<&StyleRule> {
        self.rules.get(key)
    }

    /// Get the rule under a named selector.
    pub fn named(&self, name: &str) -> Option<&StyleRule> {
        self.rules.get(&SelectorKey::named(name))
    }

    /// Get the root rule.
    pub fn root(&self) -> Option<&StyleRule> {
        self.rules.get(&SelectorKey::Root)
    }

    /// Evaluate a named selector, absent when undeclared.
    pub fn evaluate_named(&self, name: &str, index: Option<usize>) -> StyleOutput {
        self.named(name)
            .map_or(StyleOutput::Absent, |rule| rule.evaluate(index))
    }

    /// Evaluate the root selector, absent when undeclared.
    pub fn evaluate_root(&self, index: Option<usize>) -> StyleOutput {
        self.root()
            .map_or(StyleOutput::Absent, |rule| rule.evaluate(index))
    }

    pub fn keys(&self) -> impl Iterator<Item = &SelectorKey> {
        self.rules.keys()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::style_map;
    use serde_json::json;

    #[test]
    fn test_selector_key_from_str() {
        assert_eq!(SelectorKey::from("$"), SelectorKey::Root);
        assert_eq!(SelectorKey::from("h1"), SelectorKey::named("h1"));
        assert_eq!(SelectorKey::Root.to_string(), "$");
    }

    #[test]
    fn test_output_from_value() {
        let output = StyleOutput::from(json!([{ "color": "red" }, null, [{ "width": 1 }]]));
        let StyleOutput::List(items) = output else {
            panic!("expected list");
        };
        assert_eq!(items.len(), 3);
        assert!(items[1].is_absent());
        assert!(matches!(items[2], StyleOutput::List(_)));
    }

    #[test]
    fn test_rule_evaluation() {
        let fixed = StyleRule::fixed(style_map(json!({ "color": "red" })));
        assert_eq!(
            fixed.evaluate(None),
            StyleOutput::Map(style_map(json!({ "color": "red" })))
        );

        let dynamic = StyleRule::dynamic(Rc::new(|index: Option<usize>| {
            StyleOutput::from(json!({ "order": index.unwrap_or(99) }))
        }));
        assert_eq!(
            dynamic.evaluate(Some(2)),
            StyleOutput::Map(style_map(json!({ "order": 2 })))
        );

        let both = dynamic.with_static(style_map(json!({ "color": "red" })));
        assert!(matches!(both.evaluate(None), StyleOutput::List(ref items) if items.len() == 2));

        assert!(StyleRule::default().evaluate(None).is_absent());
    }

    #[test]
    fn test_sheet_lookup() {
        let sheet = StyleSheet::new()
            .rule("$", StyleRule::fixed(style_map(json!({ "padding": 1 }))))
            .rule("title", StyleRule::fixed(style_map(json!({ "color": "blue" }))));

        assert!(sheet.root().is_some());
        assert!(sheet.named("title").is_some());
        assert!(sheet.named("$").is_none());
        assert!(sheet.evaluate_named("missing", None).is_absent());
        assert_eq!(
            sheet.keys().map(SelectorKey::as_str).collect::<Vec<_>>(),
            vec!["$", "title"]
        );
    }
}
