//! Per-element style resolution.
//!
//! Runs once for every element instantiation. Sources are merged from lowest
//! to highest precedence:
//!
//! 1. Tag style (`h1`), parameterized by repeat index
//! 2. Name style (`title`), only when the name differs from the tag
//! 3. Root style (`$`), root style recipients only
//! 4. Styles the parent addressed to this view by name, root style recipients only
//! 5. Class token styles, followed by the static class override
//! 6. The view's own class tokens against the parent's styles, root style recipients only
//! 7. The view's external `style` prop (root style recipients only), then inline style
//!
//! The merged result is passed through [`normalize`](super::shorthand::normalize).

use serde_json::Value;

use super::merge::{merge_map, merge_output};
use super::sheet::StyleSheet;
use super::shorthand::normalize;
use crate::types::{class_tokens, ElementProps, StyleMap, ViewProps};

// =============================================================================
// Element Context
// =============================================================================

/// Transient per-element data used for one style resolution.
#[derive(Debug, Clone, Copy)]
pub struct ElementStyleContext<'a> {
    /// Owning view name.
    pub view_name: &'a str,
    /// Element tag.
    pub tag: &'a str,
    /// Element name (the tag when unnamed).
    pub name: &'a str,
    /// The element's own props.
    pub props: &'a ElementProps,
    /// External props of the owning view.
    pub view_props: &'a ViewProps,
    /// Number of output elements the owning view renders.
    pub output_count: usize,
}

impl ElementStyleContext<'_> {
    /// Whether this element receives the view's root and parent-passed styles.
    ///
    /// Either the element is named after its view and the view renders a
    /// single output, or the element is explicitly flagged as the wrapper.
    /// "Named after" means the view name as declared or fully lowercased.
    pub fn is_root_recipient(&self) -> bool {
        let named_after_view =
            self.name == self.view_name || self.name == self.view_name.to_lowercase();
        (named_after_view && self.output_count <= 1) || self.props.wrapper
    }

    pub fn repeat_index(&self) -> Option<usize> {
        self.props.repeat
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Resolve the final style map for one element.
///
/// Returns `None` when no source contributed anything.
pub fn resolve_styles(sheet: &StyleSheet, cx: &ElementStyleContext<'_>) -> Option<StyleMap> {
    let index = cx.repeat_index();
    let root_recipient = cx.is_root_recipient();
    let passed = if root_recipient {
        cx.view_props.passed_styles.as_deref()
    } else {
        None
    };

    let mut result: Option<StyleMap> = None;

    // 1-2. tag, then name
    merge_output(&mut result, sheet.evaluate_named(cx.tag, index));
    if cx.name != cx.tag {
        merge_output(&mut result, sheet.evaluate_named(cx.name, index));
    }

    // 3-4. root and parent-passed
    if root_recipient {
        merge_output(&mut result, sheet.evaluate_root(index));
    }
    if let Some(parent) = passed {
        merge_output(&mut result, parent.evaluate_named(cx.view_name, None));
    }

    // 5. class tokens
    if let Some(class) = cx.props.class.as_deref() {
        for token in class_tokens(class) {
            let Some(rule) = sheet.named(token) else {
                continue;
            };
            merge_output(&mut result, rule.evaluate(index));

            // static class styles win over whatever set the same keys earlier
            if let (Some(statics), Some(styles)) = (&rule.static_styles, result.as_mut()) {
                for (key, value) in statics {
                    if styles.contains_key(key) {
                        styles.insert(key.clone(), value.clone());
                    }
                }
            }
        }
    }

    // 6. classes on the view itself, looked up in the parent's styles
    if let (Some(parent), Some(class)) = (passed, cx.view_props.class.as_deref()) {
        for token in class_tokens(class) {
            merge_output(&mut result, parent.evaluate_named(token, None));
        }
    }

    // 7. external style prop, then inline
    if root_recipient {
        if let Some(style) = &cx.view_props.style {
            merge_map(&mut result, style);
        }
    }
    if let Some(style) = &cx.props.style {
        merge_map(&mut result, style);
    }

    result.filter(|styles| !styles.is_empty()).map(normalize)
}

/// Background value to propagate to the document body.
///
/// Reads `background`, falling back to `backgroundColor`.
pub fn body_background(styles: &StyleMap) -> Option<String> {
    ["background", "backgroundColor"]
        .iter()
        .find_map(|key| match styles.get(*key) {
            Some(Value::String(value)) if !value.is_empty() => Some(value.clone()),
            _ => None,
        })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::style::sheet::{StyleOutput, StyleRule};
    use crate::types::style_map;
    use serde_json::json;

    fn fixed(value: Value) -> StyleRule {
        StyleRule::fixed(style_map(value))
    }

    fn dynamic(value: Value) -> StyleRule {
        StyleRule::dynamic(Rc::new(move |_: Option<usize>| StyleOutput::from(value.clone())))
    }

    fn context<'a>(
        tag: &'a str,
        name: &'a str,
        props: &'a ElementProps,
        view_props: &'a ViewProps,
    ) -> ElementStyleContext<'a> {
        ElementStyleContext {
            view_name: "Card",
            tag,
            name,
            props,
            view_props,
            output_count: 1,
        }
    }

    #[test]
    fn test_inline_beats_name_beats_tag() {
        let sheet = StyleSheet::new()
            .rule("h1", fixed(json!({ "color": "red", "margin": 0 })))
            .rule("title", fixed(json!({ "color": "blue" })));
        let view_props = ViewProps::default();

        let props = ElementProps::new().named("title");
        let styles = resolve_styles(&sheet, &context("h1", "title", &props, &view_props)).unwrap();
        assert_eq!(styles["color"], json!("blue"));
        assert_eq!(styles["margin"], json!(0));

        let props = ElementProps::new()
            .named("title")
            .style(style_map(json!({ "color": "green" })));
        let styles = resolve_styles(&sheet, &context("h1", "title", &props, &view_props)).unwrap();
        assert_eq!(styles["color"], json!("green"));
    }

    #[test]
    fn test_static_class_overrides_dynamic_name() {
        let sheet = StyleSheet::new()
            .rule("title", dynamic(json!({ "color": "blue" })))
            .rule("c1", fixed(json!({ "color": "black" })));
        let view_props = ViewProps::default();
        let props = ElementProps::new().named("title").class("c1");

        let styles = resolve_styles(&sheet, &context("h1", "title", &props, &view_props)).unwrap();
        assert_eq!(styles["color"], json!("black"));
    }

    #[test]
    fn test_static_part_beats_own_dynamic_part() {
        let rule = dynamic(json!({ "color": "blue", "width": 5 }))
            .with_static(style_map(json!({ "color": "black" })));
        let sheet = StyleSheet::new().rule("c1", rule);
        let view_props = ViewProps::default();
        let props = ElementProps::new().class("c1");

        let styles = resolve_styles(&sheet, &context("div", "div", &props, &view_props)).unwrap();
        assert_eq!(styles["color"], json!("black"));
        assert_eq!(styles["width"], json!(5));
    }

    #[test]
    fn test_uppercase_class_tokens_ignored() {
        let sheet = StyleSheet::new().rule("Big", fixed(json!({ "color": "red" })));
        let view_props = ViewProps::default();
        let props = ElementProps::new().class("Big");

        assert!(resolve_styles(&sheet, &context("div", "div", &props, &view_props)).is_none());
    }

    #[test]
    fn test_root_styles_only_for_recipient() {
        let sheet = StyleSheet::new().rule("$", fixed(json!({ "padding": 4 })));
        let view_props = ViewProps::default();
        let props = ElementProps::new();

        // named after the view, as declared or lowercased
        let styles = resolve_styles(&sheet, &context("div", "card", &props, &view_props)).unwrap();
        assert_eq!(styles["padding"], json!(4));
        assert!(context("div", "Card", &props, &view_props).is_root_recipient());
        assert!(!context("div", "CARD", &props, &view_props).is_root_recipient());
        assert!(!context("div", "cArd", &props, &view_props).is_root_recipient());

        // some other element
        assert!(resolve_styles(&sheet, &context("div", "body", &props, &view_props)).is_none());

        // named after the view, but the view renders two outputs
        let mut cx = context("div", "card", &props, &view_props);
        cx.output_count = 2;
        assert!(!cx.is_root_recipient());
        assert!(resolve_styles(&sheet, &cx).is_none());

        // explicit wrapper flag wins
        let wrapper = ElementProps::new().wrapper();
        let mut cx = context("div", "body", &wrapper, &view_props);
        cx.output_count = 2;
        assert!(resolve_styles(&sheet, &cx).is_some());
    }

    #[test]
    fn test_parent_passed_styles_and_view_classes() {
        let parent = StyleSheet::new()
            .rule("Card", fixed(json!({ "margin": 8, "color": "gray" })))
            .rule("wide", fixed(json!({ "width": 300 })));
        let view_props = ViewProps {
            class: Some("wide".into()),
            style: Some(style_map(json!({ "color": "white" }))),
            passed_styles: Some(Rc::new(parent)),
            ..Default::default()
        };
        let sheet = StyleSheet::new();

        let props = ElementProps::new();
        let styles = resolve_styles(&sheet, &context("div", "card", &props, &view_props)).unwrap();
        assert_eq!(styles["margin"], json!(8));
        assert_eq!(styles["width"], json!(300));
        assert_eq!(styles["color"], json!("white"));

        // non-recipients see none of it
        assert!(resolve_styles(&sheet, &context("span", "span", &props, &view_props)).is_none());
    }

    #[test]
    fn test_inline_beats_external_style_prop() {
        let sheet = StyleSheet::new();
        let view_props = ViewProps {
            style: Some(style_map(json!({ "color": "white", "margin": 2 }))),
            ..Default::default()
        };

        let props = ElementProps::new().style(style_map(json!({ "color": "black" })));
        let styles = resolve_styles(&sheet, &context("div", "card", &props, &view_props)).unwrap();
        assert_eq!(styles["color"], json!("black"));
        assert_eq!(styles["margin"], json!(2));

        // only the root style recipient sees the external prop
        let styles = resolve_styles(&sheet, &context("span", "span", &props, &view_props)).unwrap();
        assert_eq!(styles["color"], json!("black"));
        assert!(!styles.contains_key("margin"));

        let bare = ElementProps::new();
        assert!(resolve_styles(&sheet, &context("span", "span", &bare, &view_props)).is_none());
    }

    #[test]
    fn test_repeat_index_reaches_style_fn() {
        let rule = StyleRule::dynamic(Rc::new(|index: Option<usize>| {
            StyleOutput::from(json!({ "order": index.map_or(-1, |i| i as i64) }))
        }));
        let sheet = StyleSheet::new().rule("li", rule);
        let view_props = ViewProps::default();

        let props = ElementProps::new().repeat(3);
        let styles = resolve_styles(&sheet, &context("li", "li", &props, &view_props)).unwrap();
        assert_eq!(styles["order"], json!(3));
    }

    #[test]
    fn test_result_is_normalized() {
        let sheet = StyleSheet::new().rule("div", fixed(json!({ "position": [1, 2, 3, 4] })));
        let view_props = ViewProps::default();
        let props = ElementProps::new();

        let styles = resolve_styles(&sheet, &context("div", "div", &props, &view_props)).unwrap();
        assert_eq!(styles["position"], json!("absolute"));
        assert_eq!(styles["left"], json!(4));
    }

    #[test]
    fn test_body_background() {
        assert_eq!(
            body_background(&style_map(json!({ "backgroundColor": "#000" }))),
            Some("#000".to_string())
        );
        assert_eq!(
            body_background(&style_map(json!({ "background": "red", "backgroundColor": "#000" }))),
            Some("red".to_string())
        );
        assert_eq!(body_background(&style_map(json!({ "color": "red" }))), None);
    }
}
