//! Shorthand normalization.
//!
//! Applied once to every resolved style map:
//!
//! | Input | Output |
//! |-------|--------|
//! | `position: [t, r, b, l]` | `position: "absolute"`, `top`, `right`, `bottom`, `left` |
//! | `background: {r, g, b, a}` / `[r, g, b, a]` | `"rgba(r, g, b, a)"` |
//! | `background: {r, g, b}` / `[r, g, b]` | `"rgb(r, g, b)"` |
//! | `hover: {...}` (any pseudo state) | `":hover": {...}` |
//! | `"@media ...": { padding: [1, 2] }` | `"@media ...": { padding: "1px 2px" }` |
//! | `margin: [1, "auto"]` | `margin: "1px auto"` |
//! | `transform: { x: 5, rotate: "10deg" }` | `transform: "translateX(5px) rotate(10deg)"` |

use serde_json::{Map, Number, Value};

use crate::types::StyleMap;

/// Pseudo-state keys and the selector they are re-keyed to.
const PSEUDO_STATES: [(&str, &str); 9] = [
    ("active", ":active"),
    ("hover", ":hover"),
    ("focus", ":focus"),
    ("link", ":link"),
    ("visited", ":visited"),
    ("checked", ":checked"),
    ("disabled", ":disabled"),
    ("empty", ":empty"),
    ("invalid", ":invalid"),
];

/// Transform shorthand keys and their function names.
const TRANSFORM_FUNCTIONS: [(&str, &str); 3] =
    [("x", "translateX"), ("y", "translateY"), ("z", "translateZ")];

fn pseudo_selector(key: &str) -> Option<&'static str> {
    PSEUDO_STATES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, selector)| *selector)
}

fn transform_function(key: &str) -> Option<&'static str> {
    TRANSFORM_FUNCTIONS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, function)| *function)
}

// =============================================================================
// Normalize
// =============================================================================

/// Expand all shorthands in a resolved style map.
pub fn normalize(mut styles: StyleMap) -> StyleMap {
    expand_position(&mut styles);
    collapse_background(&mut styles);

    let mut out = StyleMap::new();
    for (key, value) in styles {
        if key.starts_with('@') {
            out.insert(key, join_block_sequences(value));
            continue;
        }
        if let Some(selector) = pseudo_selector(&key) {
            if value.is_object() {
                out.insert(selector.to_string(), value);
                continue;
            }
        }
        match value {
            Value::Array(items) => out.insert(key, Value::String(join_sequence(&items))),
            other => out.insert(key, other),
        };
    }

    if let Some(Value::Object(transform)) = out.get("transform") {
        let joined = transform_string(transform);
        out.insert("transform".to_string(), Value::String(joined));
    }

    out
}

/// `position: [top, right, bottom, left]` becomes absolute positioning.
fn expand_position(styles: &mut StyleMap) {
    let sides = match styles.get("position") {
        Some(Value::Array(items)) if items.len() == 4 => items.clone(),
        _ => return,
    };

    styles.insert("position".to_string(), Value::from("absolute"));
    for (side, value) in ["top", "right", "bottom", "left"].into_iter().zip(sides) {
        styles.insert(side.to_string(), value);
    }
}

/// Color objects and 3/4-element sequences become `rgb()`/`rgba()` strings.
fn collapse_background(styles: &mut StyleMap) {
    let color = match styles.get("background") {
        Some(Value::Array(channels)) if channels.len() == 4 => format!(
            "rgba({}, {}, {}, {})",
            format_value(&channels[0]),
            format_value(&channels[1]),
            format_value(&channels[2]),
            format_value(&channels[3]),
        ),
        Some(Value::Array(channels)) if channels.len() == 3 => format!(
            "rgb({}, {}, {})",
            format_value(&channels[0]),
            format_value(&channels[1]),
            format_value(&channels[2]),
        ),
        Some(Value::Object(channels)) => {
            let channel = |name: &str| channels.get(name).map_or_else(String::new, format_value);
            match channels.get("a") {
                Some(alpha) if is_truthy(alpha) => format!(
                    "rgba({}, {}, {}, {})",
                    channel("r"),
                    channel("g"),
                    channel("b"),
                    channel("a"),
                ),
                _ => format!("rgb({}, {}, {})", channel("r"), channel("g"), channel("b")),
            }
        }
        _ => return,
    };

    styles.insert("background".to_string(), Value::String(color));
}

/// Inside `@` blocks, sequence values become space-joined strings.
fn join_block_sequences(block: Value) -> Value {
    match block {
        Value::Object(entries) => Value::Object(
            entries
                .into_iter()
                .map(|(key, value)| match value {
                    Value::Array(items) => (key, Value::String(join_sequence(&items))),
                    other => (key, other),
                })
                .collect(),
        ),
        other => other,
    }
}

fn transform_string(transform: &Map<String, Value>) -> String {
    transform
        .iter()
        .map(|(key, value)| {
            let (function, unit) = match transform_function(key) {
                Some(function) => (function, if value.is_number() { "px" } else { "" }),
                None => (key.as_str(), ""),
            };
            format!("{function}({}{unit})", format_value(value))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// =============================================================================
// Value Formatting
// =============================================================================

/// Space-join a sequence, giving numbers a pixel unit.
fn join_sequence(items: &[Value]) -> String {
    items
        .iter()
        .map(|item| match item {
            Value::Number(number) => format!("{}px", format_number(number)),
            other => format_value(other),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => format_number(number),
        other => other.to_string(),
    }
}

/// Magnitude past which a whole float no longer fits an `i64`.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// Whole floats print without a fractional part (`1.0` → `1`).
pub(crate) fn format_number(number: &Number) -> String {
    if let Some(int) = number.as_i64() {
        return int.to_string();
    }
    if let Some(uint) = number.as_u64() {
        return uint.to_string();
    }
    match number.as_f64() {
        Some(float) if float.fract() == 0.0 && float.abs() < I64_LIMIT => {
            format!("{}", float as i64)
        }
        Some(float) => format!("{float}"),
        None => number.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        _ => true,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::style_map;
    use proptest::prelude::*;
    use serde_json::json;

    fn norm(value: Value) -> StyleMap {
        normalize(style_map(value))
    }

    #[test]
    fn test_position_expands() {
        assert_eq!(
            norm(json!({ "position": [10, 20, 30, 40] })),
            style_map(json!({
                "position": "absolute", "top": 10, "right": 20, "bottom": 30, "left": 40
            }))
        );
    }

    #[test]
    fn test_position_keeps_declaration_slot() {
        let styles = norm(json!({ "color": "red", "position": [0, 0, 0, 0] }));
        let keys: Vec<_> = styles.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["color", "position", "top", "right", "bottom", "left"]);
    }

    #[test]
    fn test_background_object() {
        assert_eq!(
            norm(json!({ "background": { "r": 1, "g": 2, "b": 3, "a": 0.5 } })),
            style_map(json!({ "background": "rgba(1, 2, 3, 0.5)" }))
        );
        assert_eq!(
            norm(json!({ "background": { "r": 1, "g": 2, "b": 3 } })),
            style_map(json!({ "background": "rgb(1, 2, 3)" }))
        );
        // zero alpha is falsy
        assert_eq!(
            norm(json!({ "background": { "r": 1, "g": 2, "b": 3, "a": 0 } })),
            style_map(json!({ "background": "rgb(1, 2, 3)" }))
        );
    }

    #[test]
    fn test_background_sequence() {
        assert_eq!(
            norm(json!({ "background": [255, 0, 0] })),
            style_map(json!({ "background": "rgb(255, 0, 0)" }))
        );
        assert_eq!(
            norm(json!({ "background": [255, 0, 0, 0.25] })),
            style_map(json!({ "background": "rgba(255, 0, 0, 0.25)" }))
        );
    }

    #[test]
    fn test_pseudo_rekeyed() {
        let styles = norm(json!({ "hover": { "color": "red" }, "focus": "not-an-object" }));
        assert_eq!(styles[":hover"], json!({ "color": "red" }));
        assert!(!styles.contains_key("hover"));
        assert_eq!(styles["focus"], json!("not-an-object"));
    }

    #[test]
    fn test_media_block_sequences() {
        let styles = norm(json!({
            "@media (max-width: 400px)": { "padding": [1, 2], "color": "red" }
        }));
        assert_eq!(
            styles["@media (max-width: 400px)"],
            json!({ "padding": "1px 2px", "color": "red" })
        );
    }

    #[test]
    fn test_top_level_sequences() {
        let styles = norm(json!({ "margin": [0, "auto"], "border": [1, "solid", "#000"] }));
        assert_eq!(styles["margin"], json!("0px auto"));
        assert_eq!(styles["border"], json!("1px solid #000"));
    }

    #[test]
    fn test_transform_object() {
        assert_eq!(
            norm(json!({ "transform": { "x": 5, "rotate": "10deg" } })),
            style_map(json!({ "transform": "translateX(5px) rotate(10deg)" }))
        );
        assert_eq!(
            norm(json!({ "transform": { "scale": 2, "y": "50%", "z": 1.5 } })),
            style_map(json!({ "transform": "scale(2) translateY(50%) translateZ(1.5px)" }))
        );
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(&Number::from_f64(1.0).unwrap()), "1");
        assert_eq!(format_number(&Number::from_f64(0.5).unwrap()), "0.5");
        assert_eq!(format_number(&Number::from(-3)), "-3");
        assert_eq!(format_number(&Number::from_f64(1e20).unwrap()), "100000000000000000000");
        assert_eq!(format_number(&Number::from_f64(-1e300).unwrap()), format!("{}", -1e300));
    }

    #[test]
    fn test_huge_sequence_values_keep_magnitude() {
        let styles = norm(json!({ "width": [1e20] }));
        assert_eq!(styles["width"], json!("100000000000000000000px"));
    }

    proptest! {
        #[test]
        fn prop_no_sequences_survive(values in prop::collection::vec(0i64..1000, 0..6)) {
            let styles = norm(json!({ "padding": values, "@media print": { "margin": values } }));
            prop_assert!(styles.values().all(|value| !value.is_array()));
            prop_assert!(styles["@media print"]["margin"].is_string());
        }

        #[test]
        fn prop_position_sides_preserved(sides in prop::array::uniform4(-500i64..500)) {
            let styles = norm(json!({ "position": sides }));
            prop_assert_eq!(&styles["position"], &json!("absolute"));
            prop_assert_eq!(&styles["top"], &json!(sides[0]));
            prop_assert_eq!(&styles["left"], &json!(sides[3]));
        }
    }
}
