//! Shallow style merging.
//!
//! Later keys overwrite earlier ones; nested lists are flattened in order.
//! The accumulator starts as `None` and only becomes a map once some source
//! actually contributes, so "no styles at all" stays distinguishable from
//! "an empty style object".

use super::sheet::StyleOutput;
use crate::types::StyleMap;

/// Merge a style output into the accumulator.
pub fn merge_output(acc: &mut Option<StyleMap>, output: StyleOutput) {
    match output {
        StyleOutput::Absent => {}
        StyleOutput::Map(map) => {
            acc.get_or_insert_with(StyleMap::new).extend(map);
        }
        StyleOutput::List(items) => {
            for item in items {
                merge_output(acc, item);
            }
        }
    }
}

/// Merge a borrowed style map into the accumulator.
pub fn merge_map(acc: &mut Option<StyleMap>, map: &StyleMap) {
    let target = acc.get_or_insert_with(StyleMap::new);
    for (key, value) in map {
        target.insert(key.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::style_map;
    use serde_json::json;

    #[test]
    fn test_absent_leaves_none() {
        let mut acc = None;
        merge_output(&mut acc, StyleOutput::Absent);
        merge_output(&mut acc, StyleOutput::List(vec![StyleOutput::Absent]));
        assert!(acc.is_none());
    }

    #[test]
    fn test_nested_lists_merge_in_order() {
        let mut acc = None;
        merge_output(
            &mut acc,
            StyleOutput::from(json!([
                { "color": "red", "width": 1 },
                [{ "color": "blue" }, { "height": 2 }],
            ])),
        );
        assert_eq!(
            acc,
            Some(style_map(json!({ "color": "blue", "width": 1, "height": 2 })))
        );
    }

    #[test]
    fn test_overwrite_keeps_key_position() {
        let mut acc = Some(style_map(json!({ "a": 1, "b": 2 })));
        merge_map(&mut acc, &style_map(json!({ "a": 3 })));
        let keys: Vec<_> = acc.as_ref().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(acc.unwrap()["a"], json!(3));
    }
}
