//! Style Resolution Engine.
//!
//! Turns a view's declared style sources plus one element's context into a
//! single normalized [`StyleMap`](crate::types::StyleMap):
//!
//! ```text
//! tag → name → root ($) → parent-passed → class tokens → view classes → view style → inline
//!                                                                   ↓
//!                                                       shorthand normalization
//! ```
//!
//! - [`sheet`] - Selector keys, style rules, per-view style sheets
//! - [`merge`] - Recursive shallow merge of style outputs
//! - [`resolve`] - Precedence algorithm for one element
//! - [`shorthand`] - `position`, `background`, pseudo, `@` block and `transform` expansion

pub mod merge;
pub mod resolve;
pub mod sheet;
pub mod shorthand;

pub use merge::{merge_map, merge_output};
pub use resolve::{body_background, resolve_styles, ElementStyleContext};
pub use sheet::{SelectorKey, StyleFn, StyleOutput, StyleRule, StyleSheet};
pub use shorthand::normalize;
