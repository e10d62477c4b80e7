//! Binding Channels
//!
//! A channel is the element property a node value is pushed into and read
//! back from. The classification below is the single table both sync
//! directions use:
//!
//! | Element                                  | Channel           | Event    |
//! |------------------------------------------|-------------------|----------|
//! | `input` (not checkbox/radio), `textarea` | [`FormValue`]     | `input`  |
//! | `select`                                 | [`SelectedIndex`] | `change` |
//! | `input type=checkbox` / `type=radio`     | [`Checked`]       | `change` |
//! | anything else                            | [`Content`]       | `input`  |
//!
//! Classification is recomputed on every use, so an element whose `type`
//! attribute changes after binding switches channel on the next sync.
//!
//! [`FormValue`]: Channel::FormValue
//! [`SelectedIndex`]: Channel::SelectedIndex
//! [`Checked`]: Channel::Checked
//! [`Content`]: Channel::Content

use serde_json::Value;

use super::{Document, ElementId, EventKind};
use crate::error::DomError;

/// The element property a value is synchronized through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// The value field of text-like form controls.
    FormValue,
    /// The selected option index of a `select`.
    SelectedIndex,
    /// The checked flag of checkboxes and radios.
    Checked,
    /// Inner markup of any other element.
    Content,
}

impl Channel {
    /// Classify an element from its tag name and `type` attribute.
    pub fn infer(tag: &str, input_type: Option<&str>) -> Self {
        if tag.eq_ignore_ascii_case("select") {
            return Channel::SelectedIndex;
        }
        if tag.eq_ignore_ascii_case("textarea") {
            return Channel::FormValue;
        }
        if tag.eq_ignore_ascii_case("input") {
            let toggles = input_type
                .map(|t| t.eq_ignore_ascii_case("checkbox") || t.eq_ignore_ascii_case("radio"))
                .unwrap_or(false);
            return if toggles {
                Channel::Checked
            } else {
                Channel::FormValue
            };
        }
        Channel::Content
    }

    /// Classify an element living in `doc`.
    ///
    /// Returns `None` when the document does not know the element.
    pub fn of(doc: &dyn Document, element: ElementId) -> Option<Self> {
        let tag = doc.tag_name(element)?;
        let input_type = doc.attribute(element, "type");
        Some(Self::infer(&tag, input_type.as_deref()))
    }

    /// The event that signals a user-driven change on this channel.
    pub fn event(&self) -> EventKind {
        match self {
            Channel::FormValue | Channel::Content => EventKind::Input,
            Channel::SelectedIndex | Channel::Checked => EventKind::Change,
        }
    }

    /// Push `value` into `element` through this channel.
    pub fn write(&self, doc: &dyn Document, element: ElementId, value: &Value) -> Result<(), DomError> {
        match self {
            Channel::FormValue => doc.set_form_value(element, &to_text(value)),
            Channel::Content => doc.set_inner_html(element, &to_text(value)),
            Channel::Checked => doc.set_checked(element, is_truthy(value)),
            Channel::SelectedIndex => doc.set_selected_index(element, to_index(value)),
        }
    }

    /// Read the element's current state back as a node value.
    pub fn read(&self, doc: &dyn Document, element: ElementId) -> Option<Value> {
        match self {
            Channel::FormValue => doc.form_value(element).map(Value::String),
            Channel::Content => doc.inner_html(element).map(Value::String),
            Channel::Checked => doc.checked(element).map(Value::Bool),
            Channel::SelectedIndex => doc.selected_index(element).map(Value::from),
        }
    }
}

/// Textual form of a value for the text channels.
pub(crate) fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Truthiness for the checked channel.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Integer index for the selected-index channel; `-1` when not numeric.
pub(crate) fn to_index(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(-1),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f.trunc() as i64)
            .unwrap_or(-1),
        Value::Bool(b) => i64::from(*b),
        Value::Null | Value::Array(_) | Value::Object(_) => -1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classification_table() {
        assert_eq!(Channel::infer("input", None), Channel::FormValue);
        assert_eq!(Channel::infer("input", Some("text")), Channel::FormValue);
        assert_eq!(Channel::infer("input", Some("email")), Channel::FormValue);
        assert_eq!(Channel::infer("textarea", None), Channel::FormValue);
        assert_eq!(Channel::infer("select", None), Channel::SelectedIndex);
        assert_eq!(Channel::infer("input", Some("checkbox")), Channel::Checked);
        assert_eq!(Channel::infer("input", Some("radio")), Channel::Checked);
        assert_eq!(Channel::infer("li", None), Channel::Content);
        assert_eq!(Channel::infer("div", Some("checkbox")), Channel::Content);
    }

    #[test]
    fn classification_ignores_case() {
        assert_eq!(Channel::infer("INPUT", Some("CheckBox")), Channel::Checked);
        assert_eq!(Channel::infer("Select", None), Channel::SelectedIndex);
        assert_eq!(Channel::infer("TEXTAREA", None), Channel::FormValue);
    }

    #[test]
    fn events_follow_channel() {
        assert_eq!(Channel::FormValue.event(), EventKind::Input);
        assert_eq!(Channel::Content.event(), EventKind::Input);
        assert_eq!(Channel::SelectedIndex.event(), EventKind::Change);
        assert_eq!(Channel::Checked.event(), EventKind::Change);
    }

    #[test]
    fn text_coercion() {
        assert_eq!(to_text(&json!(null)), "");
        assert_eq!(to_text(&json!("hi")), "hi");
        assert_eq!(to_text(&json!(true)), "true");
        assert_eq!(to_text(&json!(42)), "42");
        assert_eq!(to_text(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("no")));
        assert!(is_truthy(&json!(-1)));
        assert!(is_truthy(&json!({})));
    }

    #[test]
    fn index_coercion() {
        assert_eq!(to_index(&json!(2)), 2);
        assert_eq!(to_index(&json!(2.9)), 2);
        assert_eq!(to_index(&json!(" 1 ")), 1);
        assert_eq!(to_index(&json!("two")), -1);
        assert_eq!(to_index(&json!(true)), 1);
        assert_eq!(to_index(&json!(null)), -1);
    }
}
