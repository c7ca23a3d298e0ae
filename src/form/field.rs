//! Form fields and entered values

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::markup::escape;

/// Optional sign and the digits before any fraction or exponent
static LEADING_INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[+-]?[0-9]+").unwrap());

/// HTML input type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    #[default]
    Text,
    Number,
    Checkbox,
}

impl InputKind {
    pub fn as_str(self) -> &'static str {
        match self {
            InputKind::Text => "text",
            InputKind::Number => "number",
            InputKind::Checkbox => "checkbox",
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Initial value shown in a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldDefault {
    Text(String),
    Checked(bool),
}

impl Default for FieldDefault {
    fn default() -> Self {
        FieldDefault::Text(String::new())
    }
}

/// Raw state of an input element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawInput {
    /// Text of a text or number input
    Text(String),
    /// State of a checkbox
    Checked(bool),
}

/// One input of a form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Description of the expected input, e.g. "Attack Bonus"
    pub label: String,
    /// Identifier, unique within the form, e.g. "ab"
    pub id: String,
    #[serde(default)]
    pub default: FieldDefault,
    #[serde(default)]
    pub kind: InputKind,
}

impl FieldSpec {
    pub fn text(label: impl Into<String>, id: impl Into<String>, default: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            id: id.into(),
            default: FieldDefault::Text(default.into()),
            kind: InputKind::Text,
        }
    }

    pub fn number(label: impl Into<String>, id: impl Into<String>, default: i64) -> Self {
        Self {
            label: label.into(),
            id: id.into(),
            default: FieldDefault::Text(default.to_string()),
            kind: InputKind::Number,
        }
    }

    pub fn checkbox(label: impl Into<String>, id: impl Into<String>, checked: bool) -> Self {
        Self {
            label: label.into(),
            id: id.into(),
            default: FieldDefault::Checked(checked),
            kind: InputKind::Checkbox,
        }
    }

    /// The input state before the user touches the field
    pub fn default_input(&self) -> RawInput {
        match (self.kind, &self.default) {
            (InputKind::Checkbox, FieldDefault::Checked(checked)) => RawInput::Checked(*checked),
            (InputKind::Checkbox, FieldDefault::Text(text)) => RawInput::Checked(!text.is_empty()),
            (_, FieldDefault::Text(text)) => RawInput::Text(text.clone()),
            (_, FieldDefault::Checked(checked)) => RawInput::Text(checked.to_string()),
        }
    }

    /// Form markup for this field
    pub fn markup(&self) -> String {
        let id = escape(&self.id);
        let label = format!(r#"<label for="{}">{}</label>"#, id, escape(&self.label));
        match self.default_input() {
            RawInput::Checked(checked) => format!(
                r#"<p><input type="checkbox" id="{}"{}>{}</p>"#,
                id,
                if checked { " checked" } else { "" },
                label
            ),
            RawInput::Text(value) => format!(
                r#"<p>{}<input type="{}" id="{}" value="{}"></p>"#,
                label,
                self.kind,
                id,
                escape(&value)
            ),
        }
    }
}

/// A value collected from a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl FieldValue {
    /// Checkbox state becomes a bool. Numeric text becomes its integer part
    /// (`"4.5"` -> 4, `"1e3"` -> 1); other text is kept.
    pub fn coerce(raw: RawInput) -> Self {
        match raw {
            RawInput::Checked(checked) => FieldValue::Bool(checked),
            RawInput::Text(text) => match integer_part(text.trim()) {
                Some(n) => FieldValue::Integer(n),
                None => FieldValue::Text(text),
            },
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Leading integer of a finite number, `None` for anything else or when it overflows
fn integer_part(text: &str) -> Option<i64> {
    let number: f64 = text.parse().ok()?;
    if !number.is_finite() {
        return None;
    }
    LEADING_INTEGER.find(text)?.as_str().parse().ok()
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Text(text) => f.write_str(text),
        }
    }
}
