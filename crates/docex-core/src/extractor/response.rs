//! Best-effort parsing of untrusted model output.
//!
//! The model is asked for bare JSON but routinely wraps it in prose or code
//! fences. The first brace-delimited object is located and parsed; anything
//! unusable yields [`ParsedResponse::Unusable`] with the reason.

use std::fmt;

use serde_json::{Map, Value};

use crate::models::{Field, FieldValue};

/// Outcome of parsing a model response.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    /// A JSON object with a `fields` array was found (the list may be empty).
    Fields(Vec<Field>),
    /// Nothing usable was found.
    Unusable(UnusableReason),
}

/// Why a response could not be used.
#[derive(Debug, Clone, PartialEq)]
pub enum UnusableReason {
    /// No `{` in the response at all.
    NoJsonObject,
    /// A candidate object was found but is not valid JSON.
    InvalidJson(String),
    /// The object has no `fields` array.
    MissingFieldsArray,
}

impl fmt::Display for UnusableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnusableReason::NoJsonObject => f.write_str("no JSON object in response"),
            UnusableReason::InvalidJson(e) => write!(f, "invalid JSON: {}", e),
            UnusableReason::MissingFieldsArray => f.write_str("JSON object has no fields array"),
        }
    }
}

/// Parse a raw model response into fields.
pub fn parse_response(raw: &str) -> ParsedResponse {
    let object = match find_json_object(raw) {
        Ok(object) => object,
        Err(reason) => return ParsedResponse::Unusable(reason),
    };

    match object.get("fields") {
        Some(Value::Array(items)) => {
            ParsedResponse::Fields(items.iter().filter_map(field_from_value).collect())
        }
        _ => ParsedResponse::Unusable(UnusableReason::MissingFieldsArray),
    }
}

/// Locate and parse the first JSON object in `text`.
///
/// Tries the balanced object starting at the first `{` and falls back to the
/// span from the first `{` to the last `}`.
fn find_json_object(text: &str) -> Result<Map<String, Value>, UnusableReason> {
    let start = text.find('{').ok_or(UnusableReason::NoJsonObject)?;

    let mut last_error = None;
    let balanced = balanced_object_end(text, start).map(|end| &text[start..=end]);
    let greedy = text.rfind('}').filter(|&end| end > start).map(|end| &text[start..=end]);

    for candidate in [balanced, greedy].into_iter().flatten() {
        match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(map)) => return Ok(map),
            Ok(_) => {}
            Err(e) => last_error = Some(e.to_string()),
        }
    }

    Err(UnusableReason::InvalidJson(
        last_error.unwrap_or_else(|| "unterminated object".to_string()),
    ))
}

/// Byte index of the `}` closing the object opened at `start`.
fn balanced_object_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }

    None
}

/// Convert one element of the `fields` array. Nameless entries are dropped.
fn field_from_value(value: &Value) -> Option<Field> {
    let item = value.as_object()?;
    let name = item.get("name")?.as_str()?.trim();
    if name.is_empty() {
        return None;
    }

    let field_value = match item.get("value") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(FieldValue::Text(s.clone())),
        Some(Value::Number(n)) => Some(FieldValue::Number(n.clone())),
        Some(other) => Some(FieldValue::Text(other.to_string())),
    };

    Some(Field::new(name, field_value, confidence_from(item.get("confidence"))))
}

/// Model confidence as reported; clamping happens when scoring.
fn confidence_from(value: Option<&Value>) -> f64 {
    let confidence = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    confidence.filter(|c| c.is_finite()).unwrap_or(0.0)
}
