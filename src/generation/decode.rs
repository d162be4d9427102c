//! Defensive decoding of structured model output.
//!
//! Model replies are only best-effort JSON. Nothing here returns an error:
//! malformed payloads degrade to the empty value and are logged.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

/// Strips a surrounding markdown code fence (```json ... ```), if any.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Parses `text` as JSON, returning `None` for blank or malformed input.
pub fn parse_json(text: &str) -> Option<Value> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str(body) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(error = %e, "discarding malformed model JSON");
            None
        }
    }
}

/// Decodes a JSON object reply into `T`, falling back to `T::default()`.
pub fn decode_object<T>(text: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let Some(value) = parse_json(text) else {
        return T::default();
    };
    match serde_json::from_value(value) {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!(error = %e, "model JSON did not match the expected shape");
            T::default()
        }
    }
}

/// Decodes a JSON array reply item by item. Items that fail to decode are
/// dropped; a non-array reply decodes to an empty list.
pub fn decode_list<T>(text: &str) -> Vec<T>
where
    T: DeserializeOwned,
{
    match parse_json(text) {
        Some(value) => decode_list_value(value),
        None => Vec::new(),
    }
}

/// Item-wise decoding of an already parsed JSON array.
pub fn decode_list_value<T>(value: Value) -> Vec<T>
where
    T: DeserializeOwned,
{
    let Value::Array(items) = value else {
        warn!("expected a JSON array from the model");
        return Vec::new();
    };
    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    if decoded.len() < total {
        warn!(
            dropped = total - decoded.len(),
            total, "dropped malformed items from model list"
        );
    }
    decoded
}

/// Renders a scalar JSON value as text. Objects and arrays yield `None`.
fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Accepts strings, numbers, booleans and null for a `String` field.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_to_string(value).unwrap_or_default())
}

/// Like `lenient_string`, but keeps absence: null, arrays and objects become
/// `None`. Blank text is a present value.
pub fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_to_string(value))
}

/// Accepts an array of scalars or a single comma-separated string.
pub fn lenient_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let names = match value {
        Value::Array(items) => items.into_iter().filter_map(scalar_to_string).collect(),
        Value::String(s) => s.split([',', '，', '、']).map(str::to_string).collect(),
        _ => Vec::new(),
    };
    Ok(names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect())
}
