//! Firestore typed-value codec.
//!
//! Firestore's REST API wraps every value in a single-key object naming its
//! type (`{"stringValue": "x"}`, `{"integerValue": "42"}`, ...). These helpers
//! convert between that representation and plain JSON.
//!
//! Read-only types are flattened: timestamps, references and bytes become
//! strings, geo points become `{latitude, longitude}` objects.

use serde_json::{Map, Value, json};

use super::StoreError;

/// Encode a plain JSON value as a Firestore value.
#[must_use]
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => n.as_i64().map_or_else(
            || json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
            |i| json!({ "integerValue": i.to_string() }),
        ),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Encode every field of a document.
#[must_use]
pub fn encode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect()
}

/// Decode a Firestore value into plain JSON.
///
/// # Errors
///
/// Returns `StoreError::Decode` if the value is not a single-key typed
/// object, has an unknown type, or carries a malformed payload.
pub fn decode_value(value: &Value) -> Result<Value, StoreError> {
    let object = value
        .as_object()
        .ok_or_else(|| StoreError::Decode(format!("expected typed value object, got {value}")))?;

    let mut entries = object.iter();
    let (kind, payload) = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        _ => {
            return Err(StoreError::Decode(format!(
                "typed value must have exactly one key, got {value}"
            )));
        }
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => payload
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| malformed(kind, payload)),
        "integerValue" => decode_integer(payload).ok_or_else(|| malformed(kind, payload)),
        "doubleValue" => decode_double(payload).ok_or_else(|| malformed(kind, payload)),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => payload
            .as_str()
            .map(|s| Value::String(s.to_owned()))
            .ok_or_else(|| malformed(kind, payload)),
        "geoPointValue" => Ok(json!({
            "latitude": payload.get("latitude").cloned().unwrap_or(json!(0.0)),
            "longitude": payload.get("longitude").cloned().unwrap_or(json!(0.0)),
        })),
        "arrayValue" => payload
            .get("values")
            .and_then(Value::as_array)
            .map_or_else(
                || Ok(Vec::new()),
                |values| values.iter().map(decode_value).collect(),
            )
            .map(Value::Array),
        "mapValue" => payload
            .get("fields")
            .and_then(Value::as_object)
            .map_or_else(|| Ok(Map::new()), decode_fields)
            .map(Value::Object),
        other => Err(StoreError::Decode(format!("unknown value type: {other}"))),
    }
}

/// Decode every field of a document.
///
/// # Errors
///
/// Returns the first field that fails to decode, prefixed with its name.
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Map<String, Value>, StoreError> {
    fields
        .iter()
        .map(|(key, value)| {
            decode_value(value)
                .map(|decoded| (key.clone(), decoded))
                .map_err(|e| StoreError::Decode(format!("field `{key}`: {e}")))
        })
        .collect()
}

/// Integers arrive as decimal strings to survive 64-bit precision.
fn decode_integer(payload: &Value) -> Option<Value> {
    match payload {
        Value::String(s) => s.parse::<i64>().ok().map(Value::from),
        Value::Number(n) => n.as_i64().map(Value::from),
        _ => None,
    }
}

/// Doubles arrive as numbers, or as strings for the non-finite values.
/// Non-finite values have no JSON form and decode to `null`.
fn decode_double(payload: &Value) -> Option<Value> {
    match payload {
        Value::Number(n) => n.as_f64().map(Value::from),
        Value::String(s) => match s.as_str() {
            "NaN" | "Infinity" | "-Infinity" => Some(Value::Null),
            other => other.parse::<f64>().ok().map(Value::from),
        },
        _ => None,
    }
}

fn malformed(kind: &str, payload: &Value) -> StoreError {
    StoreError::Decode(format!("malformed {kind}: {payload}"))
}
