//! Firestore value codec.
//!
//! The Firestore REST API wraps every field in a typed envelope
//! (`{"stringValue": "x"}`, `{"integerValue": "42"}`, ...). This module
//! translates between that encoding and plain `serde_json` values so the
//! rest of the crate works with ordinary JSON.
//!
//! Integers travel as strings on the wire (64-bit values do not survive
//! JSON number parsing in every client); timestamps stay RFC 3339 strings
//! on our side.

use serde_json::{Map, Value, json};

/// Encode a plain JSON value into the Firestore typed encoding.
#[must_use]
pub fn encode(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                // Integers are strings on the wire.
                json!({ "integerValue": i.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Encode a field map into Firestore `fields`.
#[must_use]
pub fn encode_fields(fields: &Map<String, Value>) -> Value {
    let encoded: Map<String, Value> = fields
        .iter()
        .map(|(k, v)| (k.clone(), encode(v)))
        .collect();
    Value::Object(encoded)
}

/// Decode a Firestore typed value back to plain JSON.
///
/// Unknown envelopes decode to `null` rather than erroring; a document with
/// a field type this client does not use should not poison the whole read.
#[must_use]
pub fn decode(value: &Value) -> Value {
    let Some(map) = value.as_object() else {
        return Value::Null;
    };

    if map.contains_key("nullValue") {
        return Value::Null;
    }
    if let Some(b) = map.get("booleanValue").and_then(Value::as_bool) {
        return Value::Bool(b);
    }
    if let Some(i) = map.get("integerValue") {
        // Accept both the documented string form and a bare number.
        let parsed = match i {
            Value::String(s) => s.parse::<i64>().ok(),
            Value::Number(n) => n.as_i64(),
            _ => None,
        };
        return parsed.map_or(Value::Null, |i| json!(i));
    }
    if let Some(d) = map.get("doubleValue").and_then(Value::as_f64) {
        return json!(d);
    }
    if let Some(s) = map.get("stringValue").and_then(Value::as_str) {
        return Value::String(s.to_owned());
    }
    if let Some(s) = map.get("timestampValue").and_then(Value::as_str) {
        return Value::String(s.to_owned());
    }
    if let Some(s) = map.get("referenceValue").and_then(Value::as_str) {
        return Value::String(s.to_owned());
    }
    if let Some(array) = map.get("arrayValue") {
        let values = array
            .get("values")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(decode).collect::<Vec<_>>())
            .unwrap_or_default();
        return Value::Array(values);
    }
    if let Some(inner) = map.get("mapValue") {
        let fields = inner
            .get("fields")
            .and_then(Value::as_object)
            .map(decode_fields)
            .unwrap_or_default();
        return Value::Object(fields);
    }

    Value::Null
}

/// Decode Firestore `fields` into a plain field map.
#[must_use]
pub fn decode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), decode(v)))
        .collect()
}

/// Build the `updateMask.fieldPaths` query string for a masked patch.
#[must_use]
pub fn update_mask_query(fields: &Map<String, Value>) -> String {
    fields
        .keys()
        .map(|k| format!("updateMask.fieldPaths={}", urlencoding::encode(k)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn roundtrip(value: Value) {
        assert_eq!(decode(&encode(&value)), value);
    }

    #[test]
    fn test_roundtrip_scalars() {
        roundtrip(json!(null));
        roundtrip(json!(true));
        roundtrip(json!(false));
        roundtrip(json!(42));
        roundtrip(json!(-7));
        roundtrip(json!(49.5));
        roundtrip(json!("hello"));
        roundtrip(json!(""));
    }

    #[test]
    fn test_roundtrip_compound() {
        roundtrip(json!(["a", "b", "c"]));
        roundtrip(json!([]));
        roundtrip(json!({
            "title": "Intro to Rust",
            "price": 49.0,
            "students": ["u1", "u2"],
            "meta": { "level": "beginner", "published": true }
        }));
    }

    #[test]
    fn test_integer_encodes_as_string() {
        assert_eq!(encode(&json!(42)), json!({ "integerValue": "42" }));
    }

    #[test]
    fn test_double_stays_double() {
        assert_eq!(encode(&json!(49.5)), json!({ "doubleValue": 49.5 }));
    }

    #[test]
    fn test_decode_bare_number_integer() {
        // The emulator returns integerValue as a bare number; accept it.
        assert_eq!(decode(&json!({ "integerValue": 7 })), json!(7));
    }

    #[test]
    fn test_decode_timestamp_to_string() {
        let ts = json!({ "timestampValue": "2025-11-03T10:15:30Z" });
        assert_eq!(decode(&ts), json!("2025-11-03T10:15:30Z"));
    }

    #[test]
    fn test_decode_unknown_envelope_is_null() {
        assert_eq!(decode(&json!({ "geoPointValue": {} })), json!(null));
        assert_eq!(decode(&json!("not an envelope")), json!(null));
    }

    #[test]
    fn test_update_mask_query() {
        let mut fields = Map::new();
        fields.insert("title".to_string(), json!("x"));
        fields.insert("price".to_string(), json!(1));
        let mask = update_mask_query(&fields);
        assert_eq!(
            mask,
            "updateMask.fieldPaths=title&updateMask.fieldPaths=price"
        );
    }
}
