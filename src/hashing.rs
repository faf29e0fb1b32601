//! Request Fingerprints - SHA-256 over canonical JSON
//!
//! Two canonical requests with the same content always share a fingerprint,
//! whatever the key order of the raw input was.

use serde::Serialize;
use serde_json::{to_string, Value};
use sha2::{Digest, Sha256};

use crate::parse::CanonicalRequest;

/// Compute SHA-256 of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Convert to canonical JSON (sorted keys, no whitespace)
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v: Value = serde_json::to_value(value)?;
    to_string(&sort_value(&v))
}

fn sort_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sort_value(v)))
                    .collect(),
            )
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_value).collect()),
        _ => v.clone(),
    }
}

/// Fingerprint of an export job, used to correlate log lines and CLI output.
pub fn request_fingerprint(request: &CanonicalRequest) -> Result<String, serde_json::Error> {
    Ok(sha256_hex(canonical_json(request)?.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;
    use serde_json::json;

    #[test]
    fn test_canonical_json_sorted() {
        let obj = json!({"z": 1, "a": 2, "m": {"y": [{"b": 1, "a": 0}]}});
        let canonical = canonical_json(&obj).unwrap();
        assert_eq!(canonical, r#"{"a":2,"m":{"y":[{"a":0,"b":1}]},"z":1}"#);
    }

    #[test]
    fn test_fingerprint_ignores_key_order() {
        let a = parse(&json!({"data": [{"x": [1], "type": "bar"}], "layout": {"b": 1, "a": 2}}), &json!({}), false).unwrap();
        let b = parse(&json!({"layout": {"a": 2, "b": 1}, "data": [{"type": "bar", "x": [1]}]}), &json!({}), false).unwrap();
        assert_eq!(request_fingerprint(&a).unwrap(), request_fingerprint(&b).unwrap());
    }

    #[test]
    fn test_fingerprint_tracks_options() {
        let body = json!({"layout": {}});
        let png = parse(&body, &json!({"format": "png"}), false).unwrap();
        let svg = parse(&body, &json!({"format": "svg"}), false).unwrap();
        assert_ne!(request_fingerprint(&png).unwrap(), request_fingerprint(&svg).unwrap());
        assert_eq!(request_fingerprint(&png).unwrap().len(), 64);
    }
}
