//! Canonical artifact serialization and checksums
//!
//! Object keys are sorted recursively and the document is printed with
//! four-space indentation and a trailing newline, so an unchanged object
//! always yields byte-identical files (and identical blob hashes upstream).

use crate::domain::Result;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Canonical bytes of an exported object
///
/// ```
/// use idsnap::core::materialize::canonical::to_canonical_bytes;
/// use serde_json::json;
///
/// let bytes = to_canonical_bytes(&json!({"b": 1, "a": 2})).unwrap();
/// assert_eq!(String::from_utf8(bytes).unwrap(), "{\n    \"a\": 2,\n    \"b\": 1\n}\n");
/// ```
pub fn to_canonical_bytes(value: &Value) -> Result<Vec<u8>> {
    let normalized = normalize_json(value);

    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    normalized.serialize(&mut serializer)?;
    buf.push(b'\n');

    Ok(buf)
}

/// Recursively sort object keys
fn normalize_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(k, v)| (k.clone(), normalize_json(v)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(normalize_json).collect()),
        _ => value.clone(),
    }
}

/// Hex-encoded SHA-256 of raw bytes
pub fn checksum_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
