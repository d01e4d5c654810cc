//! Artifact naming
//!
//! A name is taken from the first accessor that yields a non-blank string,
//! then sanitized into a file stem.

use serde_json::Value;

/// Name used when an object carries none of the known name fields
pub const UNNAMED: &str = "Unnamed";

type NameAccessor = fn(&Value) -> Option<&str>;

/// Tried in order; first hit wins
const NAME_ACCESSORS: [NameAccessor; 3] = [self_descriptor_name, own_name, own_id];

fn non_blank(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// `{"self": {"name": ...}}` as found on export payload objects
fn self_descriptor_name(object: &Value) -> Option<&str> {
    non_blank(object.get("self").and_then(|s| s.get("name")))
}

fn own_name(object: &Value) -> Option<&str> {
    non_blank(object.get("name"))
}

fn own_id(object: &Value) -> Option<&str> {
    non_blank(object.get("id"))
}

/// Best-effort display name of an exported object
pub fn resolve_name(object: &Value) -> &str {
    NAME_ACCESSORS
        .iter()
        .find_map(|accessor| accessor(object))
        .unwrap_or(UNNAMED)
}

/// File stem for a name: whitespace, path separators and `#` become `_`
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | '#' => '_',
            c if c.is_whitespace() => '_',
            other => other,
        })
        .collect()
}
