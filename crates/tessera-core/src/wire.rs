//! The untyped wire representation exchanged with the remote management API.
//!
//! Wire values are plain JSON: nested maps keyed by (usually kebab-case)
//! wire keys, arrays for tables and primitives for scalars. There is no
//! identity concept on the wire and array order is whatever the remote
//! system returned.

pub use serde_json::Value as WireValue;

/// A wire object: keys in the order the remote system sent them.
pub type WireMap = serde_json::Map<String, WireValue>;

/// Short name of a wire value's dynamic type, for diagnostics.
pub fn wire_kind(value: &WireValue) -> &'static str {
    match value {
        WireValue::Null => "null",
        WireValue::Bool(_) => "boolean",
        WireValue::Number(n) if n.is_f64() => "float",
        WireValue::Number(_) => "integer",
        WireValue::String(_) => "string",
        WireValue::Array(_) => "array",
        WireValue::Object(_) => "object",
    }
}

/// Derive the default wire key for a state field name (`dst_port` -> `dst-port`).
pub fn default_wire_key(name: &str) -> String {
    name.replace('_', "-")
}
