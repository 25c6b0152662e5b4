// Helpers for interpreting parsed YAML inputs.

use serde_yaml::Value;

/// Short description of a value's shape, for error messages.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Render a scalar the way it would read in the YAML text.
/// Null, sequences, mappings and tagged values are not scalars.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        // serde_yaml's rendering: `1.0` stays `1.0`, `1e3` becomes `1000.0`.
        // Quote the value in YAML to pass it through verbatim.
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
