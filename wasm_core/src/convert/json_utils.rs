// Shared JSON helpers for the text converters: parsing, indented encoding and YAML bridging.
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::{Map, Number, Value};

/// Parses a JSON string into `serde_json::Value`, returning a human-readable error string.
///
/// # Example
/// ```
/// use wcag_core::convert::json_utils::parse_json;
/// let value = parse_json("{\"id\":1}")?;
/// assert_eq!(value["id"], 1);
/// # Ok::<(), String>(())
/// ```
pub fn parse_json(input: &str) -> Result<Value, String> {
    serde_json::from_str(input).map_err(|err| err.to_string())
}

/// Encodes a JSON `Value` either minified (`indent == 0`) or pretty-printed with
/// `indent` spaces per level. Key order is preserved from the source document.
///
/// # Example
/// ```
/// use serde_json::json;
/// use wcag_core::convert::json_utils::encode_json;
/// assert_eq!(encode_json(&json!({"a":1}), 0)?, "{\"a\":1}");
/// assert_eq!(encode_json(&json!({"a":1}), 4)?, "{\n    \"a\": 1\n}");
/// # Ok::<(), String>(())
/// ```
pub fn encode_json(value: &Value, indent: usize) -> Result<String, String> {
    if indent == 0 {
        return serde_json::to_string(value).map_err(|err| err.to_string());
    }
    let pad = " ".repeat(indent.min(16));
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(pad.as_bytes());
    let mut serializer = Serializer::with_formatter(&mut out, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|err| err.to_string())?;
    String::from_utf8(out).map_err(|err| err.to_string())
}

/// Flattens nested objects into a single map with dot-joined keys.
/// Arrays are left as values so callers decide how to render them.
pub fn flatten_object(value: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    flatten_into(&mut out, "", value);
    out
}

fn flatten_into(out: &mut Map<String, Value>, prefix: &str, value: &Map<String, Value>) {
    for (key, child) in value {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match child {
            Value::Object(inner) => flatten_into(out, &path, inner),
            other => {
                out.insert(path, other.clone());
            }
        }
    }
}

/// Converts a `serde_yaml::Value` into a JSON `Value`, normalizing tagged values too.
pub fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(num) => {
            if let Some(i) = num.as_i64() {
                Value::Number(Number::from(i))
            } else if let Some(u) = num.as_u64() {
                Value::Number(Number::from(u))
            } else if let Some(f) = num.as_f64() {
                Number::from_f64(f)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            } else {
                Value::Null
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(seq) => Value::Array(seq.into_iter().map(yaml_to_json).collect()),
        serde_yaml::Value::Mapping(map) => {
            let mut obj = Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s,
                    other => serde_yaml::to_string(&other)
                        .unwrap_or_default()
                        .trim()
                        .to_string(),
                };
                obj.insert(key, yaml_to_json(v));
            }
            Value::Object(obj)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

/// Renders a scalar JSON value as the bare text used inside CSV cells.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
