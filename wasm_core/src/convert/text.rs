//! Text-oriented converters used by the JSON, CSV, YAML, URL and Base64 tools.
//!
//! Every function takes the whole document as a string and returns either the
//! converted text or a message suitable for showing inline next to the input.
//!
//! ```rust
//! use wcag_core::convert::text::{format_json, minify_json};
//!
//! let pretty = format_json("{\"a\":[1,2]}", 2)?;
//! assert_eq!(minify_json(&pretty)?, "{\"a\":[1,2]}");
//! # Ok::<(), String>(())
//! ```
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::convert::json_utils::{encode_json, flatten_object, parse_json, scalar_text, yaml_to_json};
use crate::convert::markdown::html_escape;

/// Result of [`validate_json`]; `error` carries the parser message when invalid.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct JsonValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    /// Single-byte field separator, `,` unless the UI picks `;` or tab.
    pub delimiter: String,
    /// Whether the first CSV line names the columns.
    pub header: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: ",".into(),
            header: true,
        }
    }
}

impl CsvOptions {
    fn delimiter_byte(&self) -> Result<u8, String> {
        match self.delimiter.as_bytes() {
            [] => Ok(b','),
            [single] => Ok(*single),
            _ if self.delimiter == "\\t" => Ok(b'\t'),
            _ => Err(format!("delimiter must be a single character: {}", self.delimiter)),
        }
    }
}

/// Re-serializes JSON with `indent` spaces per level; 0 gives compact output.
pub fn format_json(input: &str, indent: usize) -> Result<String, String> {
    let value = parse_json(input)?;
    encode_json(&value, indent)
}

/// Re-serializes JSON without insignificant whitespace.
pub fn minify_json(input: &str) -> Result<String, String> {
    let value = parse_json(input)?;
    encode_json(&value, 0)
}

pub fn validate_json(input: &str) -> JsonValidation {
    match parse_json(input) {
        Ok(_) => JsonValidation {
            valid: true,
            error: None,
        },
        Err(err) => JsonValidation {
            valid: false,
            error: Some(err),
        },
    }
}

/// Converts a JSON array of objects into CSV.
///
/// Nested objects flatten into dot-joined column names; the header is the union
/// of keys in first-seen order. Arrays are written as compact JSON text.
///
/// # Example
/// ```
/// use wcag_core::convert::text::{json_to_csv, CsvOptions};
/// let csv = json_to_csv(r#"[{"a":1,"b":{"c":true}}]"#, &CsvOptions::default())?;
/// assert_eq!(csv, "a,b.c\n1,true");
/// # Ok::<(), String>(())
/// ```
pub fn json_to_csv(input: &str, options: &CsvOptions) -> Result<String, String> {
    let value = parse_json(input)?;
    let Value::Array(items) = value else {
        return Err("JSON must be an array of objects".into());
    };
    if items.is_empty() {
        return Ok(String::new());
    }
    let rows: Vec<Map<String, Value>> = items
        .iter()
        .map(|item| match item {
            Value::Object(map) => flatten_object(map),
            other => {
                let mut single = Map::new();
                single.insert("value".into(), other.clone());
                single
            }
        })
        .collect();
    let mut columns: Vec<String> = Vec::new();
    for row in &rows {
        for key in row.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let mut writer = WriterBuilder::new()
        .delimiter(options.delimiter_byte()?)
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    if options.header {
        writer.write_record(&columns).map_err(|err| err.to_string())?;
    }
    for row in &rows {
        let record: Vec<String> = columns
            .iter()
            .map(|column| row.get(column).map(scalar_text).unwrap_or_default())
            .collect();
        writer.write_record(&record).map_err(|err| err.to_string())?;
    }
    let bytes = writer.into_inner().map_err(|err| err.to_string())?;
    let text = String::from_utf8(bytes).map_err(|err| err.to_string())?;
    Ok(text.trim_end_matches('\n').to_string())
}

/// Parses CSV into a JSON array, typing numbers and booleans and skipping blank lines.
///
/// With `header` on, each row becomes an object keyed by the header; otherwise
/// each row becomes an array.
pub fn csv_to_json(input: &str, options: &CsvOptions) -> Result<Value, String> {
    let mut reader = ReaderBuilder::new()
        .delimiter(options.delimiter_byte()?)
        .has_headers(options.header)
        .flexible(true)
        .from_reader(input.as_bytes());
    let headers: Vec<String> = if options.header {
        reader
            .headers()
            .map_err(|err| err.to_string())?
            .iter()
            .map(|h| h.trim().to_string())
            .collect()
    } else {
        Vec::new()
    };
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| err.to_string())?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        if options.header {
            let mut obj = Map::new();
            for (idx, name) in headers.iter().enumerate() {
                let cell = record.get(idx).map(typed_cell).unwrap_or(Value::Null);
                obj.insert(name.clone(), cell);
            }
            rows.push(Value::Object(obj));
        } else {
            rows.push(Value::Array(record.iter().map(typed_cell).collect()));
        }
    }
    Ok(Value::Array(rows))
}

fn typed_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    match trimmed {
        "" => return Value::Null,
        "true" | "TRUE" => return Value::Bool(true),
        "false" | "FALSE" => return Value::Bool(false),
        _ => {}
    }
    if looks_numeric(trimmed) {
        if let Ok(int) = trimmed.parse::<i64>() {
            return Value::Number(Number::from(int));
        }
        if let Some(num) = trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(num);
        }
    }
    Value::String(raw.to_string())
}

fn looks_numeric(text: &str) -> bool {
    let body = text.strip_prefix('-').unwrap_or(text);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(idx) => (&body[..idx], Some(&body[idx + 1..])),
        None => (body, None),
    };
    let mantissa_ok = {
        let mut parts = mantissa.splitn(2, '.');
        let int = parts.next().unwrap_or("");
        let frac = parts.next();
        let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        match frac {
            None => !int.is_empty() && digits(int),
            Some(frac) => (!int.is_empty() || !frac.is_empty()) && digits(int) && digits(frac),
        }
    };
    let exponent_ok = exponent.is_none_or(|exp| {
        let exp = exp.strip_prefix(['+', '-']).unwrap_or(exp);
        !exp.is_empty() && exp.bytes().all(|b| b.is_ascii_digit())
    });
    mantissa_ok && exponent_ok
}

/// Loads a single YAML document and renders it as two-space indented JSON.
pub fn yaml_to_json_text(input: &str) -> Result<String, String> {
    let parsed: serde_yaml::Value = serde_yaml::from_str(input).map_err(|err| err.to_string())?;
    encode_json(&yaml_to_json(parsed), 2)
}

pub fn json_to_yaml(input: &str) -> Result<String, String> {
    let value = parse_json(input)?;
    serde_yaml::to_string(&value).map_err(|err| err.to_string())
}

/// Escapes text and wraps blank-line separated blocks in `<p>`, turning single
/// newlines into `<br>`.
///
/// # Example
/// ```
/// use wcag_core::convert::text::text_to_html;
/// assert_eq!(text_to_html("a\nb\n\nc"), "<p>a<br>b</p>\n<p>c</p>");
/// ```
pub fn text_to_html(input: &str) -> String {
    let escaped = html_escape(&input.replace("\r\n", "\n"));
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut newline_run = 0usize;
    for ch in escaped.chars() {
        if ch == '\n' {
            newline_run += 1;
            continue;
        }
        match newline_run {
            0 => {}
            1 => current.push_str("<br>"),
            _ => paragraphs.push(std::mem::take(&mut current)),
        }
        newline_run = 0;
        current.push(ch);
    }
    match newline_run {
        0 => {}
        1 => current.push_str("<br>"),
        _ => paragraphs.push(std::mem::take(&mut current)),
    }
    paragraphs.push(current);
    paragraphs
        .iter()
        .map(|p| format!("<p>{p}</p>"))
        .collect::<Vec<_>>()
        .join("\n")
}

const COMPONENT_SAFE: &[u8] = b"-_.!~*'()";
const URI_RESERVED: &[u8] = b";,/?:@&=+$#";

/// Percent-encodes text. `full = false` escapes everything except unreserved
/// characters (component encoding); `full = true` also keeps URI delimiters.
///
/// # Example
/// ```
/// use wcag_core::convert::text::url_encode;
/// assert_eq!(url_encode("a b/c?", false), "a%20b%2Fc%3F");
/// assert_eq!(url_encode("https://x.y/a b?q=1", true), "https://x.y/a%20b?q=1");
/// ```
pub fn url_encode(input: &str, full: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        let keep = byte.is_ascii_alphanumeric()
            || COMPONENT_SAFE.contains(&byte)
            || (full && URI_RESERVED.contains(&byte));
        if keep {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

/// Reverses [`url_encode`]. With `full = true`, escapes of URI delimiters are
/// left in place.
pub fn url_decode(input: &str, full: bool) -> Result<String, String> {
    let bytes = input.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] != b'%' {
            out.push(bytes[idx]);
            idx += 1;
            continue;
        }
        let hex_pair = bytes.get(idx + 1..idx + 3).ok_or("URI malformed")?;
        let text = std::str::from_utf8(hex_pair).map_err(|_| "URI malformed")?;
        let decoded = u8::from_str_radix(text, 16).map_err(|_| "URI malformed")?;
        if full && URI_RESERVED.contains(&decoded) {
            out.extend_from_slice(&bytes[idx..idx + 3]);
        } else {
            out.push(decoded);
        }
        idx += 3;
    }
    String::from_utf8(out).map_err(|_| "URI malformed".to_string())
}

pub fn base64_encode(input: &str) -> String {
    STANDARD.encode(input.as_bytes())
}

pub fn base64_decode(input: &str) -> Result<String, String> {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|err| err.to_string())?;
    String::from_utf8(bytes).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn format_then_minify_preserves_value() {
        let samples = [
            r#"{"z":1,"a":[true,null,{"k":"v"}],"n":-2.5e3}"#,
            "[]",
            r#""just a string""#,
            r#"{"nested":{"deep":{"deeper":[1,2,3]}}}"#,
        ];
        for sample in samples {
            let original = parse_json(sample).expect("sample");
            let minified = minify_json(sample).expect("minify");
            let formatted = format_json(&minified, 2).expect("format");
            assert_eq!(parse_json(&formatted).expect("reparse"), original, "{sample}");
        }
    }

    #[test]
    fn format_json_keeps_key_order() {
        let pretty = format_json(r#"{"z":1,"a":2}"#, 2).expect("format");
        assert_eq!(pretty, "{\n  \"z\": 1,\n  \"a\": 2\n}");
    }

    #[test]
    fn format_json_zero_indent_is_compact() {
        assert_eq!(format_json("{ \"z\": [1, 2] }", 0).expect("format"), r#"{"z":[1,2]}"#);
        assert_eq!(format_json("[1]", 4).expect("format"), "[\n    1\n]");
    }

    #[test]
    fn validate_json_reports_parser_message() {
        assert_eq!(
            validate_json("{}"),
            JsonValidation {
                valid: true,
                error: None
            }
        );
        let invalid = validate_json("{\"a\":}");
        assert!(!invalid.valid);
        assert!(invalid.error.is_some());
    }

    #[test]
    fn json_to_csv_basic_header_and_row() {
        let csv = json_to_csv(r#"[{"a":1,"b":2}]"#, &CsvOptions::default()).expect("csv");
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("a,b"));
        assert_eq!(lines.next(), Some("1,2"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn json_to_csv_rejects_non_arrays() {
        for input in [r#"{"a":1}"#, "1", r#""text""#, "null"] {
            let err = json_to_csv(input, &CsvOptions::default()).unwrap_err();
            assert_eq!(err, "JSON must be an array of objects");
        }
    }

    #[test]
    fn json_to_csv_quotes_and_unions_columns() {
        let options = CsvOptions {
            delimiter: ";".into(),
            header: true,
        };
        let csv = json_to_csv(r#"[{"a":"x;y"},{"b":[1,2]}]"#, &options).expect("csv");
        assert_eq!(csv, "a;b\n\"x;y\";\n;[1,2]");
        assert_eq!(json_to_csv("[]", &options).expect("empty"), "");
    }

    #[test]
    fn csv_to_json_types_cells_and_skips_blank_lines() {
        let value = csv_to_json("name,age,admin\nAda,36,true\n\nBob,,FALSE\n", &CsvOptions::default())
            .expect("csv");
        assert_eq!(
            value,
            json!([
                {"name": "Ada", "age": 36, "admin": true},
                {"name": "Bob", "age": null, "admin": false}
            ])
        );
    }

    #[test]
    fn csv_to_json_without_header_returns_rows() {
        let options = CsvOptions {
            delimiter: ",".into(),
            header: false,
        };
        let value = csv_to_json("1.5,abc\n-2,1e3", &options).expect("csv");
        assert_eq!(value, json!([[1.5, "abc"], [-2, 1000.0]]));
    }

    #[test]
    fn yaml_and_json_convert_both_ways() {
        let json_text = yaml_to_json_text("name: Ada\ntags:\n  - a\n  - b\n").expect("yaml");
        assert_eq!(parse_json(&json_text).expect("json"), json!({"name": "Ada", "tags": ["a", "b"]}));
        let yaml = json_to_yaml(r#"{"name":"Ada","n":1}"#).expect("to yaml");
        assert_eq!(yaml, "name: Ada\nn: 1\n");
    }

    #[test]
    fn text_to_html_escapes_and_splits_paragraphs() {
        assert_eq!(
            text_to_html("<b>\"hi\" & 'you'</b>\n\n\nnext"),
            "<p>&lt;b&gt;&quot;hi&quot; &amp; &#039;you&#039;&lt;/b&gt;</p>\n<p>next</p>"
        );
    }

    #[test]
    fn url_round_trips_in_both_modes() {
        let text = "café & crème/ü?x=1#frag";
        for full in [false, true] {
            let encoded = url_encode(text, full);
            assert_eq!(url_decode(&encoded, full).expect("decode"), text);
        }
        assert_eq!(url_decode("%2Fa", true).expect("full"), "%2Fa");
        assert_eq!(url_decode("%2Fa", false).expect("component"), "/a");
        assert!(url_decode("%E0%A4%A", false).is_err());
    }

    #[test]
    fn base64_handles_utf8() {
        let encoded = base64_encode("héllo ✓");
        assert_eq!(base64_decode(&encoded).expect("decode"), "héllo ✓");
        assert!(base64_decode("***").is_err());
    }
}
