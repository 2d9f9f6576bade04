//! Literal rendering shared by properties and parameter inlining.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// A string value that already names a parameter (`$foo`) is emitted verbatim.
static PARAMETER_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\$").expect("valid parameter reference regex"));

/// Whether property values are written inline or as `$variable` placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    #[default]
    Literal,
    Parameterized,
}

impl RenderMode {
    pub fn from_use_params(use_params: bool) -> Self {
        if use_params {
            RenderMode::Parameterized
        } else {
            RenderMode::Literal
        }
    }
}

/// The three places an entity can appear in a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderContext {
    /// MATCH / CREATE / MERGE patterns: `(n0:label {k:v})`
    Pattern,
    /// WHERE / SET conditions: `n0.k = v`
    Condition,
    /// RETURN / WITH items: `n0 as alias`
    Return,
}

pub fn is_parameter_reference(s: &str) -> bool {
    PARAMETER_REFERENCE.is_match(s)
}

/// Escape a string for a single-quoted Cypher literal.
fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Render a property value as inline Cypher text.
///
/// Numbers and booleans are unquoted. Strings are quoted unless they look like
/// a parameter reference, in which case they are passed through untouched.
pub fn format_literal(value: &Value) -> String {
    match value {
        Value::String(s) if is_parameter_reference(s) => s.clone(),
        other => format_value(other),
    }
}

/// Render any JSON value as a Cypher literal, always quoting strings.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", escape_string(s)),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", k, format_value(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}
