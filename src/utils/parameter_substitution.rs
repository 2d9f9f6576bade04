//! Parameter inlining for Cypher statement text
//!
//! Replaces `$name` placeholders with Cypher literals so a parameterized
//! statement can be printed, logged or pasted into a shell that does not take
//! parameters. Values are rendered exactly as a literal-mode statement would
//! render them.

use crate::cypher::format_literal;
use crate::cypher::ParamMap;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParameterSubstitutionError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),
}

/// Substitute parameters in statement text
///
/// `$` inside single-quoted literals is left alone.
///
/// # Errors
/// - `MissingParameter` if a placeholder is found but no value provided
///
/// # Example
/// ```ignore
/// let mut params = ParamMap::new();
/// params.insert("p0".to_string(), json!("ICDC"));
///
/// let text = "MATCH (n0:model {handle:$p0}) RETURN n0";
/// let result = inline_parameters(text, &params).unwrap();
/// // Result: "MATCH (n0:model {handle:'ICDC'}) RETURN n0"
/// ```
pub fn inline_parameters(
    text: &str,
    parameters: &ParamMap,
) -> Result<String, ParameterSubstitutionError> {
    let mut result = String::with_capacity(text.len() * 2);
    let mut chars = text.chars().peekable();
    let mut in_quote = false;
    let mut escaped = false;

    while let Some(ch) = chars.next() {
        if in_quote {
            result.push(ch);
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '\'' => in_quote = false,
                _ => {}
            }
            continue;
        }
        if ch == '\'' {
            in_quote = true;
            result.push(ch);
            continue;
        }
        if ch != '$' {
            result.push(ch);
            continue;
        }

        let mut param_name = String::new();
        while let Some(&next_ch) = chars.peek() {
            if next_ch.is_alphanumeric() || next_ch == '_' {
                param_name.push(next_ch);
                chars.next();
            } else {
                break;
            }
        }

        if param_name.is_empty() {
            // Just a lone $ character
            result.push('$');
            continue;
        }
        match parameters.get(&param_name) {
            Some(value) => result.push_str(&format_literal(value)),
            None => return Err(ParameterSubstitutionError::MissingParameter(param_name)),
        }
    }

    Ok(result)
}
