//! # Template Resolution
//!
//! This module rewrites configuration values that contain template markers
//! into concrete values. Resolution is pure: the input tree is never mutated
//! and a new tree is returned.
//!
//! ## Template Syntax
//!
//! - `${name}` / `${name|default}` - payload variable, falling back to
//!   `default` (or the empty string) when the payload has no such key
//! - `%{path.to.formatter}` / `%{path.to.formatter:arg1,arg2}` - formatter call,
//!   with comma-separated, trimmed arguments
//!
//! ## Resolution Order
//!
//! Markers are resolved right to left. On every pass the scanner looks for the
//! last `${` and the last `%{` before their respective boundaries and resolves
//! whichever opens later. Resolving a marker moves the boundary of its own
//! kind to the marker's former start, while the other kind's boundary stays
//! put. This makes inner markers resolve before the markers enclosing them,
//! e.g. `%{base64:${user}}` substitutes `user` first and encodes the result.
//!
//! ## Usage
//!
//! ```rust
//! use stackup_engine::formatters::FormatterRegistry;
//! use stackup_engine::resolve::resolve_value;
//! use stackup_types::Payload;
//! use serde_json::json;
//!
//! let formatters = FormatterRegistry::with_builtins();
//! let mut payload = Payload::new();
//! payload.insert("env".into(), "prod".into());
//!
//! let value = json!({
//!     "name": "web-${env}",
//!     "tier": "${tier|small}",
//!     "token": "%{base64:${env}}"
//! });
//!
//! let resolved = resolve_value(&value, &payload, &formatters)?;
//! assert_eq!(resolved["name"], "web-prod");
//! assert_eq!(resolved["tier"], "small");
//! assert_eq!(resolved["token"], "cHJvZA==");
//! # Ok::<(), stackup_engine::EngineError>(())
//! ```

use serde_json::{Map, Value};
use stackup_types::{ConfigValue, Payload};

use crate::{error::EngineError, formatters::FormatterRegistry};

const VARIABLE_OPEN: &str = "${";
const FORMATTER_OPEN: &str = "%{";
const MARKER_CLOSE: char = '}';
const DEFAULT_SEPARATOR: char = '|';
const ARGUMENT_SEPARATOR: char = ':';

/// The two marker kinds understood by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Variable,
    Formatter,
}

impl MarkerKind {
    pub fn opening(self) -> &'static str {
        match self {
            MarkerKind::Variable => VARIABLE_OPEN,
            MarkerKind::Formatter => FORMATTER_OPEN,
        }
    }
}

/// Recursively resolves every template marker in `value`.
///
/// Mappings keep their keys, sequences keep their order and length, and
/// non-string scalars are returned unchanged.
pub fn resolve_value(value: &ConfigValue, payload: &Payload, formatters: &FormatterRegistry) -> Result<ConfigValue, EngineError> {
    match value {
        Value::String(text) => resolve_string(text, payload, formatters).map(Value::String),
        Value::Array(items) => items
            .iter()
            .map(|item| resolve_value(item, payload, formatters))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(entries) => {
            let mut resolved = Map::with_capacity(entries.len());
            for (key, entry) in entries {
                resolved.insert(key.clone(), resolve_value(entry, payload, formatters)?);
            }
            Ok(Value::Object(resolved))
        }
        _ => Ok(value.clone()),
    }
}

/// Resolves all markers in a single string.
///
/// # Errors
///
/// - [`EngineError::MalformedTemplate`] when an opening token has no closing `}`
/// - [`EngineError::UnknownFormatter`] when a formatter path does not exist
/// - [`EngineError::FormatterFailed`] when a formatter returns an error
pub fn resolve_string(input: &str, payload: &Payload, formatters: &FormatterRegistry) -> Result<String, EngineError> {
    let mut text = input.to_string();
    let mut variable_boundary = text.len();
    let mut formatter_boundary = text.len();

    loop {
        let variable_start = last_opening(&text, VARIABLE_OPEN, variable_boundary);
        let formatter_start = last_opening(&text, FORMATTER_OPEN, formatter_boundary);

        let (kind, start) = match (variable_start, formatter_start) {
            (None, None) => break,
            (Some(variable), Some(formatter)) if formatter > variable => (MarkerKind::Formatter, formatter),
            (Some(variable), _) => (MarkerKind::Variable, variable),
            (None, Some(formatter)) => (MarkerKind::Formatter, formatter),
        };
        match kind {
            MarkerKind::Variable => variable_boundary = start,
            MarkerKind::Formatter => formatter_boundary = start,
        }

        let body_start = start + kind.opening().len();
        let Some(close_offset) = text[body_start..].find(MARKER_CLOSE) else {
            return Err(EngineError::MalformedTemplate {
                template: input.to_string(),
                marker: kind.opening(),
                position: start,
            });
        };
        let body_end = body_start + close_offset;
        let body = &text[body_start..body_end];

        let replacement = match kind {
            MarkerKind::Variable => substitute_variable(body, payload),
            MarkerKind::Formatter => apply_formatter(body, formatters)?,
        };
        if let Some(replacement) = replacement {
            text.replace_range(start..body_end + MARKER_CLOSE.len_utf8(), &replacement);
        }
    }

    Ok(text)
}

/// Position of the last `token` that lies entirely before `boundary`.
fn last_opening(text: &str, token: &str, boundary: usize) -> Option<usize> {
    let mut boundary = boundary.min(text.len());
    while !text.is_char_boundary(boundary) {
        boundary -= 1;
    }
    text[..boundary].rfind(token)
}

/// `name` or `name|default`; an empty name leaves the marker untouched.
fn substitute_variable(body: &str, payload: &Payload) -> Option<String> {
    let (name, default) = match body.split_once(DEFAULT_SEPARATOR) {
        Some((name, default)) => (name, default),
        None => (body, ""),
    };
    if name.is_empty() {
        return None;
    }
    Some(payload.get(name).cloned().unwrap_or_else(|| default.to_string()))
}

/// `path` or `path:arg1,arg2`; an empty path leaves the marker untouched.
fn apply_formatter(body: &str, formatters: &FormatterRegistry) -> Result<Option<String>, EngineError> {
    let (path, arguments) = match body.split_once(ARGUMENT_SEPARATOR) {
        Some((path, arguments)) => (path, arguments),
        None => (body, ""),
    };
    if path.is_empty() {
        return Ok(None);
    }

    let arguments: Vec<String> = if arguments.is_empty() {
        Vec::new()
    } else {
        arguments.split(',').map(|argument| argument.trim().to_string()).collect()
    };
    formatters.call(path, &arguments).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(entries: &[(&str, &str)]) -> Payload {
        entries.iter().map(|(key, value)| (key.to_string(), value.to_string())).collect()
    }

    fn resolve(text: &str, payload: &Payload) -> Result<String, EngineError> {
        resolve_string(text, payload, &FormatterRegistry::with_builtins())
    }

    #[test]
    fn marker_free_values_are_unchanged() {
        let formatters = FormatterRegistry::with_builtins();
        let value = json!({
            "name": "plain",
            "count": 3,
            "ratio": 0.5,
            "enabled": false,
            "nothing": null,
            "list": ["a", {"b": [1, 2]}],
            "braces": "{not a marker} $ % }"
        });
        assert_eq!(resolve_value(&value, &Payload::new(), &formatters).unwrap(), value);
    }

    #[test]
    fn variables_use_payload_then_default() {
        assert_eq!(resolve("${x}", &payload(&[("x", "v")])).unwrap(), "v");
        assert_eq!(resolve("${x|d}", &Payload::new()).unwrap(), "d");
        assert_eq!(resolve("${x|d}", &payload(&[("x", "v")])).unwrap(), "v");
        assert_eq!(resolve("[${x}]", &Payload::new()).unwrap(), "[]");
        assert_eq!(resolve("${x|a|b}", &Payload::new()).unwrap(), "a|b");
    }

    #[test]
    fn formatters_receive_trimmed_arguments() {
        assert_eq!(resolve("%{base64:hello}", &Payload::new()).unwrap(), "aGVsbG8=");
        assert_eq!(resolve("%{base64: hello }", &Payload::new()).unwrap(), "aGVsbG8=");
        assert_eq!(resolve("%{base64:}", &Payload::new()).unwrap(), "");

        let mut formatters = FormatterRegistry::new();
        formatters.register("join", |args| Ok(args.join("+")));
        assert_eq!(resolve_string("%{join: a , b,c }", &Payload::new(), &formatters).unwrap(), "a+b+c");
        assert_eq!(resolve_string("%{join}", &Payload::new(), &formatters).unwrap(), "");
    }

    #[test]
    fn key_gen_produces_alphanumeric_keys() {
        let key = resolve("%{keyGen:5}", &Payload::new()).unwrap();
        assert_eq!(key.len(), 5);
        assert!(key.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(resolve("%{keyGen}", &Payload::new()).unwrap().len(), 10);
    }

    #[test]
    fn unknown_formatters_are_fatal() {
        let error = resolve("%{missing.path}", &Payload::new()).expect_err("unknown formatter");
        assert!(matches!(error, EngineError::UnknownFormatter { ref path } if path == "missing.path"));
        assert!(error.to_string().contains("missing.path"));
    }

    #[test]
    fn unterminated_markers_are_fatal() {
        let error = resolve("abc ${x", &Payload::new()).expect_err("unterminated variable");
        assert!(matches!(
            error,
            EngineError::MalformedTemplate {
                marker: "${",
                position: 4,
                ..
            }
        ));

        let error = resolve("%{base64:x", &Payload::new()).expect_err("unterminated formatter");
        assert!(matches!(error, EngineError::MalformedTemplate { marker: "%{", .. }));
    }

    #[test]
    fn inner_markers_resolve_first() {
        let user = payload(&[("user", "hello")]);
        assert_eq!(resolve("%{base64:${user}}", &user).unwrap(), "aGVsbG8=");
        assert_eq!(resolve("${missing|%{base64:hello}}", &Payload::new()).unwrap(), "aGVsbG8=");
    }

    #[test]
    fn multiple_markers_resolve_right_to_left() {
        let mut formatters = FormatterRegistry::new();
        formatters.register("upper", |args| Ok(args.first().map(|arg| arg.to_uppercase()).unwrap_or_default()));
        let bindings = payload(&[("a", "one"), ("b", "two")]);

        let resolved = resolve_string("${a}-%{upper:${b}}-${a}-%{upper:x}", &bindings, &formatters).unwrap();
        assert_eq!(resolved, "one-TWO-one-X");
    }

    #[test]
    fn substituted_values_are_not_rescanned_for_variables() {
        let bindings = payload(&[("a", "${b}"), ("b", "nested")]);
        assert_eq!(resolve("${a}", &bindings).unwrap(), "${b}");
    }

    #[test]
    fn empty_markers_are_left_verbatim() {
        assert_eq!(resolve("${}", &Payload::new()).unwrap(), "${}");
        assert_eq!(resolve("%{}", &Payload::new()).unwrap(), "%{}");
        assert_eq!(resolve("${|d} ${x|y}", &Payload::new()).unwrap(), "${|d} y");
    }

    #[test]
    fn multibyte_text_around_markers_is_preserved() {
        let bindings = payload(&[("city", "Zürich")]);
        assert_eq!(resolve("→ ${city} ✓ %{base64:é}", &bindings).unwrap(), "→ Zürich ✓ w6k=");
    }

    #[test]
    fn resolution_is_idempotent() {
        let formatters = FormatterRegistry::with_builtins();
        let bindings = payload(&[("n", "y")]);
        let value = json!({"v": "${n|x}", "list": ["%{base64:abc}", 1]});

        let once = resolve_value(&value, &bindings, &formatters).unwrap();
        let twice = resolve_value(&once, &bindings, &formatters).unwrap();
        assert_eq!(once, json!({"v": "y", "list": ["YWJj", 1]}));
        assert_eq!(once, twice);
    }

    #[test]
    fn resolution_does_not_mutate_the_source_tree() {
        let formatters = FormatterRegistry::with_builtins();
        let value = json!({"nested": {"v": "${n|x}"}, "list": ["${n|x}"]});
        let snapshot = value.clone();

        let resolved = resolve_value(&value, &Payload::new(), &formatters).unwrap();
        assert_eq!(value, snapshot);
        assert_eq!(resolved, json!({"nested": {"v": "x"}, "list": ["x"]}));
    }
}
