//! Formatter overrides loaded from a JSON/YAML file.
//!
//! The file is a tree: mappings become namespaces and string leaves become
//! text formatters. A text formatter returns its text with `{0}`, `{1}`, ...
//! replaced by the marker arguments (missing arguments expand to nothing).
//!
//! ```yaml
//! aws:
//!   region: eu-west-1
//!   arn: "arn:aws:iam::{0}:role/{1}"
//! ```

use std::{path::Path, sync::Arc};

use anyhow::{Context, Result, bail};
use serde_json::Value;
use tracing::debug;

use super::{FormatterNode, FormatterRegistry};
use crate::document::read_document;

/// Loads an override file into a registry ready to be merged over the built-ins.
pub fn load_formatter_overrides(file_path: &Path) -> Result<FormatterRegistry> {
    let document = read_document(file_path)?;
    let registry = formatters_from_value(&document).with_context(|| format!("invalid formatter file '{}'", file_path.display()))?;
    debug!(file = %file_path.display(), formatters = ?registry.names(), "loaded formatter overrides");
    Ok(registry)
}

/// Builds a registry from an already parsed override tree.
pub fn formatters_from_value(document: &Value) -> Result<FormatterRegistry> {
    let Value::Object(_) = document else {
        bail!("the formatter document must be a mapping of names to formatters");
    };
    namespace_from_value("", document)
}

fn namespace_from_value(prefix: &str, value: &Value) -> Result<FormatterRegistry> {
    let mut registry = FormatterRegistry::new();
    let Value::Object(entries) = value else {
        return Ok(registry);
    };

    for (name, entry) in entries {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };
        if name.is_empty() || name.contains('.') {
            bail!("formatter name '{path}' must be a non-empty name without dots");
        }
        let node = match entry {
            Value::String(text) => {
                let text = text.clone();
                FormatterNode::Leaf(Arc::new(move |args: &[String]| -> Result<String> { Ok(expand_positional(&text, args)) }))
            }
            Value::Object(_) => FormatterNode::Namespace(namespace_from_value(&path, entry)?),
            other => bail!("formatter '{path}' must be a string or a mapping, found {}", value_kind(other)),
        };
        registry.insert_node(name, node);
    }
    Ok(registry)
}

/// Replaces `{N}` placeholders with `args[N]`; other braces are kept verbatim.
fn expand_positional(text: &str, args: &[String]) -> String {
    let mut output = String::with_capacity(text.len());
    let mut remaining = text;

    while let Some(open) = remaining.find('{') {
        output.push_str(&remaining[..open]);
        let after_open = &remaining[open + 1..];
        let digits_len = after_open.chars().take_while(char::is_ascii_digit).count();
        let index = after_open[..digits_len].parse::<usize>().ok();

        match index {
            Some(index) if after_open[digits_len..].starts_with('}') => {
                output.push_str(args.get(index).map(String::as_str).unwrap_or_default());
                remaining = &after_open[digits_len + 1..];
            }
            _ => {
                output.push('{');
                remaining = after_open;
            }
        }
    }
    output.push_str(remaining);
    output
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
