//! Built-in formatters.

use std::fs;

use anyhow::{Context, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::{Rng, distributions::Alphanumeric};
use stackup_util::expand_user_path;

use super::FormatterRegistry;

/// Key length used by `keyGen` when no usable length is given.
pub const DEFAULT_KEY_LENGTH: usize = 10;

pub(crate) fn install(registry: &mut FormatterRegistry) {
    registry.register("base64", |args| Ok(encode_base64(first_argument(args))));
    registry.register("keyGen", |args| Ok(generate_key(key_length(args.first().map(String::as_str)))));
    registry.register("script", load_script);
    registry.register("script64", |args| load_script(args).map(|content| encode_base64(&content)));
}

fn first_argument(args: &[String]) -> &str {
    args.first().map(String::as_str).unwrap_or_default()
}

pub fn encode_base64(value: &str) -> String {
    STANDARD.encode(value.as_bytes())
}

/// Random alphanumeric key (`[A-Za-z0-9]`) of the given length.
pub fn generate_key(length: usize) -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(length).map(char::from).collect()
}

/// Parses the leading digits of `raw`; missing, non-numeric or zero lengths fall back to the default.
pub fn key_length(raw: Option<&str>) -> usize {
    let digits: String = raw
        .unwrap_or_default()
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    match digits.parse::<usize>() {
        Ok(0) | Err(_) => DEFAULT_KEY_LENGTH,
        Ok(length) => length,
    }
}

/// `script(path, ...extra_lines)`
///
/// Reads `path` (a missing file yields an empty string), drops `#` comment
/// lines except shebangs, and prepends a `#!` block with the extra lines when
/// any are given.
pub fn load_script(args: &[String]) -> Result<String> {
    let Some((path, extra_lines)) = args.split_first() else {
        return Ok(String::new());
    };

    let path = expand_user_path(path);
    if !path.exists() {
        return Ok(String::new());
    }
    let content = fs::read_to_string(&path).with_context(|| format!("failed to read script '{}'", path.display()))?;
    let stripped = strip_comments(&content);

    if extra_lines.is_empty() {
        Ok(stripped)
    } else {
        Ok(format!("#!\n{}\n\n{}", extra_lines.join("\n"), stripped))
    }
}

fn strip_comments(content: &str) -> String {
    content
        .split('\n')
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with('#') || trimmed.starts_with("#!")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
