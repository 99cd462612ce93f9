//! Environment interpolation for configuration values.
//!
//! Provider credentials are never written into config files; header values
//! reference them as `${env:NAME}` and are expanded when the config loads.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

static ENV_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\$\{env:([\w-]*)\}").ok());

/// Replaces every `${env:NAME}` in `value` with the value of environment variable `NAME`.
pub fn interpolate_env(value: &str) -> Result<String, InterpolationError> {
    let pattern = ENV_PATTERN.as_ref().ok_or(InterpolationError::Pattern)?;

    let mut result = String::with_capacity(value.len());
    let mut last_end = 0;
    for captures in pattern.captures_iter(value) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let name = name.as_str();
        if name.is_empty() {
            return Err(InterpolationError::EmptyName);
        }
        let env_value = std::env::var(name).map_err(|_| InterpolationError::MissingEnvVar { name: name.to_string() })?;
        debug!("Interpolated env var: {} -> [REDACTED]", name);
        result.push_str(&value[last_end..whole.start()]);
        result.push_str(&env_value);
        last_end = whole.end();
    }
    result.push_str(&value[last_end..]);
    Ok(result)
}

/// Errors that can occur during interpolation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InterpolationError {
    #[error("Missing environment variable: {name}")]
    MissingEnvVar { name: String },

    #[error("Empty environment variable reference: ${{env:}}")]
    EmptyName,

    #[error("environment interpolation pattern failed to compile")]
    Pattern,
}
