//! Small helpers shared by the stackup engine and CLI.

pub mod interpolation;
pub mod json_merge;
pub mod path_processing;

pub use interpolation::{InterpolationError, interpolate_env};
pub use json_merge::deep_merge;
pub use path_processing::expand_user_path;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static SENSITIVE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)((?:authorization|x-api-key|x-amz-security-token)\s*:\s*)(\S.*)",
        r"(?i)([A-Z0-9_]*(?:KEY|TOKEN|SECRET|PASSWORD)\s*=\s*)(\S+)",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Redacts values that look like secrets in a `name: value` or `NAME=value` line.
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for pattern in SENSITIVE_PATTERNS.iter() {
        redacted = pattern
            .replace_all(&redacted, |caps: &Captures| {
                let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                format!("{prefix}<redacted>")
            })
            .to_string();
    }
    redacted
}
