//! Reading JSON/YAML documents from disk.
//!
//! All file-backed inputs (setup documents, step maps, formatter overrides,
//! provider configs, payload files) go through [`read_document`] so that they
//! share format detection and error context.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

/// Parses a JSON or YAML file into a JSON value.
///
/// `.json` files are parsed strictly as JSON; everything else goes through
/// the YAML parser, which also accepts JSON.
pub fn read_document(file_path: impl AsRef<Path>) -> Result<Value> {
    let file_path = file_path.as_ref();
    let content = fs::read_to_string(file_path).with_context(|| format!("failed to read '{}'", file_path.display()))?;

    if has_extension(file_path, "json") {
        serde_json::from_str(&content).with_context(|| format!("failed to parse JSON in '{}'", file_path.display()))
    } else {
        serde_yaml::from_str(&content).with_context(|| format!("failed to parse YAML in '{}'", file_path.display()))
    }
}

/// Finds an optional override file: `file` as given, else `file` inside `setups_dir`.
pub fn locate_optional_file(file: &Path, setups_dir: Option<&Path>) -> Option<PathBuf> {
    if file.as_os_str().is_empty() {
        return None;
    }
    if file.is_file() {
        return Some(file.to_path_buf());
    }
    let candidate = setups_dir?.join(file);
    if candidate.is_file() {
        return Some(candidate);
    }
    debug!(file = %file.display(), "optional file not found");
    None
}

pub(crate) fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}
