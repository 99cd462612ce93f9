//! Step mapping: the built-in table plus optional overrides.
//!
//! Overrides are deep-merged over the built-ins at the document level, so an
//! override entry may replace a whole binding or only some of its fields.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use stackup_types::StepMapping;
use stackup_util::deep_merge;
use tracing::debug;

use crate::document::read_document;

const BUILTIN_STEP_MAP: &str = include_str!("../data/stepmap.json");

fn builtin_document() -> Result<Value> {
    serde_json::from_str(BUILTIN_STEP_MAP).context("the built-in step map is not valid JSON")
}

pub fn builtin_step_mapping() -> Result<StepMapping> {
    serde_json::from_value(builtin_document()?).context("the built-in step map is invalid")
}

/// Deep-merges `overlay` over `base`; overlay entries win.
pub fn merge_step_mapping(base: &StepMapping, overlay: Value) -> Result<StepMapping> {
    let mut document = serde_json::to_value(base).context("could not serialize the step map")?;
    deep_merge(&mut document, overlay);
    serde_json::from_value(document).context("invalid step map entry")
}

/// Built-in step mapping merged with the override file, when one is given.
pub fn load_step_mapping(override_file: Option<&Path>) -> Result<StepMapping> {
    let builtin = builtin_step_mapping()?;
    let Some(override_file) = override_file else {
        debug!(steps = builtin.len(), "using the built-in step map");
        return Ok(builtin);
    };

    let overlay = read_document(override_file)?;
    let mapping =
        merge_step_mapping(&builtin, overlay).with_context(|| format!("cannot use the step map at '{}'", override_file.display()))?;
    debug!(file = %override_file.display(), steps = mapping.len(), "loaded step map override");
    Ok(mapping)
}
