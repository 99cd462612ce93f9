//! Shared data model for the stackup runner.
//!
//! These types are deliberately thin: setup documents and configuration values
//! stay as `serde_json` trees so that the template resolver can walk them
//! without a second representation, while the step catalog gets a typed
//! binding record.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved group key holding an explicit, ordered list of steps.
pub const STEPS_KEY: &str = "steps";

/// Groups whose name starts with this prefix are never executed.
pub const HIDDEN_GROUP_PREFIX: char = '_';

/// A configuration value inside a setup document.
pub type ConfigValue = Value;

/// The configuration blocks of a single group, keyed by config key.
pub type GroupData = Map<String, Value>;

/// A parsed setup document: group name to group data, in document order.
pub type SetupContent = Map<String, Value>;

/// Variable bindings consumed by `${name}` markers.
pub type Payload = HashMap<String, String>;

/// Binds a step name to a provider operation and the group key holding its configuration.
///
/// The serialized form uses `provider`, `operation` and `config`; the
/// `class`, `method` and `configKey` spellings of older step maps are accepted
/// as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepBinding {
    /// Identifier of the provider that executes the step.
    #[serde(alias = "class")]
    pub provider: String,
    /// Operation invoked on the provider.
    #[serde(alias = "method")]
    pub operation: String,
    /// Group key whose value is passed as the call configuration.
    #[serde(rename = "config", alias = "configKey", alias = "config_key")]
    pub config_key: String,
}

impl StepBinding {
    pub fn new(provider: impl Into<String>, operation: impl Into<String>, config_key: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            operation: operation.into(),
            config_key: config_key.into(),
        }
    }
}

/// Ordered table of step bindings keyed by step name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepMapping {
    bindings: IndexMap<String, StepBinding>,
}

impl StepMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, step: &str) -> Option<&StepBinding> {
        self.bindings.get(step)
    }

    pub fn contains(&self, step: &str) -> bool {
        self.bindings.contains_key(step)
    }

    /// Inserts or replaces the binding for `step`.
    pub fn insert(&mut self, step: impl Into<String>, binding: StepBinding) -> Option<StepBinding> {
        self.bindings.insert(step.into(), binding)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &StepBinding)> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, StepBinding)> for StepMapping {
    fn from_iter<I: IntoIterator<Item = (S, StepBinding)>>(iter: I) -> Self {
        Self {
            bindings: iter.into_iter().map(|(step, binding)| (step.into(), binding)).collect(),
        }
    }
}

/// Returns `true` when the group is excluded from execution.
pub fn is_hidden_group(group: &str) -> bool {
    group.starts_with(HIDDEN_GROUP_PREFIX)
}
