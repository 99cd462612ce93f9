//! Step name to provider operation binding.
//!
//! [`ActionRegistry`] owns the provider instance cache (one instance per
//! provider id) and the bound-action cache (one entry per step name).

use std::{collections::HashMap, fmt, sync::Arc};

use serde_json::Value;
use stackup_types::{StepBinding, StepMapping};
use tracing::debug;

use crate::{
    error::EngineError,
    provider::{ActionError, ActionProvider, ProviderCatalog},
};

/// A step bound to its provider operation.
#[derive(Clone)]
pub struct BoundAction {
    pub step: String,
    pub binding: StepBinding,
    provider: Arc<dyn ActionProvider>,
}

impl BoundAction {
    pub fn call(&self, config: &Value) -> CallOutcome {
        match self.provider.invoke(&self.binding.operation, config) {
            Ok(output) => CallOutcome::Succeeded(output),
            Err(error) => CallOutcome::Failed(error),
        }
    }
}

impl fmt::Debug for BoundAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundAction")
            .field("step", &self.step)
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}

/// Result of one provider call. Failures are values so the caller always continues.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    Succeeded(Value),
    Failed(ActionError),
}

impl CallOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CallOutcome::Succeeded(_))
    }
}

pub struct ActionRegistry {
    step_mapping: StepMapping,
    catalog: ProviderCatalog,
    instances: HashMap<String, Arc<dyn ActionProvider>>,
    actions: HashMap<String, BoundAction>,
}

impl ActionRegistry {
    pub fn new(step_mapping: StepMapping, catalog: ProviderCatalog) -> Self {
        Self {
            step_mapping,
            catalog,
            instances: HashMap::new(),
            actions: HashMap::new(),
        }
    }

    pub fn binding(&self, step: &str) -> Result<&StepBinding, EngineError> {
        self.step_mapping
            .get(step)
            .ok_or_else(|| EngineError::UnknownStep { step: step.to_string() })
    }

    /// Returns the bound action for `step`, creating the provider instance on first use.
    pub fn action(&mut self, step: &str) -> Result<&BoundAction, EngineError> {
        if !self.actions.contains_key(step) {
            let binding = self.binding(step)?.clone();
            let provider = self.provider(&binding.provider, step)?;
            debug!(step = %step, provider = %binding.provider, operation = %binding.operation, "bound action");
            self.actions.insert(
                step.to_string(),
                BoundAction {
                    step: step.to_string(),
                    binding,
                    provider,
                },
            );
        }
        self.actions
            .get(step)
            .ok_or_else(|| EngineError::UnknownStep { step: step.to_string() })
    }

    /// Calls the action bound to `step`. Only binding faults are `Err`.
    pub fn invoke(&mut self, step: &str, config: &Value) -> Result<CallOutcome, EngineError> {
        Ok(self.action(step)?.call(config))
    }

    /// Number of provider instances created so far.
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    fn provider(&mut self, provider_id: &str, step: &str) -> Result<Arc<dyn ActionProvider>, EngineError> {
        if let Some(provider) = self.instances.get(provider_id) {
            return Ok(Arc::clone(provider));
        }
        let provider = self.catalog.build(provider_id, step)?;
        debug!(provider = %provider_id, "created provider instance");
        self.instances.insert(provider_id.to_string(), Arc::clone(&provider));
        Ok(provider)
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("steps", &self.step_mapping.len())
            .field("catalog", &self.catalog)
            .field("instances", &self.instances.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
