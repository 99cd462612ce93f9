use serde_json::{Value, json};
use tracing::debug;

use super::{ActionError, ActionProvider};

/// Provider identifier that always resolves to [`NoopProvider`].
pub const NOOP_PROVIDER_ID: &str = "noop";

/// No-op provider: echoes the call instead of performing it.
///
/// Used for dry runs and tests.
#[derive(Debug, Clone)]
pub struct NoopProvider {
    provider_id: String,
}

impl NoopProvider {
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
        }
    }
}

impl Default for NoopProvider {
    fn default() -> Self {
        Self::new(NOOP_PROVIDER_ID)
    }
}

impl ActionProvider for NoopProvider {
    fn invoke(&self, operation: &str, config: &Value) -> Result<Value, ActionError> {
        debug!(provider = %self.provider_id, operation = %operation, config = %config, "noop provider call");
        Ok(json!({
            "provider": self.provider_id,
            "operation": operation,
            "config": config,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echoes_the_call() {
        let provider = NoopProvider::new("S3");
        let output = provider.invoke("createBucket", &json!({"Bucket": "assets"})).unwrap();

        assert_eq!(
            output,
            json!({"provider": "S3", "operation": "createBucket", "config": {"Bucket": "assets"}})
        );
    }
}
