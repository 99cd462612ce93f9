use std::{collections::HashMap, fmt, sync::Arc};

use anyhow::Result;

use super::{ActionProvider, NoopProvider};
use crate::error::EngineError;

/// Builds the provider instance for a provider identifier.
pub type ProviderFactory = Arc<dyn Fn(&str) -> Result<Arc<dyn ActionProvider>> + Send + Sync>;

/// Registration table of provider factories, keyed by provider identifier.
///
/// The catalog only knows how to build providers; instances are created and
/// cached by [`crate::actions::ActionRegistry`]. A fallback factory, when set,
/// serves every identifier without an explicit registration.
#[derive(Clone, Default)]
pub struct ProviderCatalog {
    factories: HashMap<String, ProviderFactory>,
    fallback: Option<ProviderFactory>,
}

impl ProviderCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, provider_id: impl Into<String>, factory: F)
    where
        F: Fn(&str) -> Result<Arc<dyn ActionProvider>> + Send + Sync + 'static,
    {
        self.factories.insert(provider_id.into(), Arc::new(factory));
    }

    /// Registers an already constructed provider.
    pub fn register_instance(&mut self, provider_id: impl Into<String>, provider: Arc<dyn ActionProvider>) {
        self.register(provider_id, move |_| Ok(Arc::clone(&provider)));
    }

    pub fn set_fallback<F>(&mut self, factory: F)
    where
        F: Fn(&str) -> Result<Arc<dyn ActionProvider>> + Send + Sync + 'static,
    {
        self.fallback = Some(Arc::new(factory));
    }

    pub fn with_fallback<F>(mut self, factory: F) -> Self
    where
        F: Fn(&str) -> Result<Arc<dyn ActionProvider>> + Send + Sync + 'static,
    {
        self.set_fallback(factory);
        self
    }

    /// Catalog that routes every provider id to [`NoopProvider`].
    pub fn dry_run() -> Self {
        Self::new().with_fallback(|provider_id| Ok(Arc::new(NoopProvider::new(provider_id)) as Arc<dyn ActionProvider>))
    }

    pub fn supports(&self, provider_id: &str) -> bool {
        self.fallback.is_some() || self.factories.contains_key(provider_id)
    }

    /// Builds a fresh provider for `provider_id`; `step` only feeds error messages.
    pub fn build(&self, provider_id: &str, step: &str) -> Result<Arc<dyn ActionProvider>, EngineError> {
        let factory = self
            .factories
            .get(provider_id)
            .or(self.fallback.as_ref())
            .ok_or_else(|| EngineError::UnknownProvider {
                provider: provider_id.to_string(),
                step: step.to_string(),
            })?;
        factory(provider_id).map_err(|source| EngineError::ProviderInit {
            provider: provider_id.to_string(),
            source,
        })
    }

    pub fn provider_ids(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl fmt::Debug for ProviderCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut provider_ids: Vec<&str> = self.provider_ids().collect();
        provider_ids.sort_unstable();
        f.debug_struct("ProviderCatalog")
            .field("providers", &provider_ids)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}
