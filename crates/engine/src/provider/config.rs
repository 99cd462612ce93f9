use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ActionProvider, HttpProvider, NOOP_PROVIDER_ID, NoopProvider, ProviderCatalog};
use crate::document::read_document;

/// Connection settings for one HTTP-backed provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpProviderConfig {
    pub base_url: String,
    /// Header values may reference `${env:NAME}`.
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Contents of the provider config file.
///
/// ```yaml
/// providers:
///   S3:
///     base_url: https://gateway.internal/s3
///     headers:
///       authorization: "Bearer ${env:GATEWAY_TOKEN}"
///     timeout_secs: 30
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub providers: IndexMap<String, HttpProviderConfig>,
}

impl ProvidersConfig {
    /// Reads the config file; a missing file yields an empty configuration.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            debug!(file = %path.display(), "no provider config file, using built-in providers only");
            return Ok(Self::default());
        }
        let document = read_document(path)?;
        let config: Self =
            serde_json::from_value(document).with_context(|| format!("invalid provider config '{}'", path.display()))?;
        debug!(file = %path.display(), providers = ?config.providers.keys().collect::<Vec<_>>(), "loaded provider config");
        Ok(config)
    }

    /// Registers an [`HttpProvider`] per configured id plus the `noop` provider.
    ///
    /// Providers are built on first use, so header variables are only read
    /// for providers a run actually needs.
    pub fn into_catalog(self) -> ProviderCatalog {
        let mut catalog = ProviderCatalog::new();
        catalog.register(NOOP_PROVIDER_ID, |provider_id| Ok(Arc::new(NoopProvider::new(provider_id)) as Arc<dyn ActionProvider>));
        for (provider_id, config) in self.providers {
            catalog.register(provider_id, move |provider_id| {
                Ok(Arc::new(HttpProvider::new(provider_id, &config)?) as Arc<dyn ActionProvider>)
            });
        }
        catalog
    }
}
