use async_trait::async_trait;
use crate::config::Lang;
use crate::error::Result;
use crate::model::TranslationResult;

/// Information about a translation provider
#[derive(Debug, Clone)]
pub struct ProviderInfo {
    /// Human-readable service name
    pub name: &'static str,
    /// Whether this provider needs credentials before it can translate
    pub requires_credentials: bool,
}

/// Capability implemented by every translation backend.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Get information about this provider
    fn info(&self) -> ProviderInfo;

    /// Service name (convenience method)
    fn service_name(&self) -> &'static str {
        self.info().name
    }

    /// Translate text from source language to target language
    async fn translate(
        &self,
        text: &str,
        source: &Lang,
        target: &Lang,
    ) -> Result<TranslationResult>;

    /// Whether the provider is ready to translate (e.g. credentials present)
    async fn is_configured(&self) -> bool {
        true
    }
}
