//! Readlingo Core Library
//!
//! Translation layer for a reading assistant:
//! - Two-tier translation cache (bounded memory tier over a persistent store)
//! - Signed, rate-limited Youdao API client
//! - Cache-aside orchestration with batch translation and swappable providers

pub mod cache;
pub mod clock;
pub mod config;
pub mod credentials;
pub mod error;
pub mod model;
pub mod sweep;
pub mod translator;
pub mod util;

#[cfg(test)]
mod testing;

pub use cache::{CacheKey, CacheStore, EphemeralStore, SledStore, TranslationCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    AppConfig, CacheConfig, EvictionPolicy, Lang, ProviderConfig, DEFAULT_SOURCE_LANG,
    DEFAULT_TARGET_LANG,
};
pub use credentials::{CredentialStore, Credentials, FileCredentialStore, MemoryCredentialStore};
pub use error::{Error, ErrorDetail, ErrorKind, Result};
pub use model::{CacheEntry, CacheStats, TranslationResult, WebTranslation};
pub use sweep::ExpirySweepJob;
pub use translator::{TranslationProvider, YoudaoTranslator, create_translator};

use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

use crate::util::preview;

/// Single call surface for translation: cache-aside over a swappable provider.
pub struct TranslationService {
    provider: RwLock<Arc<dyn TranslationProvider>>,
    cache: TranslationCache,
    source_lang: Lang,
    target_lang: Lang,
}

impl TranslationService {
    /// Create a service translating between the default languages
    pub fn new(provider: Arc<dyn TranslationProvider>, cache: TranslationCache) -> Self {
        Self {
            provider: RwLock::new(provider),
            cache,
            source_lang: Lang::new(DEFAULT_SOURCE_LANG),
            target_lang: Lang::new(DEFAULT_TARGET_LANG),
        }
    }

    /// Wire the sled-backed cache and the Youdao client from configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let provider = create_translator(config)?;
        let cache = TranslationCache::from_config(config)?;

        Ok(Self::new(provider, cache)
            .with_languages(config.source_lang.clone(), config.target_lang.clone()))
    }

    /// Override the language pair used by [`translate`](Self::translate)
    #[must_use]
    pub fn with_languages(mut self, source: Lang, target: Lang) -> Self {
        self.source_lang = source;
        self.target_lang = target;
        self
    }

    fn provider(&self) -> Arc<dyn TranslationProvider> {
        self.provider
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Translate using the default language pair
    pub async fn translate(&self, text: &str) -> Result<TranslationResult> {
        self.translate_between(text, &self.source_lang, &self.target_lang)
            .await
    }

    /// Translate text, checking the cache first.
    ///
    /// The cache key is the normalized text only, so a cached result is served
    /// whatever `source`/`target` are. Provider errors reach the caller
    /// unchanged; a failed cache write is logged and does not fail the call.
    pub async fn translate_between(
        &self,
        text: &str,
        source: &Lang,
        target: &Lang,
    ) -> Result<TranslationResult> {
        if text.trim().is_empty() {
            return Err(Error::invalid_input("Text cannot be empty"));
        }

        if let Some(cached) = self.cache.get(text).await {
            debug!("Cache hit for '{}'", preview(text, 50));
            return Ok(cached);
        }

        let provider = self.provider();
        info!(
            "Cache miss, translating '{}' with {}",
            preview(text, 50),
            provider.service_name()
        );

        let result = provider.translate(text, source, target).await?;

        if let Err(e) = self.cache.set(text, result.clone()).await {
            warn!("Failed to cache translation for '{}': {}", preview(text, 50), e);
        }

        Ok(result)
    }

    /// Translate texts one after another using the default language pair
    pub async fn translate_batch<S: AsRef<str>>(&self, texts: &[S]) -> Vec<TranslationResult> {
        self.translate_batch_between(texts, &self.source_lang, &self.target_lang)
            .await
    }

    /// Translate texts one after another, in input order.
    ///
    /// A failed item becomes an empty placeholder, so the output always has
    /// the same length and order as the input.
    pub async fn translate_batch_between<S: AsRef<str>>(
        &self,
        texts: &[S],
        source: &Lang,
        target: &Lang,
    ) -> Vec<TranslationResult> {
        let mut results = Vec::with_capacity(texts.len());

        for text in texts {
            let text = text.as_ref();
            match self.translate_between(text, source, target).await {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!("Failed to translate '{}': {} ({})", preview(text, 50), e, e.kind());
                    results.push(TranslationResult::empty());
                }
            }
        }

        results
    }

    /// Replace the active provider
    pub fn set_adapter(&self, provider: Arc<dyn TranslationProvider>) {
        *self.provider.write().unwrap_or_else(PoisonError::into_inner) = provider;
    }

    pub async fn is_configured(&self) -> bool {
        self.provider().is_configured().await
    }

    pub fn adapter_name(&self) -> &'static str {
        self.provider().service_name()
    }

    pub const fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub async fn clear_cache(&self) -> Result<()> {
        self.cache.clear().await
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    pub async fn clean_expired_cache(&self) -> Result<usize> {
        self.cache.clean_expired().await
    }

    pub async fn preload_cache(&self, entries: Vec<(String, TranslationResult)>) -> Result<usize> {
        self.cache.preload(entries).await
    }
}
