//! Fakes shared by unit tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::Lang;
use crate::error::{Error, Result};
use crate::model::TranslationResult;
use crate::translator::{ProviderInfo, TranslationProvider};

/// Returns the same translation for every input and counts calls.
pub struct StaticProvider {
    translation: String,
    fail_on: Option<String>,
    pub calls: AtomicUsize,
}

impl StaticProvider {
    pub fn new(translation: &str) -> Self {
        Self {
            translation: translation.to_string(),
            fail_on: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail with a rate-limit error whenever asked to translate `text`.
    pub fn failing_on(mut self, text: &str) -> Self {
        self.fail_on = Some(text.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranslationProvider for StaticProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "static",
            requires_credentials: false,
        }
    }

    async fn translate(&self, text: &str, _source: &Lang, _target: &Lang) -> Result<TranslationResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on.as_deref() == Some(text) {
            return Err(Error::RateLimit {
                message: "Access frequency limited".into(),
                detail: crate::error::ErrorDetail::provider_code("110"),
            });
        }
        Ok(TranslationResult::new(self.translation.clone()))
    }
}
