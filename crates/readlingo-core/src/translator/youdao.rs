use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::queue::DispatchQueue;
use super::response::YoudaoResponse;
use super::sign::sign;
use super::traits::{ProviderInfo, TranslationProvider};
use crate::config::{Lang, ProviderConfig};
use crate::credentials::{CredentialStore, Credentials};
use crate::error::{Error, ErrorDetail, Result};
use crate::model::TranslationResult;
use crate::util::preview;

/// Youdao text translation client.
///
/// Credentials are loaded from the credential store on first use and kept in
/// memory. Every request goes through a single [`DispatchQueue`], so the
/// provider sees at most one request in flight and a fixed pause between
/// requests regardless of how many callers are waiting.
///
/// The credential slot is a fair mutex held from credential lookup until the
/// request is enqueued, so requests are dispatched in call order even when the
/// first caller has to wait for the credential store.
pub struct YoudaoTranslator {
    client: Client,
    api_url: String,
    max_text_length: usize,
    credential_store: Arc<dyn CredentialStore>,
    credentials: Mutex<Option<Credentials>>,
    queue: DispatchQueue,
}

/// Everything one dispatched request needs, owned so it can outlive the caller's borrow.
struct SignedRequest {
    client: Client,
    api_url: String,
    credentials: Credentials,
    text: String,
    from: Lang,
    to: Lang,
}

impl YoudaoTranslator {
    pub fn new(config: &ProviderConfig, credential_store: Arc<dyn CredentialStore>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| Error::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            max_text_length: config.max_text_length,
            credential_store,
            credentials: Mutex::new(None),
            queue: DispatchQueue::new(Duration::from_millis(config.request_delay_ms)),
        })
    }

    /// Cached credentials, read from the store while none are cached. Store
    /// failures are logged and leave the provider unconfigured.
    async fn credentials(&self, slot: &mut Option<Credentials>) -> Option<Credentials> {
        if slot.is_none() {
            match self.credential_store.load().await {
                Ok(loaded) => *slot = loaded,
                Err(e) => warn!("Failed to load Youdao credentials: {}", e),
            }
        }
        slot.clone()
    }

    /// Persist new credentials and use them for subsequent requests.
    pub async fn set_credentials(
        &self,
        app_key: impl Into<String>,
        app_secret: impl Into<String>,
    ) -> Result<()> {
        let credentials = Credentials::new(app_key, app_secret);
        let mut slot = self.credentials.lock().await;
        self.credential_store.save(&credentials).await?;
        *slot = Some(credentials);
        Ok(())
    }

    fn validate(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(Error::invalid_language("Text cannot be empty"));
        }

        if text.chars().count() > self.max_text_length {
            return Err(Error::text_too_long(format!(
                "Text exceeds maximum length of {} characters",
                self.max_text_length
            )));
        }

        Ok(())
    }
}

impl SignedRequest {
    async fn send(self) -> Result<TranslationResult> {
        let salt = uuid::Uuid::new_v4().to_string();
        let curtime = chrono::Utc::now().timestamp().to_string();
        let signature = sign(
            &self.credentials.app_key,
            &self.credentials.app_secret,
            &self.text,
            &salt,
            &curtime,
        );

        let params = [
            ("q", self.text.as_str()),
            ("from", self.from.as_str()),
            ("to", self.to.as_str()),
            ("appKey", self.credentials.app_key.as_str()),
            ("salt", salt.as_str()),
            ("sign", signature.as_str()),
            ("signType", "v3"),
            ("curtime", curtime.as_str()),
        ];

        info!(
            "Requesting Youdao translation {} -> {} for '{}'",
            self.from,
            self.to,
            preview(&self.text, 50)
        );

        let response = self
            .client
            .post(&self.api_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::network(e.to_string(), ErrorDetail::default()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::network(
                format!("HTTP error: {}", status.as_u16()),
                ErrorDetail::http_status(status.as_u16()),
            ));
        }

        let body: YoudaoResponse = response.json().await.map_err(|e| {
            Error::network(
                format!("Invalid response body: {e}"),
                ErrorDetail::http_status(status.as_u16()),
            )
        })?;

        debug!("Youdao responded with errorCode {}", body.error_code);
        body.into_result()
    }
}

#[async_trait]
impl TranslationProvider for YoudaoTranslator {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "Youdao",
            requires_credentials: true,
        }
    }

    async fn translate(&self, text: &str, source: &Lang, target: &Lang) -> Result<TranslationResult> {
        self.validate(text)?;

        let mut slot = self.credentials.lock().await;
        let credentials = self
            .credentials(&mut slot)
            .await
            .filter(Credentials::is_complete)
            .ok_or_else(|| Error::no_credentials("Youdao API credentials not configured"))?;

        let request = SignedRequest {
            client: self.client.clone(),
            api_url: self.api_url.clone(),
            credentials,
            text: text.to_string(),
            from: source.clone(),
            to: target.clone(),
        };

        let pending = self.queue.enqueue(request.send()).await?;
        drop(slot);
        pending.result().await
    }

    async fn is_configured(&self) -> bool {
        let mut slot = self.credentials.lock().await;
        self.credentials(&mut slot)
            .await
            .is_some_and(|credentials| credentials.is_complete())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::MemoryCredentialStore;
    use crate::error::ErrorKind;

    fn translator(store: MemoryCredentialStore) -> YoudaoTranslator {
        let config = ProviderConfig {
            // Nothing listens here; validation must fail before any request
            api_url: "http://127.0.0.1:9/api".into(),
            ..Default::default()
        };
        YoudaoTranslator::new(&config, Arc::new(store)).unwrap()
    }

    #[tokio::test]
    async fn test_empty_text_rejected_before_credentials() {
        let youdao = translator(MemoryCredentialStore::new());
        let err = youdao
            .translate("   ", &Lang::new("en"), &Lang::new("zh-CHS"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidLanguage);
    }

    #[tokio::test]
    async fn test_overlong_text_rejected() {
        let youdao = translator(MemoryCredentialStore::with(Credentials::new("k", "s")));
        let text = "a".repeat(5001);
        let err = youdao
            .translate(&text, &Lang::new("en"), &Lang::new("zh-CHS"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TextTooLong);
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let youdao = translator(MemoryCredentialStore::new());
        assert!(!youdao.is_configured().await);

        let err = youdao
            .translate("hello", &Lang::new("en"), &Lang::new("zh-CHS"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoCredentials);
    }

    #[tokio::test]
    async fn test_incomplete_credentials_not_configured() {
        let youdao = translator(MemoryCredentialStore::with(Credentials::new("k", "")));
        assert!(!youdao.is_configured().await);
    }

    #[tokio::test]
    async fn test_set_credentials_persists() {
        let store = Arc::new(MemoryCredentialStore::new());
        let youdao = YoudaoTranslator::new(&ProviderConfig::default(), store.clone()).unwrap();

        youdao.set_credentials("app", "secret").await.unwrap();
        assert!(youdao.is_configured().await);
        assert_eq!(
            store.load().await.unwrap(),
            Some(Credentials::new("app", "secret"))
        );
    }

    #[tokio::test]
    async fn test_credentials_loaded_lazily() {
        let store = Arc::new(MemoryCredentialStore::new());
        let youdao = YoudaoTranslator::new(&ProviderConfig::default(), store.clone()).unwrap();
        assert!(!youdao.is_configured().await);

        // Saved behind the translator's back, picked up on the next check
        store.save(&Credentials::new("app", "secret")).await.unwrap();
        assert!(youdao.is_configured().await);
    }

    #[test]
    fn test_service_name() {
        let youdao = translator(MemoryCredentialStore::new());
        assert_eq!(youdao.service_name(), "Youdao");
    }
}
