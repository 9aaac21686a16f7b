use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::TranslationService;
use crate::config::CacheConfig;

const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Periodically removes expired entries from the persistent cache tier.
pub struct ExpirySweepJob {
    service: Arc<TranslationService>,
    interval: Duration,
    shutdown: CancellationToken,
}

impl ExpirySweepJob {
    pub fn new(service: Arc<TranslationService>, interval: Duration) -> Self {
        Self {
            service,
            interval: interval.max(MIN_INTERVAL),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn from_config(service: Arc<TranslationService>, config: &CacheConfig) -> Self {
        Self::new(service, Duration::from_secs(config.sweep_interval_secs))
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Run until cancelled. The first sweep happens immediately.
    pub fn start(self) -> JoinHandle<()> {
        info!(
            interval_secs = self.interval.as_secs(),
            "Starting translation cache sweep job"
        );

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            loop {
                tokio::select! {
                    () = self.shutdown.cancelled() => {
                        info!("ExpirySweepJob: shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        match self.service.clean_expired_cache().await {
                            Ok(removed) => info!(removed, "Translation cache sweep completed"),
                            Err(e) => error!(error = %e, "Translation cache sweep failed"),
                        }
                    }
                }
            }
        })
    }
}
