mod queue;
mod response;
mod sign;
mod traits;
mod youdao;

pub use queue::{DispatchQueue, Pending, QUEUE_CAPACITY};
pub use response::{error_message, map_error_code};
pub use sign::{sign, truncate_input};
pub use traits::{ProviderInfo, TranslationProvider};
pub use youdao::YoudaoTranslator;

use crate::config::AppConfig;
use crate::credentials::{CredentialStore, Credentials, FileCredentialStore, MemoryCredentialStore};
use crate::error::Result;
use std::sync::Arc;

/// Credential store selected by configuration: explicit key/secret in the
/// config win over the credential file.
pub fn credential_store(config: &AppConfig) -> Arc<dyn CredentialStore> {
    match (&config.provider.app_key, &config.provider.app_secret) {
        (Some(key), Some(secret)) => Arc::new(MemoryCredentialStore::with(Credentials::new(
            key.clone(),
            secret.clone(),
        ))),
        _ => Arc::new(FileCredentialStore::new(config.credentials_path())),
    }
}

/// Create the Youdao client from configuration
pub fn create_translator(config: &AppConfig) -> Result<Arc<YoudaoTranslator>> {
    let translator = YoudaoTranslator::new(&config.provider, credential_store(config))?;
    Ok(Arc::new(translator))
}
