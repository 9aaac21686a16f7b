use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Provider language code (e.g. "en", "zh-CHS", "ja")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lang(pub String);

impl Lang {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Lang {
    fn default() -> Self {
        default_source_lang()
    }
}

fn default_source_lang() -> Lang {
    Lang::new(DEFAULT_SOURCE_LANG)
}

fn default_target_lang() -> Lang {
    Lang::new(DEFAULT_TARGET_LANG)
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Lang {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Lang {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Default source language code
pub const DEFAULT_SOURCE_LANG: &str = "en";
/// Default target language code
pub const DEFAULT_TARGET_LANG: &str = "zh-CHS";
/// Youdao text translation endpoint
pub const DEFAULT_API_URL: &str = "https://openapi.youdao.com/api";
/// Maximum accepted query length, in characters
pub const MAX_TRANSLATION_LENGTH: usize = 5000;
/// Default lifetime of a cache entry
pub const DEFAULT_TTL_DAYS: u32 = 30;

/// Translation provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Pause between the end of one dispatched request and the start of the next
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,

    /// HTTP timeout. Unset means the transport never gives up, and a hung
    /// request stalls every queued request behind it.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Credentials supplied through config instead of the credential store
    #[serde(default)]
    pub app_key: Option<String>,
    #[serde(default)]
    pub app_secret: Option<String>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

const fn default_request_delay_ms() -> u64 {
    100
}

const fn default_max_text_length() -> usize {
    MAX_TRANSLATION_LENGTH
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            request_delay_ms: default_request_delay_ms(),
            max_text_length: default_max_text_length(),
            request_timeout_secs: None,
            app_key: None,
            app_secret: None,
        }
    }
}

/// Eviction order of the in-memory tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Evict the least-recently-inserted entry; reads do not refresh position
    #[default]
    Fifo,
    /// Evict the least-recently-used entry; reads refresh position
    Lru,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum in-memory entries
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,

    #[serde(default)]
    pub eviction: EvictionPolicy,

    /// Lifetime of new entries in days
    #[serde(default = "default_ttl_days")]
    pub ttl_days: u32,

    /// Persist entries with sled; otherwise an in-process store is used
    #[serde(default = "default_true")]
    pub disk_enabled: bool,

    /// Disk cache directory (defaults to $XDG_CACHE_HOME/readlingo)
    pub disk_path: Option<PathBuf>,

    /// Period of the background expiry sweep
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

const fn default_true() -> bool {
    true
}

const fn default_memory_capacity() -> usize {
    100
}

const fn default_ttl_days() -> u32 {
    DEFAULT_TTL_DAYS
}

const fn default_sweep_interval_secs() -> u64 {
    24 * 60 * 60
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            memory_capacity: default_memory_capacity(),
            eviction: EvictionPolicy::default(),
            ttl_days: default_ttl_days(),
            disk_enabled: true,
            disk_path: None,
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_source_lang")]
    pub source_lang: Lang,

    #[serde(default = "default_target_lang")]
    pub target_lang: Lang,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    /// Credential record location (defaults to $XDG_CONFIG_HOME/readlingo/credentials.json)
    pub credentials_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source_lang: default_source_lang(),
            target_lang: default_target_lang(),
            provider: ProviderConfig::default(),
            cache: CacheConfig::default(),
            credentials_path: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::error::Error> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            crate::error::Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, crate::error::Error> {
        toml::from_str(content).map_err(|e| {
            crate::error::Error::ConfigLoad(format!("Failed to parse config: {e}"))
        })
    }

    /// Load from default locations (~/.config/readlingo/config.toml, ./config.toml)
    pub fn load() -> Self {
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join("readlingo").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        let local_config = PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Self::default()
    }

    pub fn disk_path(&self) -> PathBuf {
        self.cache
            .disk_path
            .clone()
            .unwrap_or_else(crate::util::translation_cache_path)
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.credentials_path
            .clone()
            .unwrap_or_else(crate::util::credentials_path)
    }
}
