use std::fmt;
use thiserror::Error;

/// Structured diagnostic payload attached to translation errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorDetail {
    /// Raw error code reported by the translation provider
    pub provider_code: Option<String>,
    /// HTTP status of the failed response
    pub http_status: Option<u16>,
}

impl ErrorDetail {
    pub fn provider_code(code: impl Into<String>) -> Self {
        Self {
            provider_code: Some(code.into()),
            http_status: None,
        }
    }

    pub const fn http_status(status: u16) -> Self {
        Self {
            provider_code: None,
            http_status: Some(status),
        }
    }
}

/// Canonical, provider-independent error kinds.
///
/// Downstream code branches on these rather than on any backend's raw codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    NoCredentials,
    InvalidCredentials,
    TextTooLong,
    InvalidLanguage,
    RateLimit,
    NetworkError,
    ApiError,
    UnknownError,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "INVALID_INPUT",
            Self::NoCredentials => "NO_CREDENTIALS",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::TextTooLong => "TEXT_TOO_LONG",
            Self::InvalidLanguage => "INVALID_LANGUAGE",
            Self::RateLimit => "RATE_LIMIT",
            Self::NetworkError => "NETWORK_ERROR",
            Self::ApiError => "API_ERROR",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Whether a caller may retry the same request unchanged.
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::RateLimit | Self::NetworkError | Self::ApiError)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for readlingo-core
///
/// Translation variants correspond one-to-one with [`ErrorKind`]; the remaining
/// variants cover cache, credential and configuration plumbing.
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // Translation Errors
    // ==========================================================================
    /// Empty or whitespace-only text
    #[error("{message}")]
    InvalidInput { message: String },

    /// Provider credentials are not configured
    #[error("{message}")]
    NoCredentials { message: String },

    /// Provider rejected the key/secret, or the account is disabled
    #[error("{message}")]
    InvalidCredentials { message: String, detail: ErrorDetail },

    /// Text exceeds the maximum accepted length
    #[error("{message}")]
    TextTooLong { message: String, detail: ErrorDetail },

    /// Unsupported language pair (also used for empty provider input)
    #[error("{message}")]
    InvalidLanguage { message: String, detail: ErrorDetail },

    /// Provider-signalled throttling
    #[error("{message}")]
    RateLimit { message: String, detail: ErrorDetail },

    /// Transport failure: non-2xx status or connection error
    #[error("{message}")]
    Network { message: String, detail: ErrorDetail },

    /// Any other non-zero provider code
    #[error("{message}")]
    Api { message: String, detail: ErrorDetail },

    /// Anything not classified above
    #[error("{message}")]
    Unknown { message: String },

    // ==========================================================================
    // Cache Errors
    // ==========================================================================
    /// Failed to initialize the cache
    #[error("failed to initialize cache: {0}")]
    CacheInit(String),

    /// Failed to read from cache
    #[error("failed to read from cache: {0}")]
    CacheRead(String),

    /// Failed to write to cache
    #[error("failed to write to cache: {0}")]
    CacheWrite(String),

    // ==========================================================================
    // Credential / Configuration Errors
    // ==========================================================================
    /// Failed to read or persist provider credentials
    #[error("credential storage error: {0}")]
    Credentials(String),

    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn no_credentials(message: impl Into<String>) -> Self {
        Self::NoCredentials {
            message: message.into(),
        }
    }

    pub fn text_too_long(message: impl Into<String>) -> Self {
        Self::TextTooLong {
            message: message.into(),
            detail: ErrorDetail::default(),
        }
    }

    pub fn invalid_language(message: impl Into<String>) -> Self {
        Self::InvalidLanguage {
            message: message.into(),
            detail: ErrorDetail::default(),
        }
    }

    pub fn network(message: impl Into<String>, detail: ErrorDetail) -> Self {
        Self::Network {
            message: message.into(),
            detail,
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }

    /// Canonical kind of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::NoCredentials { .. } => ErrorKind::NoCredentials,
            Self::InvalidCredentials { .. } => ErrorKind::InvalidCredentials,
            Self::TextTooLong { .. } => ErrorKind::TextTooLong,
            Self::InvalidLanguage { .. } => ErrorKind::InvalidLanguage,
            Self::RateLimit { .. } => ErrorKind::RateLimit,
            Self::Network { .. } => ErrorKind::NetworkError,
            Self::Api { .. } => ErrorKind::ApiError,
            Self::Unknown { .. }
            | Self::CacheInit(_)
            | Self::CacheRead(_)
            | Self::CacheWrite(_)
            | Self::Credentials(_)
            | Self::ConfigLoad(_)
            | Self::Io(_) => ErrorKind::UnknownError,
        }
    }

    /// Structured detail, when the variant carries one.
    pub const fn detail(&self) -> Option<&ErrorDetail> {
        match self {
            Self::InvalidCredentials { detail, .. }
            | Self::TextTooLong { detail, .. }
            | Self::InvalidLanguage { detail, .. }
            | Self::RateLimit { detail, .. }
            | Self::Network { detail, .. }
            | Self::Api { detail, .. } => Some(detail),
            _ => None,
        }
    }

    pub const fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(ErrorKind::RateLimit.to_string(), "RATE_LIMIT");
        assert_eq!(ErrorKind::InvalidCredentials.to_string(), "INVALID_CREDENTIALS");
        assert_eq!(ErrorKind::UnknownError.to_string(), "UNKNOWN_ERROR");
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ErrorKind::RateLimit.is_retryable());
        assert!(ErrorKind::NetworkError.is_retryable());
        assert!(ErrorKind::ApiError.is_retryable());
        assert!(!ErrorKind::NoCredentials.is_retryable());
        assert!(!ErrorKind::TextTooLong.is_retryable());
        assert!(!ErrorKind::InvalidInput.is_retryable());
    }

    #[test]
    fn test_infrastructure_errors_are_unknown_kind() {
        assert_eq!(Error::CacheWrite("disk full".into()).kind(), ErrorKind::UnknownError);
        assert!(Error::CacheWrite("disk full".into()).detail().is_none());
    }

    #[test]
    fn test_detail_preserved() {
        let err = Error::network("HTTP error: 503", ErrorDetail::http_status(503));
        assert_eq!(err.kind(), ErrorKind::NetworkError);
        assert_eq!(err.detail().and_then(|d| d.http_status), Some(503));
        assert_eq!(err.to_string(), "HTTP error: 503");
    }
}
