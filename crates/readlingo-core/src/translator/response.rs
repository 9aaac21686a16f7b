use serde::Deserialize;

use crate::error::{Error, ErrorDetail};
use crate::model::{TranslationResult, WebTranslation};

/// Number of web translations turned into example lines.
const SYNTHESIZED_EXAMPLES: usize = 3;

/// Body returned by the Youdao text translation endpoint.
#[derive(Debug, Deserialize)]
pub struct YoudaoResponse {
    #[serde(rename = "errorCode")]
    pub error_code: String,
    #[serde(default)]
    pub translation: Option<Vec<String>>,
    #[serde(default)]
    pub basic: Option<Basic>,
    #[serde(default)]
    pub web: Option<Vec<WebItem>>,
}

#[derive(Debug, Deserialize)]
pub struct Basic {
    #[serde(default)]
    pub phonetic: Option<String>,
    #[serde(default, rename = "uk-phonetic")]
    pub uk_phonetic: Option<String>,
    #[serde(default, rename = "us-phonetic")]
    pub us_phonetic: Option<String>,
    #[serde(default)]
    pub explains: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct WebItem {
    pub key: String,
    #[serde(default)]
    pub value: Vec<String>,
}

impl YoudaoResponse {
    /// Convert into a result, or the canonical error for a non-zero code.
    pub fn into_result(self) -> crate::error::Result<TranslationResult> {
        if self.error_code != "0" {
            return Err(map_error_code(&self.error_code));
        }

        let translation = self
            .translation
            .and_then(|t| t.into_iter().next())
            .unwrap_or_default();

        let mut result = TranslationResult::new(translation);

        if let Some(basic) = self.basic {
            result.phonetic = [basic.uk_phonetic, basic.us_phonetic, basic.phonetic]
                .into_iter()
                .flatten()
                .find(|p| !p.is_empty());
            result.explains = basic.explains.unwrap_or_default();
        }

        result.web_translations = self
            .web
            .unwrap_or_default()
            .into_iter()
            .map(|item| WebTranslation {
                key: item.key,
                values: item.value,
            })
            .collect();

        result.examples = result
            .web_translations
            .iter()
            .take(SYNTHESIZED_EXAMPLES)
            .map(|wt| format!("{}: {}", wt.key, wt.values.join(", ")))
            .collect();

        Ok(result)
    }
}

/// Human-readable description of a Youdao error code.
pub fn error_message(code: &str) -> Option<&'static str> {
    let message = match code {
        "101" => "Missing required parameters",
        "102" => "Unsupported language type",
        "103" => "Text too long",
        "104" => "Unsupported API type",
        "105" => "Unsupported signature type",
        "106" => "Unsupported response type",
        "107" => "Unsupported encoding type",
        "108" => "Unsupported encryption type",
        "109" => "Unsupported IP address",
        "110" => "Access frequency limited",
        "111" => "Invalid account",
        "112" => "Service is not enabled",
        "113" => "Insufficient account balance",
        "201" => "Decryption failed",
        "202" => "Invalid signature",
        "203" => "Access IP restricted",
        "301" => "Dictionary query failed",
        "302" => "Translation query failed",
        "303" => "Service timeout",
        "401" => "Account has been blocked",
        _ => return None,
    };
    Some(message)
}

/// Map a non-zero Youdao error code onto the canonical taxonomy, keeping the
/// raw code as detail.
pub fn map_error_code(code: &str) -> Error {
    let message = error_message(code)
        .map_or_else(|| format!("Unknown error: {code}"), str::to_string);
    let detail = ErrorDetail::provider_code(code);

    match code {
        "110" => Error::RateLimit { message, detail },
        "103" => Error::TextTooLong { message, detail },
        "102" => Error::InvalidLanguage { message, detail },
        "111" | "112" | "113" | "202" | "401" => Error::InvalidCredentials { message, detail },
        _ => Error::Api { message, detail },
    }
}
