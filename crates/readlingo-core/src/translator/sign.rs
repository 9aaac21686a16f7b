//! Youdao v3 request signing.
//!
//! `sign = hex(sha256(appKey + input + salt + curtime + appSecret))`, where
//! `input` is the query itself when it is at most 20 characters, and otherwise
//! its first 10 characters, its decimal length, and its last 10 characters.
//! Lengths count Unicode scalar values.

use sha2::{Digest, Sha256};

const FULL_INPUT_MAX_CHARS: usize = 20;
const EDGE_CHARS: usize = 10;

/// The form of the query that participates in the signature.
pub fn truncate_input(query: &str) -> String {
    let len = query.chars().count();
    if len <= FULL_INPUT_MAX_CHARS {
        return query.to_string();
    }

    let head: String = query.chars().take(EDGE_CHARS).collect();
    let tail: String = query.chars().skip(len - EDGE_CHARS).collect();
    format!("{head}{len}{tail}")
}

/// Lowercase hex SHA-256 signature for one request.
pub fn sign(app_key: &str, app_secret: &str, query: &str, salt: &str, curtime: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(app_key.as_bytes());
    hasher.update(truncate_input(query).as_bytes());
    hasher.update(salt.as_bytes());
    hasher.update(curtime.as_bytes());
    hasher.update(app_secret.as_bytes());
    hex::encode(hasher.finalize())
}
