/// Cache key for a translation query.
///
/// Keys are the query text trimmed, lowercased, with internal whitespace runs
/// collapsed to a single space, so inputs that differ only in case or spacing
/// share one entry. The language pair is not part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    normalized: String,
}

impl CacheKey {
    pub fn new(text: &str) -> Self {
        Self {
            normalized: normalize(text),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    pub fn into_string(self) -> String {
        self.normalized
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.normalized)
    }
}

/// Normalize text into its cache key form.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_and_lowercases() {
        assert_eq!(normalize("  Hello "), "hello");
        assert_eq!(normalize("HELLO"), "hello");
    }

    #[test]
    fn test_collapses_internal_whitespace() {
        assert_eq!(normalize("hello \t\n  world"), "hello world");
    }

    #[test]
    fn test_variants_share_key() {
        assert_eq!(CacheKey::new("Hello"), CacheKey::new(" hello "));
        assert_eq!(CacheKey::new("hello"), CacheKey::new("HELLO"));
    }

    #[test]
    fn test_different_words_differ() {
        assert_ne!(CacheKey::new("hello"), CacheKey::new("world"));
    }

    #[test]
    fn test_whitespace_only_is_empty() {
        assert_eq!(CacheKey::new(" \t ").as_str(), "");
    }
}
