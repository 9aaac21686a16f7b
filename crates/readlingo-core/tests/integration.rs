//! Integration tests for readlingo-core
//!
//! These tests verify the end-to-end translation flow:
//! - Cache-aside lookups against a mock provider
//! - Batch shape preservation
//! - Provider substitution
//! - Persistence through the sled store

use async_trait::async_trait;
use readlingo_core::{
    CacheConfig, CacheStore, EphemeralStore, Error, ErrorDetail, ErrorKind, Lang, ManualClock,
    Result, SledStore, TranslationCache, TranslationProvider, TranslationResult,
    TranslationService,
    translator::ProviderInfo,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

// =============================================================================
// Mock Provider for Testing
// =============================================================================

/// A mock provider that answers from a fixed table without network calls.
struct MockProvider {
    name: &'static str,
    answers: HashMap<String, String>,
    calls: AtomicUsize,
}

impl MockProvider {
    fn new(answers: &[(&str, &str)]) -> Self {
        Self::named("mock", answers)
    }

    fn named(name: &'static str, answers: &[(&str, &str)]) -> Self {
        Self {
            name,
            answers: answers
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranslationProvider for MockProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: self.name,
            requires_credentials: false,
        }
    }

    async fn translate(&self, text: &str, _source: &Lang, _target: &Lang) -> Result<TranslationResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answers
            .get(text.trim())
            .map(TranslationResult::new)
            .ok_or_else(|| Error::Api {
                message: format!("Mock has no answer for '{text}'"),
                detail: ErrorDetail::provider_code("302"),
            })
    }
}

/// A provider that is never configured.
struct UnconfiguredProvider;

#[async_trait]
impl TranslationProvider for UnconfiguredProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "unconfigured",
            requires_credentials: true,
        }
    }

    async fn translate(&self, _text: &str, _source: &Lang, _target: &Lang) -> Result<TranslationResult> {
        Err(Error::no_credentials("credentials not configured"))
    }

    async fn is_configured(&self) -> bool {
        false
    }
}

// =============================================================================
// Test Fixtures
// =============================================================================

fn memory_service(provider: Arc<MockProvider>) -> (TranslationService, Arc<EphemeralStore>) {
    let store = Arc::new(EphemeralStore::new());
    let cache = TranslationCache::new(store.clone(), &CacheConfig::default());
    (TranslationService::new(provider, cache), store)
}

// =============================================================================
// Cache-Aside Tests
// =============================================================================

#[tokio::test]
async fn test_translate_twice_leaves_one_entry() {
    let provider = Arc::new(MockProvider::new(&[("hello", "你好")]));
    let (service, store) = memory_service(provider.clone());

    let first = service.translate("hello").await.expect("first translation");
    let second = service.translate("hello").await.expect("second translation");

    assert_eq!(first.translation, "你好");
    assert_eq!(second, first);
    assert!(provider.calls() >= 1);

    let entries = store.scan().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].key, "hello");
}

#[tokio::test]
async fn test_concurrent_misses_may_both_reach_provider() {
    let provider = Arc::new(MockProvider::new(&[("hello", "你好")]));
    let (service, store) = memory_service(provider.clone());

    let (a, b) = tokio::join!(service.translate("hello"), service.translate("HELLO"));
    assert_eq!(a.unwrap().translation, "你好");
    assert_eq!(b.unwrap().translation, "你好");

    // At least once, not exactly once; the key still ends up with one entry
    assert!((1..=2).contains(&provider.calls()));
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_cache_hit_skips_provider() {
    let provider = Arc::new(MockProvider::new(&[]));
    let (service, _) = memory_service(provider.clone());

    service
        .preload_cache(vec![("Good Morning".to_string(), TranslationResult::new("早上好"))])
        .await
        .unwrap();

    let result = service.translate("good   morning").await.unwrap();
    assert_eq!(result.translation, "早上好");
    assert_eq!(provider.calls(), 0);

    let stats = service.cache_stats().await;
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 0);
}

#[tokio::test]
async fn test_expired_entry_is_refetched() {
    let provider = Arc::new(MockProvider::new(&[("hello", "你好")]));
    let store = Arc::new(EphemeralStore::new());
    let clock = Arc::new(ManualClock::default());
    let cache = TranslationCache::new(store.clone(), &CacheConfig::default())
        .with_clock(clock.clone());
    let service = TranslationService::new(provider.clone(), cache);

    service.translate("hello").await.unwrap();
    clock.advance(chrono::Duration::days(31));
    service.translate("hello").await.unwrap();

    assert_eq!(provider.calls(), 2);
    assert_eq!(store.count().await.unwrap(), 1);
}

// =============================================================================
// Batch Tests
// =============================================================================

#[tokio::test]
async fn test_batch_preserves_shape_on_failure() {
    let provider = Arc::new(MockProvider::new(&[("ok1", "好一")]));
    let (service, _) = memory_service(provider);

    let results = service.translate_batch(&["ok1", "ok2"]).await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].translation, "好一");
    assert_eq!(results[1], TranslationResult::empty());
}

#[tokio::test]
async fn test_batch_keeps_input_order() {
    let provider = Arc::new(MockProvider::new(&[("one", "一"), ("two", "二"), ("three", "三")]));
    let (service, _) = memory_service(provider);

    let texts = vec!["three".to_string(), "".to_string(), "one".to_string(), "two".to_string()];
    let translations: Vec<String> = service
        .translate_batch(&texts)
        .await
        .into_iter()
        .map(|r| r.translation)
        .collect();

    assert_eq!(translations, vec!["三", "", "一", "二"]);
}

// =============================================================================
// Provider Substitution Tests
// =============================================================================

#[tokio::test]
async fn test_set_adapter_changes_name_and_configuration() {
    let (service, _) = memory_service(Arc::new(MockProvider::new(&[])));
    assert_eq!(service.adapter_name(), "mock");
    assert!(service.is_configured().await);

    service.set_adapter(Arc::new(UnconfiguredProvider));
    assert_eq!(service.adapter_name(), "unconfigured");
    assert!(!service.is_configured().await);

    let err = service.translate("hello").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoCredentials);
}

#[tokio::test]
async fn test_cache_survives_adapter_swap() {
    let (service, _) = memory_service(Arc::new(MockProvider::new(&[("cat", "猫")])));
    service.translate("cat").await.unwrap();

    let replacement = Arc::new(MockProvider::named("replacement", &[("cat", "貓")]));
    service.set_adapter(replacement.clone());

    assert_eq!(service.translate("cat").await.unwrap().translation, "猫");
    assert_eq!(replacement.calls(), 0);
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[tokio::test]
async fn test_sled_backed_cache_persists_between_services() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache");

    {
        let provider = Arc::new(MockProvider::new(&[("river", "河")]));
        let cache = TranslationCache::new(
            Arc::new(SledStore::open(&path).unwrap()),
            &CacheConfig::default(),
        );
        let service = TranslationService::new(provider, cache);
        service.translate("river").await.unwrap();
    }

    let provider = Arc::new(MockProvider::new(&[]));
    let cache = TranslationCache::new(
        Arc::new(SledStore::open(&path).unwrap()),
        &CacheConfig::default(),
    );
    let service = TranslationService::new(provider.clone(), cache);

    assert_eq!(service.translate("River").await.unwrap().translation, "河");
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_clear_cache_forces_refetch() {
    let provider = Arc::new(MockProvider::new(&[("sun", "太阳")]));
    let (service, _) = memory_service(provider.clone());

    service.translate("sun").await.unwrap();
    service.clear_cache().await.unwrap();
    service.translate("sun").await.unwrap();

    assert_eq!(provider.calls(), 2);
    assert_eq!(service.clean_expired_cache().await.unwrap(), 0);
}
