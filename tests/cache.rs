//! Resolution cache behavior observed through the batch resolver

mod helper;

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::time::Duration;

use helper::{FakeRegistry, create_batch_resolver, create_test_resolver};
use version_resolver::service::BatchResolver;
use version_resolver::version::cache::ResolutionCache;
use version_resolver::version::types::{Ecosystem, ResolutionRequest};

const TIMEOUT: Duration = Duration::from_secs(5);

fn pypi_registry() -> FakeRegistry {
    FakeRegistry::new(Ecosystem::PyPI)
        .with_versions("flask", &["2.3.3", "3.0.3"])
        .with_versions("django", &["4.2.16", "5.1.2"])
        .with_versions("requests", &["2.32.3"])
}

fn resolver_with_cache(registry: FakeRegistry, cache: ResolutionCache) -> BatchResolver {
    let resolver = create_test_resolver(registry);
    BatchResolver::new(
        HashMap::from([(Ecosystem::PyPI, resolver)]),
        cache,
        4,
        TIMEOUT,
    )
}

#[tokio::test]
async fn spellings_of_one_package_share_an_entry() {
    let registry = pypi_registry();
    let fetches = registry.fetches();
    let resolver = create_batch_resolver(vec![create_test_resolver(registry)], TIMEOUT);

    let first = resolver
        .resolve(&ResolutionRequest::new(Ecosystem::PyPI, "Flask"))
        .await
        .unwrap();
    let second = resolver
        .resolve(&ResolutionRequest::new(Ecosystem::PyPI, "flask"))
        .await
        .unwrap();

    assert_eq!(first.package_name, "Flask");
    assert_eq!(second.package_name, "flask");
    assert_eq!(second.latest_version, "3.0.3");
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn blank_and_padded_hints_share_an_entry() {
    let registry = pypi_registry();
    let fetches = registry.fetches();
    let resolver = create_batch_resolver(vec![create_test_resolver(registry)], TIMEOUT);

    resolver
        .resolve_batch(&[
            ResolutionRequest::new(Ecosystem::PyPI, "django").with_hint(" 4.2 "),
            ResolutionRequest::new(Ecosystem::PyPI, "django").with_hint("4.2"),
            ResolutionRequest::new(Ecosystem::PyPI, "requests").with_hint("   "),
            ResolutionRequest::new(Ecosystem::PyPI, "requests"),
        ])
        .await;

    assert_eq!(fetches.load(Ordering::SeqCst), 2);
    assert_eq!(resolver.cache().len(), 2);
}

#[tokio::test]
async fn include_extra_is_cached_separately() {
    let registry = pypi_registry();
    let fetches = registry.fetches();
    let resolver = create_batch_resolver(vec![create_test_resolver(registry)], TIMEOUT);

    resolver
        .resolve(&ResolutionRequest::new(Ecosystem::PyPI, "flask"))
        .await
        .unwrap();
    resolver
        .resolve(&ResolutionRequest::new(Ecosystem::PyPI, "flask").with_extra(true))
        .await
        .unwrap();

    assert_eq!(fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failures_are_retried() {
    let registry = pypi_registry();
    let fetches = registry.fetches();
    let resolver = create_batch_resolver(vec![create_test_resolver(registry)], TIMEOUT);
    let request = ResolutionRequest::new(Ecosystem::PyPI, "missing");

    assert!(resolver.resolve(&request).await.is_err());
    assert!(resolver.resolve(&request).await.is_err());

    assert_eq!(fetches.load(Ordering::SeqCst), 2);
    assert!(resolver.cache().is_empty());
}

#[tokio::test(start_paused = true)]
async fn expired_entries_are_fetched_again() {
    let registry = pypi_registry();
    let fetches = registry.fetches();
    let resolver = resolver_with_cache(
        registry,
        ResolutionCache::new(Duration::from_secs(60), 100),
    );
    let request = ResolutionRequest::new(Ecosystem::PyPI, "flask");

    resolver.resolve(&request).await.unwrap();
    tokio::time::advance(Duration::from_secs(30)).await;
    resolver.resolve(&request).await.unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 1);

    tokio::time::advance(Duration::from_secs(31)).await;
    resolver.resolve(&request).await.unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn entry_count_stays_within_bound() {
    let registry = pypi_registry();
    let fetches = registry.fetches();
    let resolver = resolver_with_cache(registry, ResolutionCache::new(Duration::from_secs(60), 2));

    for name in ["flask", "django", "requests"] {
        resolver
            .resolve(&ResolutionRequest::new(Ecosystem::PyPI, name))
            .await
            .unwrap();
    }
    assert_eq!(resolver.cache().len(), 2);

    // Least recently used entry was evicted
    resolver
        .resolve(&ResolutionRequest::new(Ecosystem::PyPI, "flask"))
        .await
        .unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 4);
}
