//! Registry test utilities

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use version_resolver::service::{BatchResolver, EcosystemResolver};
use version_resolver::version::cache::ResolutionCache;
use version_resolver::version::connectors::connector_for;
use version_resolver::version::error::RegistryError;
use version_resolver::version::registry::Registry;
use version_resolver::version::types::{Ecosystem, PackageVersions, VersionDetails};

/// In-memory registry counting its fetches
pub struct FakeRegistry {
    ecosystem: Ecosystem,
    versions: HashMap<String, Vec<String>>,
    digests: HashMap<String, String>,
    delay: Option<Duration>,
    fetches: Arc<AtomicUsize>,
}

impl FakeRegistry {
    pub fn new(ecosystem: Ecosystem) -> Self {
        Self {
            ecosystem,
            versions: HashMap::new(),
            digests: HashMap::new(),
            delay: None,
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_versions(mut self, package: &str, versions: &[&str]) -> Self {
        self.versions.insert(
            package.to_string(),
            versions.iter().map(|v| v.to_string()).collect(),
        );
        self
    }

    pub fn with_digest(mut self, version: &str, digest: &str) -> Self {
        self.digests.insert(version.to_string(), digest.to_string());
        self
    }

    /// Sleep before answering every listing request
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Shared counter of `fetch_all_versions` calls
    pub fn fetches(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.fetches)
    }
}

#[async_trait]
impl Registry for FakeRegistry {
    fn ecosystem(&self) -> Ecosystem {
        self.ecosystem
    }

    async fn fetch_all_versions(
        &self,
        package_name: &str,
    ) -> Result<PackageVersions, RegistryError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.versions
            .get(package_name)
            .map(|versions| PackageVersions::from_strings(versions.iter().cloned()))
            .ok_or_else(|| RegistryError::NotFound(package_name.to_string()))
    }

    async fn fetch_version_details(
        &self,
        _package_name: &str,
        version: &str,
        _include_extra: bool,
    ) -> Result<VersionDetails, RegistryError> {
        Ok(VersionDetails {
            digest: self.digests.get(version).cloned(),
            ..VersionDetails::default()
        })
    }
}

/// Pair a registry with the real connector for its ecosystem
pub fn create_test_resolver(registry: impl Registry + 'static) -> EcosystemResolver {
    let ecosystem = registry.ecosystem();
    EcosystemResolver::new(connector_for(ecosystem), Arc::new(registry))
}

/// Batch resolver over the given ecosystem resolvers
pub fn create_batch_resolver(
    resolvers: Vec<EcosystemResolver>,
    timeout: Duration,
) -> BatchResolver {
    let resolvers = resolvers
        .into_iter()
        .map(|resolver| (resolver.registry().ecosystem(), resolver))
        .collect();
    BatchResolver::new(
        resolvers,
        ResolutionCache::new(Duration::from_secs(3600), 1000),
        4,
        timeout,
    )
}
