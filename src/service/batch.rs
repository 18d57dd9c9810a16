//! Batch orchestration over the resolution cache
//!
//! Every request in a batch resolves concurrently through the shared cache;
//! failures are collected per package instead of aborting the batch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::config::ResolverConfig;
use crate::service::resolver::{EcosystemResolver, create_default_resolvers};
use crate::version::cache::{CacheKey, ResolutionCache};
use crate::version::connector::Connector;
use crate::version::error::LookupError;
use crate::version::types::{
    BatchResponse, Ecosystem, ResolutionError, ResolutionRequest, ResolutionResult,
};

/// Resolves requests through the cache under a global concurrency cap
pub struct BatchResolver {
    resolvers: HashMap<Ecosystem, EcosystemResolver>,
    cache: ResolutionCache,
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl BatchResolver {
    pub fn new(
        resolvers: HashMap<Ecosystem, EcosystemResolver>,
        cache: ResolutionCache,
        concurrency: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            resolvers,
            cache,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
            timeout,
        }
    }

    /// Resolver with the default registry clients for every enabled ecosystem
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(
            create_default_resolvers(config),
            ResolutionCache::new(config.cache_ttl(), config.cache.max_entries),
            config.concurrency,
            config.request_timeout(),
        )
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Ecosystems with a registered resolver, in declaration order
    pub fn ecosystems(&self) -> Vec<Ecosystem> {
        Ecosystem::ALL
            .into_iter()
            .filter(|ecosystem| self.resolvers.contains_key(ecosystem))
            .collect()
    }

    /// Resolve one request
    ///
    /// The returned result carries the package name exactly as requested,
    /// even when the answer was cached under its normalized form.
    pub async fn resolve(
        &self,
        request: &ResolutionRequest,
    ) -> Result<ResolutionResult, LookupError> {
        let ecosystem = request.ecosystem;
        let resolver = self
            .resolvers
            .get(&ecosystem)
            .cloned()
            .ok_or_else(|| LookupError::UnsupportedEcosystem(ecosystem.to_string()))?;

        let package = resolver.connector().normalize_package(&request.package_name)?;
        let hint = request.version_hint.clone();
        let include_extra = request.include_extra;
        let key = CacheKey::new(ecosystem, package.clone(), hint.as_deref(), include_extra);

        let permits = Arc::clone(&self.permits);
        let lookup = self.cache.get_or_resolve(key, move || async move {
            let _permit = permits.acquire_owned().await.map_err(|_| {
                LookupError::UpstreamUnavailable("resolver is shutting down".to_string())
            })?;
            debug!("Resolving {} {}", ecosystem, package);
            resolver
                .connector()
                .resolve_normalized(
                    &package,
                    hint.as_deref(),
                    include_extra,
                    resolver.registry().as_ref(),
                )
                .await
        });

        let mut result = tokio::time::timeout(self.timeout, lookup)
            .await
            .map_err(|_| LookupError::Timeout(self.timeout.as_millis() as u64))??;

        result.package_name.clone_from(&request.package_name);
        Ok(result)
    }

    /// Resolve every request concurrently
    ///
    /// Successes and failures both keep input order.
    pub async fn resolve_batch(&self, requests: &[ResolutionRequest]) -> BatchResponse {
        let outcomes = join_all(requests.iter().map(|request| self.resolve(request))).await;

        let mut response = BatchResponse::default();
        for (request, outcome) in requests.iter().zip(outcomes) {
            match outcome {
                Ok(result) => response.result.push(result),
                Err(e) => {
                    debug!(
                        "Lookup failed for {} {}: {}",
                        request.ecosystem, request.package_name, e
                    );
                    response.lookup_errors.push(ResolutionError {
                        ecosystem: request.ecosystem,
                        package_name: request.package_name.clone(),
                        error: e.to_string(),
                        retryable: e.is_transient(),
                    });
                }
            }
        }

        info!(
            "Resolved batch of {}: {} succeeded, {} failed",
            requests.len(),
            response.result.len(),
            response.lookup_errors.len()
        );
        response
    }
}
