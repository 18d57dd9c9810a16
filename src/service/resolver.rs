//! Per-ecosystem resolution components
//!
//! Pairs each ecosystem's connector with the registry client it fetches
//! through, and builds the lookup table the batch resolver dispatches on.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::ResolverConfig;
use crate::version::connector::Connector;
use crate::version::connectors::connector_for;
use crate::version::registries::github::{DEFAULT_API_URL, DEFAULT_RAW_URL};
use crate::version::registries::{
    CratesIoRegistry, DockerRegistry, GitHubRegistry, GoProxyRegistry, HelmRegistry,
    MavenRegistry, NpmRegistry, NuGetRegistry, PackagistRegistry, PubDevRegistry, PyPIRegistry,
    RubyGemsRegistry, TerraformRegistry,
};
use crate::version::registry::Registry;
use crate::version::types::Ecosystem;

/// Connector and registry client serving one ecosystem
#[derive(Clone)]
pub struct EcosystemResolver {
    connector: Arc<dyn Connector>,
    registry: Arc<dyn Registry>,
}

impl EcosystemResolver {
    pub fn new(connector: Arc<dyn Connector>, registry: Arc<dyn Registry>) -> Self {
        Self {
            connector,
            registry,
        }
    }

    pub fn connector(&self) -> &Arc<dyn Connector> {
        &self.connector
    }

    pub fn registry(&self) -> &Arc<dyn Registry> {
        &self.registry
    }
}

/// Registry client for an ecosystem, honoring a configured base URL
fn create_registry(
    ecosystem: Ecosystem,
    base_url: Option<&str>,
    github_token: Option<&str>,
) -> Arc<dyn Registry> {
    let github = || {
        GitHubRegistry::new(base_url.unwrap_or(DEFAULT_API_URL), DEFAULT_RAW_URL)
            .with_token(github_token.map(str::to_string))
    };

    match ecosystem {
        Ecosystem::Npm => Arc::new(base_url.map(NpmRegistry::new).unwrap_or_default()),
        Ecosystem::PyPI => Arc::new(base_url.map(PyPIRegistry::new).unwrap_or_default()),
        Ecosystem::Docker => {
            Arc::new(DockerRegistry::new().with_hub_url(base_url.map(str::to_string)))
        }
        Ecosystem::NuGet => Arc::new(base_url.map(NuGetRegistry::new).unwrap_or_default()),
        // Repository URLs are part of Maven coordinates and Helm chart references
        Ecosystem::MavenGradle => Arc::new(MavenRegistry::new()),
        Ecosystem::Helm => Arc::new(HelmRegistry::new()),
        Ecosystem::TerraformProvider => Arc::new(TerraformRegistry::provider()),
        Ecosystem::TerraformModule => Arc::new(TerraformRegistry::module()),
        Ecosystem::Go => Arc::new(base_url.map(GoProxyRegistry::new).unwrap_or_default()),
        Ecosystem::Php => Arc::new(base_url.map(PackagistRegistry::new).unwrap_or_default()),
        Ecosystem::RubyGems => Arc::new(base_url.map(RubyGemsRegistry::new).unwrap_or_default()),
        Ecosystem::Rust => Arc::new(base_url.map(CratesIoRegistry::new).unwrap_or_default()),
        Ecosystem::Swift => Arc::new(github().for_swift()),
        Ecosystem::Dart => Arc::new(base_url.map(PubDevRegistry::new).unwrap_or_default()),
        Ecosystem::GitHubActions => Arc::new(github()),
    }
}

/// Create the resolver table for every ecosystem enabled in `config`
pub fn create_default_resolvers(config: &ResolverConfig) -> HashMap<Ecosystem, EcosystemResolver> {
    Ecosystem::ALL
        .into_iter()
        .filter(|ecosystem| {
            let enabled = config.is_enabled(*ecosystem);
            if !enabled {
                debug!("Ecosystem {} disabled by configuration", ecosystem);
            }
            enabled
        })
        .map(|ecosystem| {
            let registry_config = config.registry(ecosystem);
            let registry = create_registry(
                ecosystem,
                registry_config.base_url.as_deref(),
                config.github_token.as_deref(),
            );
            (
                ecosystem,
                EcosystemResolver::new(connector_for(ecosystem), registry),
            )
        })
        .collect()
}
