//! Helm chart repository implementation
//!
//! ChartMuseum-style repositories publish every chart version in
//! `<repo_url>/index.yaml`; digests and creation times come straight from the
//! index. OCI charts are image tags and go through [`DockerRegistry`].

use tracing::{debug, warn};

use crate::version::connectors::HelmChartRef;
use crate::version::error::RegistryError;
use crate::version::registries::{DockerRegistry, check_status, http_client, normalize_timestamp, yaml};
use crate::version::registry::Registry;
use crate::version::types::{Ecosystem, PackageVersions, VersionDetails, VersionEntry};

pub struct HelmRegistry {
    client: reqwest::Client,
    oci: DockerRegistry,
}

impl HelmRegistry {
    pub fn new() -> Self {
        Self {
            client: http_client(),
            oci: DockerRegistry::new(),
        }
    }

    /// Replace the client used for `oci://` charts
    pub fn with_oci(mut self, oci: DockerRegistry) -> Self {
        self.oci = oci;
        self
    }

    fn parse_chart(package_name: &str) -> Result<HelmChartRef, RegistryError> {
        HelmChartRef::parse(package_name).map_err(|e| {
            RegistryError::InvalidResponse(format!("invalid chart reference: {}", e))
        })
    }

    async fn fetch_index(
        &self,
        package_name: &str,
        repo_url: &str,
        chart: &str,
    ) -> Result<PackageVersions, RegistryError> {
        let url = format!("{}/index.yaml", repo_url);
        debug!("Fetching Helm repository index: {}", url);

        let response = self.client.get(&url).send().await?;
        let response = check_status(response, package_name, "Helm repository")?;
        let content = response.text().await.map_err(|e| {
            warn!("Failed to read Helm repository index: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        let versions = parse_index(&content, chart)?;
        if versions.is_empty() {
            return Err(RegistryError::NotFound(package_name.to_string()));
        }
        Ok(PackageVersions::new(versions))
    }
}

impl Default for HelmRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Chart versions listed under `entries.<chart>` of a repository index
///
/// Deprecated versions are kept but marked yanked.
fn parse_index(content: &str, chart: &str) -> Result<Vec<VersionEntry>, RegistryError> {
    let tree = yaml::parse(content)?;
    let root = tree.root_node();

    let Some(entries) = yaml::get(root, "entries", content) else {
        warn!("Helm repository index has no entries mapping");
        return Err(RegistryError::InvalidResponse(
            "index.yaml has no entries".to_string(),
        ));
    };

    let Some(chart_versions) = yaml::get(entries, chart, content) else {
        return Ok(Vec::new());
    };

    let versions = yaml::sequence_items(chart_versions)
        .into_iter()
        .filter_map(|item| {
            let field = |key: &str| {
                yaml::get(item, key, content).map(|node| yaml::scalar_text(node, content))
            };

            let version = field("version").filter(|v| !v.is_empty())?;
            let deprecated = field("deprecated").is_some_and(|v| v.eq_ignore_ascii_case("true"));

            Some(
                VersionEntry::new(version)
                    .with_digest(field("digest").filter(|d| !d.is_empty()))
                    .with_published_at(field("created").as_deref().map(normalize_timestamp))
                    .yanked(deprecated),
            )
        })
        .collect();

    Ok(versions)
}

fn oci_image(registry: &str, repository: &str) -> String {
    format!("{}/{}", registry, repository)
}

#[async_trait::async_trait]
impl Registry for HelmRegistry {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Helm
    }

    async fn fetch_all_versions(
        &self,
        package_name: &str,
    ) -> Result<PackageVersions, RegistryError> {
        match Self::parse_chart(package_name)? {
            HelmChartRef::Index { repo_url, chart } => {
                self.fetch_index(package_name, &repo_url, &chart).await
            }
            HelmChartRef::Oci {
                registry,
                repository,
            } => {
                self.oci
                    .fetch_all_versions(&oci_image(&registry, &repository))
                    .await
            }
        }
    }

    async fn fetch_version_details(
        &self,
        package_name: &str,
        version: &str,
        include_extra: bool,
    ) -> Result<VersionDetails, RegistryError> {
        match Self::parse_chart(package_name)? {
            // Index entries already carry digest and creation time
            HelmChartRef::Index { .. } => Ok(VersionDetails::default()),
            HelmChartRef::Oci {
                registry,
                repository,
            } => {
                self.oci
                    .fetch_version_details(
                        &oci_image(&registry, &repository),
                        version,
                        include_extra,
                    )
                    .await
            }
        }
    }
}
