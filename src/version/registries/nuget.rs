//! NuGet flat container API implementation

use serde::Deserialize;

use crate::version::error::RegistryError;
use crate::version::registries::{check_status, decode_json, http_client};
use crate::version::registry::Registry;
use crate::version::types::{Ecosystem, PackageVersions};

const DEFAULT_BASE_URL: &str = "https://api.nuget.org";

/// `index.json` of a package in the flat container
#[derive(Debug, Deserialize)]
struct FlatContainerIndex {
    #[serde(default)]
    versions: Vec<String>,
}

pub struct NuGetRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl NuGetRegistry {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for NuGetRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait::async_trait]
impl Registry for NuGetRegistry {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::NuGet
    }

    async fn fetch_all_versions(
        &self,
        package_name: &str,
    ) -> Result<PackageVersions, RegistryError> {
        // Flat container ids are lowercase
        let url = format!(
            "{}/v3-flatcontainer/{}/index.json",
            self.base_url,
            package_name.to_ascii_lowercase()
        );

        let response = self.client.get(&url).send().await?;
        let response = check_status(response, package_name, "NuGet")?;
        let index: FlatContainerIndex = decode_json(response, "NuGet").await?;

        Ok(PackageVersions::from_strings(index.versions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn fetch_all_versions_reads_flat_container_index() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/v3-flatcontainer/newtonsoft.json/index.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"versions": ["12.0.3", "13.0.1", "13.0.4-beta1"]}"#)
            .create_async()
            .await;

        let registry = NuGetRegistry::new(&server.url());
        let result = registry.fetch_all_versions("Newtonsoft.Json").await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            result.version_strings(),
            vec!["12.0.3", "13.0.1", "13.0.4-beta1"]
        );
    }

    #[tokio::test]
    async fn fetch_all_versions_returns_not_found() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/v3-flatcontainer/missing.package/index.json")
            .with_status(404)
            .create_async()
            .await;

        let registry = NuGetRegistry::new(&server.url());
        let result = registry.fetch_all_versions("missing.package").await;

        mock.assert_async().await;
        assert!(matches!(result, Err(RegistryError::NotFound(_))));
    }
}
