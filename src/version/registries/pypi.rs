//! PyPI registry client for fetching Python package versions

use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::version::error::RegistryError;
use crate::version::registries::{check_status, decode_json, http_client, normalize_timestamp};
use crate::version::registry::Registry;
use crate::version::types::{Ecosystem, PackageVersions, VersionEntry};

const DEFAULT_PYPI_REGISTRY: &str = "https://pypi.org";

/// PyPI registry client
pub struct PyPIRegistry {
    client: Client,
    base_url: String,
}

impl Default for PyPIRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_PYPI_REGISTRY)
    }
}

impl PyPIRegistry {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// PyPI JSON API response structure
#[derive(Debug, Deserialize)]
struct PypiResponse {
    releases: IndexMap<String, Vec<PypiFile>>,
}

/// One uploaded distribution file of a release
#[derive(Debug, Deserialize)]
struct PypiFile {
    #[serde(default)]
    upload_time_iso_8601: Option<String>,
    #[serde(default)]
    yanked: bool,
}

#[async_trait]
impl Registry for PyPIRegistry {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::PyPI
    }

    async fn fetch_all_versions(
        &self,
        package_name: &str,
    ) -> Result<PackageVersions, RegistryError> {
        let url = format!("{}/pypi/{}/json", self.base_url, package_name);
        debug!("Fetching PyPI package: {}", url);

        let response = self.client.get(&url).send().await?;
        let response = check_status(response, package_name, "PyPI")?;
        let pypi_response: PypiResponse = decode_json(response, "PyPI").await?;

        // Releases without files were never installable; a release is yanked
        // only when every file is
        let versions = pypi_response
            .releases
            .into_iter()
            .filter(|(_, files)| !files.is_empty())
            .map(|(version, files)| {
                let yanked = files.iter().all(|f| f.yanked);
                let published_at = files
                    .iter()
                    .filter_map(|f| f.upload_time_iso_8601.as_deref())
                    .min()
                    .map(normalize_timestamp);
                VersionEntry::new(version)
                    .with_published_at(published_at)
                    .yanked(yanked)
            })
            .collect();

        Ok(PackageVersions::new(versions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn fetch_all_versions_marks_yanked_and_skips_empty_releases() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/pypi/requests/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "info": {"version": "2.31.0"},
                    "releases": {
                        "2.30.0": [{"upload_time_iso_8601": "2023-05-22T15:12:44.175Z", "yanked": false}],
                        "2.31.0": [
                            {"upload_time_iso_8601": "2023-05-22T15:12:42.313Z", "yanked": false},
                            {"upload_time_iso_8601": "2023-05-22T15:12:40.000Z", "yanked": false}
                        ],
                        "2.32.0": [{"upload_time_iso_8601": "2024-05-20T15:12:42.313Z", "yanked": true}],
                        "3.0.0.dev0": []
                    }
                }"#,
            )
            .create_async()
            .await;

        let registry = PyPIRegistry::new(&server.url());
        let result = registry.fetch_all_versions("requests").await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.version_strings(), vec!["2.30.0", "2.31.0", "2.32.0"]);
        assert!(!result.versions[1].yanked);
        assert!(result.versions[2].yanked);
        assert_eq!(
            result.versions[1].published_at,
            Some("2023-05-22T15:12:40+00:00".to_string())
        );
    }

    #[tokio::test]
    async fn fetch_all_versions_returns_not_found() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/pypi/nonexistent-pkg/json")
            .with_status(404)
            .create_async()
            .await;

        let registry = PyPIRegistry::new(&server.url());
        let result = registry.fetch_all_versions("nonexistent-pkg").await;

        mock.assert_async().await;
        assert!(matches!(result, Err(RegistryError::NotFound(_))));
    }

    #[tokio::test]
    async fn fetch_all_versions_reports_server_errors() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/pypi/requests/json")
            .with_status(503)
            .create_async()
            .await;

        let registry = PyPIRegistry::new(&server.url());
        let result = registry.fetch_all_versions("requests").await;

        mock.assert_async().await;
        assert!(matches!(result, Err(RegistryError::InvalidResponse(_))));
    }
}
