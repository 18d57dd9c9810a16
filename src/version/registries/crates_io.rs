//! crates.io registry API implementation

use serde::Deserialize;

use crate::version::error::RegistryError;
use crate::version::registries::{check_status, decode_json, http_client, normalize_timestamp};
use crate::version::registry::Registry;
use crate::version::types::{Ecosystem, PackageVersions, VersionEntry};

/// Default base URL for crates.io API
const DEFAULT_BASE_URL: &str = "https://crates.io";

/// Response from crates.io API
#[derive(Debug, Deserialize)]
struct CratesIoResponse {
    versions: Vec<CrateVersion>,
}

#[derive(Debug, Deserialize)]
struct CrateVersion {
    num: String,
    #[serde(default)]
    yanked: bool,
    #[serde(default)]
    created_at: Option<String>,
}

/// Registry implementation for crates.io API
pub struct CratesIoRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl CratesIoRegistry {
    /// Creates a new CratesIoRegistry with a custom base URL
    pub fn new(base_url: &str) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for CratesIoRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait::async_trait]
impl Registry for CratesIoRegistry {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Rust
    }

    async fn fetch_all_versions(
        &self,
        package_name: &str,
    ) -> Result<PackageVersions, RegistryError> {
        let url = format!("{}/api/v1/crates/{}", self.base_url, package_name);

        let response = self.client.get(&url).send().await?;
        let response = check_status(response, package_name, "crates.io")?;
        let crate_info: CratesIoResponse = decode_json(response, "crates.io").await?;

        let versions = crate_info
            .versions
            .into_iter()
            .map(|v| {
                VersionEntry::new(v.num)
                    .with_published_at(v.created_at.as_deref().map(normalize_timestamp))
                    .yanked(v.yanked)
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
    async fn fetch_all_versions_keeps_yanked_flag() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/api/v1/crates/serde")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "crate": {"name": "serde"},
                    "versions": [
                        {"num": "1.0.195", "yanked": true, "created_at": "2024-01-07T20:00:00.000000+00:00"},
                        {"num": "1.0.194", "yanked": false, "created_at": "2024-01-02T20:00:00.000000+00:00"}
                    ]
                }"#,
            )
            .create_async()
            .await;

        let registry = CratesIoRegistry::new(&server.url());
        let result = registry.fetch_all_versions("serde").await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.version_strings(), vec!["1.0.195", "1.0.194"]);
        assert!(result.versions[0].yanked);
        assert!(!result.versions[1].yanked);
        assert_eq!(
            result.versions[1].published_at,
            Some("2024-01-02T20:00:00+00:00".to_string())
        );
    }

    #[tokio::test]
    async fn fetch_all_versions_returns_not_found_for_nonexistent_crate() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/api/v1/crates/nonexistent-crate")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"errors": [{"detail": "Not Found"}]}"#)
            .create_async()
            .await;

        let registry = CratesIoRegistry::new(&server.url());
        let result = registry.fetch_all_versions("nonexistent-crate").await;

        mock.assert_async().await;
        assert!(matches!(result, Err(RegistryError::NotFound(_))));
    }
}
