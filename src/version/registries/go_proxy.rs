//! Go proxy registry API implementation

use serde::Deserialize;
use tracing::{debug, warn};

use crate::version::error::RegistryError;
use crate::version::registries::{check_status, decode_json, http_client, normalize_timestamp};
use crate::version::registry::Registry;
use crate::version::types::{Ecosystem, PackageVersions, VersionDetails, VersionEntry};

/// Default base URL for Go proxy
const DEFAULT_BASE_URL: &str = "https://proxy.golang.org";

/// `@v/<version>.info` and `@latest` payload
#[derive(Debug, Deserialize)]
struct VersionInfo {
    #[serde(rename = "Version")]
    version: String,
    #[serde(rename = "Time", default)]
    time: Option<String>,
}

/// Registry implementation for Go proxy API
pub struct GoProxyRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl GoProxyRegistry {
    /// Creates a new GoProxyRegistry with a custom base URL
    pub fn new(base_url: &str) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn send(&self, url: &str, package_name: &str) -> Result<reqwest::Response, RegistryError> {
        let response = self.client.get(url).send().await?;

        // Go proxy returns 404 or 410 for modules that don't exist
        if response.status() == reqwest::StatusCode::GONE {
            return Err(RegistryError::NotFound(package_name.to_string()));
        }
        check_status(response, package_name, "Go proxy")
    }

    /// Modules with only pseudo-versions have an empty list; `@latest`
    /// still names one
    async fn fetch_latest(&self, package_name: &str) -> Result<VersionInfo, RegistryError> {
        let url = format!(
            "{}/{}/@latest",
            self.base_url,
            encode_module_path(package_name)
        );
        let response = self.send(&url, package_name).await?;
        decode_json(response, "Go proxy").await
    }
}

impl Default for GoProxyRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait::async_trait]
impl Registry for GoProxyRegistry {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Go
    }

    async fn fetch_all_versions(
        &self,
        package_name: &str,
    ) -> Result<PackageVersions, RegistryError> {
        let url = format!(
            "{}/{}/@v/list",
            self.base_url,
            encode_module_path(package_name)
        );

        let response = self.send(&url, package_name).await?;
        let body = response.text().await.map_err(|e| {
            warn!("Failed to read Go proxy response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        // One version per line
        let versions: Vec<String> = body
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        if !versions.is_empty() {
            return Ok(PackageVersions::from_strings(versions));
        }

        debug!("Empty version list for {}, falling back to @latest", package_name);
        let latest = self.fetch_latest(package_name).await?;
        Ok(PackageVersions::new(vec![
            VersionEntry::new(latest.version)
                .with_published_at(latest.time.as_deref().map(normalize_timestamp)),
        ]))
    }

    async fn fetch_version_details(
        &self,
        package_name: &str,
        version: &str,
        _include_extra: bool,
    ) -> Result<VersionDetails, RegistryError> {
        let url = format!(
            "{}/{}/@v/{}.info",
            self.base_url,
            encode_module_path(package_name),
            encode_module_path(version)
        );
        let response = self.send(&url, package_name).await?;
        let info: VersionInfo = decode_json(response, "Go proxy").await?;

        Ok(VersionDetails {
            published_at: info.time.as_deref().map(normalize_timestamp),
            ..VersionDetails::default()
        })
    }
}

/// Encodes a Go module path for use in proxy URLs.
/// Uppercase letters are escaped as !{lowercase}.
fn encode_module_path(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            result.push('!');
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use rstest::rstest;

    #[rstest]
    #[case("github.com/Azure/azure-sdk", "github.com/!azure/azure-sdk")]
    #[case("github.com/BurntSushi/toml", "github.com/!burnt!sushi/toml")]
    #[case("golang.org/x/text", "golang.org/x/text")]
    fn encode_module_path_escapes_uppercase(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(encode_module_path(input), expected);
    }

    #[tokio::test]
    async fn fetch_all_versions_reads_version_list() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/golang.org/x/text/@v/list")
            .with_status(200)
            .with_body("v0.3.0\nv0.14.0\n\nv0.13.0\n")
            .create_async()
            .await;

        let registry = GoProxyRegistry::new(&server.url());
        let result = registry.fetch_all_versions("golang.org/x/text").await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.version_strings(), vec!["v0.3.0", "v0.14.0", "v0.13.0"]);
    }

    #[tokio::test]
    async fn fetch_all_versions_falls_back_to_latest() {
        let mut server = Server::new_async().await;

        let list = server
            .mock("GET", "/github.com/example/pseudo/@v/list")
            .with_status(200)
            .with_body("")
            .create_async()
            .await;
        let latest = server
            .mock("GET", "/github.com/example/pseudo/@latest")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"Version": "v0.0.0-20240101000000-abcdef123456", "Time": "2024-01-01T00:00:00Z"}"#,
            )
            .create_async()
            .await;

        let registry = GoProxyRegistry::new(&server.url());
        let result = registry
            .fetch_all_versions("github.com/example/pseudo")
            .await
            .unwrap();

        list.assert_async().await;
        latest.assert_async().await;
        assert_eq!(
            result.version_strings(),
            vec!["v0.0.0-20240101000000-abcdef123456"]
        );
        assert_eq!(
            result.versions[0].published_at,
            Some("2024-01-01T00:00:00+00:00".to_string())
        );
    }

    #[tokio::test]
    async fn fetch_all_versions_maps_gone_to_not_found() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/github.com/example/removed/@v/list")
            .with_status(410)
            .create_async()
            .await;

        let registry = GoProxyRegistry::new(&server.url());
        let result = registry.fetch_all_versions("github.com/example/removed").await;

        mock.assert_async().await;
        assert!(matches!(result, Err(RegistryError::NotFound(_))));
    }

    #[tokio::test]
    async fn fetch_version_details_reads_info_time() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/github.com/!burnt!sushi/toml/@v/v1.3.2.info")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"Version": "v1.3.2", "Time": "2023-06-08T06:19:40Z"}"#)
            .create_async()
            .await;

        let registry = GoProxyRegistry::new(&server.url());
        let details = registry
            .fetch_version_details("github.com/BurntSushi/toml", "v1.3.2", false)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(
            details.published_at,
            Some("2023-06-08T06:19:40+00:00".to_string())
        );
        assert_eq!(details.digest, None);
    }
}
