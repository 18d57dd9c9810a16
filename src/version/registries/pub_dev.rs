//! pub.dev package API implementation

use std::collections::HashMap;

use serde::Deserialize;

use crate::version::error::RegistryError;
use crate::version::registries::{check_status, decode_json, http_client, normalize_timestamp};
use crate::version::registry::Registry;
use crate::version::types::{Ecosystem, PackageVersions, VersionEntry};

const DEFAULT_BASE_URL: &str = "https://pub.dev";

#[derive(Debug, Deserialize)]
struct PubPackage {
    #[serde(default)]
    latest: Option<PubVersion>,
    #[serde(default)]
    versions: Vec<PubVersion>,
}

#[derive(Debug, Deserialize)]
struct PubVersion {
    version: String,
    #[serde(default)]
    published: Option<String>,
    #[serde(default)]
    retracted: bool,
}

pub struct PubDevRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl PubDevRegistry {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for PubDevRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait::async_trait]
impl Registry for PubDevRegistry {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Dart
    }

    async fn fetch_all_versions(
        &self,
        package_name: &str,
    ) -> Result<PackageVersions, RegistryError> {
        let url = format!("{}/api/packages/{}", self.base_url, package_name);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.pub.v2+json")
            .send()
            .await?;
        let response = check_status(response, package_name, "pub.dev")?;
        let package: PubPackage = decode_json(response, "pub.dev").await?;

        // `latest` is what `dart pub` resolves to without constraints
        let dist_tags: HashMap<String, String> = package
            .latest
            .map(|latest| ("latest".to_string(), latest.version))
            .into_iter()
            .collect();

        let versions = package
            .versions
            .into_iter()
            .map(|v| {
                VersionEntry::new(v.version)
                    .with_published_at(v.published.as_deref().map(normalize_timestamp))
                    .yanked(v.retracted)
            })
            .collect();

        Ok(PackageVersions::new(versions).with_dist_tags(dist_tags))
    }
}
