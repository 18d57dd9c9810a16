//! npm registry API implementation

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::version::error::RegistryError;
use crate::version::registries::{check_status, decode_json, http_client, normalize_timestamp};
use crate::version::registry::Registry;
use crate::version::types::{Ecosystem, PackageVersions, VersionEntry};

/// Default base URL for npm registry
const DEFAULT_BASE_URL: &str = "https://registry.npmjs.org";

/// Package document from the npm registry
#[derive(Debug, Deserialize)]
struct NpmPackageResponse {
    #[serde(default)]
    versions: IndexMap<String, serde_json::Value>,
    #[serde(default, rename = "dist-tags")]
    dist_tags: HashMap<String, String>,
    #[serde(default)]
    time: HashMap<String, String>,
}

/// Registry implementation for npm registry API
pub struct NpmRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl NpmRegistry {
    /// Creates a new NpmRegistry with a custom base URL
    pub fn new(base_url: &str) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Encode package name for URL (handles scoped packages)
    fn encode_package_name(package_name: &str) -> String {
        if package_name.starts_with('@') {
            // @scope/name -> @scope%2Fname
            package_name.replace('/', "%2F")
        } else {
            package_name.to_string()
        }
    }
}

impl Default for NpmRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait::async_trait]
impl Registry for NpmRegistry {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Npm
    }

    async fn fetch_all_versions(
        &self,
        package_name: &str,
    ) -> Result<PackageVersions, RegistryError> {
        let url = format!(
            "{}/{}",
            self.base_url,
            Self::encode_package_name(package_name)
        );

        let response = self.client.get(&url).send().await?;
        let response = check_status(response, package_name, "npm registry")?;
        let package_info: NpmPackageResponse = decode_json(response, "npm registry").await?;

        let versions = package_info
            .versions
            .into_keys()
            .map(|version| {
                let published_at = package_info
                    .time
                    .get(&version)
                    .map(|t| normalize_timestamp(t));
                VersionEntry::new(version).with_published_at(published_at)
            })
            .collect();

        Ok(PackageVersions::new(versions).with_dist_tags(package_info.dist_tags))
    }
}
