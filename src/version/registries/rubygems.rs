//! rubygems.org API implementation

use serde::Deserialize;

use crate::version::error::RegistryError;
use crate::version::registries::{check_status, decode_json, http_client, normalize_timestamp};
use crate::version::registry::Registry;
use crate::version::types::{Ecosystem, PackageVersions, VersionEntry};

const DEFAULT_BASE_URL: &str = "https://rubygems.org";

#[derive(Debug, Deserialize)]
struct GemVersion {
    number: String,
    #[serde(default)]
    created_at: Option<String>,
}

pub struct RubyGemsRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl RubyGemsRegistry {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for RubyGemsRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait::async_trait]
impl Registry for RubyGemsRegistry {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::RubyGems
    }

    async fn fetch_all_versions(
        &self,
        package_name: &str,
    ) -> Result<PackageVersions, RegistryError> {
        let url = format!("{}/api/v1/versions/{}.json", self.base_url, package_name);

        let response = self.client.get(&url).send().await?;
        let response = check_status(response, package_name, "RubyGems")?;
        let gems: Vec<GemVersion> = decode_json(response, "RubyGems").await?;

        // One entry per platform build; keep the first of each number
        let mut versions: Vec<VersionEntry> = Vec::with_capacity(gems.len());
        for gem in gems {
            if versions.iter().any(|v| v.version == gem.number) {
                continue;
            }
            versions.push(
                VersionEntry::new(gem.number)
                    .with_published_at(gem.created_at.as_deref().map(normalize_timestamp)),
            );
        }

        Ok(PackageVersions::new(versions))
    }
}
