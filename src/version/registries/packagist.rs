//! Packagist (Composer) registry implementation
//!
//! `p2/<vendor>/<package>.json` is minified: each version entry only lists
//! the fields that differ from the previous one, and `"__unset"` removes an
//! inherited field.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::version::error::RegistryError;
use crate::version::registries::{check_status, decode_json, http_client, normalize_timestamp};
use crate::version::registry::Registry;
use crate::version::types::{Ecosystem, PackageVersions, VersionEntry};

const DEFAULT_BASE_URL: &str = "https://repo.packagist.org";

const UNSET: &str = "__unset";

#[derive(Debug, Deserialize)]
struct P2Response {
    #[serde(default)]
    packages: HashMap<String, Vec<Map<String, Value>>>,
}

pub struct PackagistRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl PackagistRegistry {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for PackagistRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Expand minified version entries into complete ones
fn expand(entries: Vec<Map<String, Value>>) -> Vec<Map<String, Value>> {
    let mut current = Map::new();
    entries
        .into_iter()
        .map(|entry| {
            for (key, value) in entry {
                if value.as_str() == Some(UNSET) {
                    current.remove(&key);
                } else {
                    current.insert(key, value);
                }
            }
            current.clone()
        })
        .collect()
}

#[async_trait::async_trait]
impl Registry for PackagistRegistry {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Php
    }

    async fn fetch_all_versions(
        &self,
        package_name: &str,
    ) -> Result<PackageVersions, RegistryError> {
        let url = format!("{}/p2/{}.json", self.base_url, package_name);

        let response = self.client.get(&url).send().await?;
        let response = check_status(response, package_name, "Packagist")?;
        let mut body: P2Response = decode_json(response, "Packagist").await?;

        let entries = body
            .packages
            .remove(package_name)
            .ok_or_else(|| RegistryError::NotFound(package_name.to_string()))?;

        let versions = expand(entries)
            .into_iter()
            .filter_map(|entry| {
                let version = entry.get("version")?.as_str()?.to_string();
                let published_at = entry
                    .get("time")
                    .and_then(Value::as_str)
                    .map(normalize_timestamp);
                Some(VersionEntry::new(version).with_published_at(published_at))
            })
            .collect();

        Ok(PackageVersions::new(versions))
    }
}
