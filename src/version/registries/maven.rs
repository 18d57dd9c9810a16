//! Maven repository implementation (`maven-metadata.xml`)

use roxmltree::Node;
use tracing::warn;

use crate::version::connectors::MavenCoordinate;
use crate::version::error::RegistryError;
use crate::version::registries::{check_status, http_client};
use crate::version::registry::Registry;
use crate::version::types::{Ecosystem, PackageVersions};

/// Registry implementation for Maven repositories
///
/// The repository URL is part of the normalized coordinate, so one instance
/// serves Maven Central and any custom repository.
pub struct MavenRegistry {
    client: reqwest::Client,
}

impl MavenRegistry {
    pub fn new() -> Self {
        Self {
            client: http_client(),
        }
    }
}

impl Default for MavenRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn child_element<'a, 'input>(node: &Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

/// Versions listed in `metadata/versioning/versions`, in document order
fn parse_metadata(xml: &str) -> Result<Vec<String>, RegistryError> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| {
        warn!("Failed to parse maven-metadata.xml: {}", e);
        RegistryError::InvalidResponse(format!("invalid maven-metadata.xml: {}", e))
    })?;

    let versions = child_element(&doc.root_element(), "versioning")
        .and_then(|versioning| child_element(&versioning, "versions"))
        .ok_or_else(|| {
            warn!("maven-metadata.xml has no <versions> element");
            RegistryError::InvalidResponse("maven-metadata.xml has no versions".to_string())
        })?;

    Ok(versions
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "version")
        .filter_map(|n| n.text())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect())
}

#[async_trait::async_trait]
impl Registry for MavenRegistry {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::MavenGradle
    }

    async fn fetch_all_versions(
        &self,
        package_name: &str,
    ) -> Result<PackageVersions, RegistryError> {
        let coordinate = MavenCoordinate::parse(package_name).map_err(|e| {
            RegistryError::InvalidResponse(format!("invalid coordinate: {}", e))
        })?;

        let response = self.client.get(coordinate.metadata_url()).send().await?;
        let response = check_status(response, package_name, "Maven repository")?;
        let xml = response.text().await.map_err(|e| {
            warn!("Failed to read maven-metadata.xml: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        Ok(PackageVersions::from_strings(parse_metadata(&xml)?))
    }
}
