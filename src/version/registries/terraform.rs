//! Terraform / OpenTofu registry API implementation

use serde::Deserialize;

use crate::version::connectors::TerraformAddress;
use crate::version::error::RegistryError;
use crate::version::registries::{check_status, decode_json, http_client};
use crate::version::registry::Registry;
use crate::version::types::{Ecosystem, PackageVersions};

#[derive(Debug, Deserialize)]
struct ProviderVersions {
    #[serde(default)]
    versions: Vec<VersionItem>,
}

#[derive(Debug, Deserialize)]
struct ModuleVersions {
    #[serde(default)]
    modules: Vec<ProviderVersions>,
}

#[derive(Debug, Deserialize)]
struct VersionItem {
    version: String,
}

/// Registry for providers or modules; the host comes from the address
pub struct TerraformRegistry {
    client: reqwest::Client,
    scheme: String,
    ecosystem: Ecosystem,
}

impl TerraformRegistry {
    pub fn provider() -> Self {
        Self::with_ecosystem(Ecosystem::TerraformProvider)
    }

    pub fn module() -> Self {
        Self::with_ecosystem(Ecosystem::TerraformModule)
    }

    fn with_ecosystem(ecosystem: Ecosystem) -> Self {
        Self {
            client: http_client(),
            scheme: "https".to_string(),
            ecosystem,
        }
    }

    /// Talk to registries over a different scheme (plain `http` for local registries)
    pub fn with_scheme(mut self, scheme: &str) -> Self {
        self.scheme = scheme.to_string();
        self
    }

    fn parse_address(&self, package_name: &str) -> Result<TerraformAddress, RegistryError> {
        let parsed = match self.ecosystem {
            Ecosystem::TerraformModule => TerraformAddress::parse_module(package_name),
            _ => TerraformAddress::parse_provider(package_name),
        };
        parsed.map_err(|e| RegistryError::InvalidResponse(format!("invalid address: {}", e)))
    }
}

#[async_trait::async_trait]
impl Registry for TerraformRegistry {
    fn ecosystem(&self) -> Ecosystem {
        self.ecosystem
    }

    async fn fetch_all_versions(
        &self,
        package_name: &str,
    ) -> Result<PackageVersions, RegistryError> {
        let address = self.parse_address(package_name)?;
        let url = format!(
            "{}://{}{}",
            self.scheme,
            address.host(),
            address.versions_path()
        );

        let response = self.client.get(&url).send().await?;
        let response = check_status(response, package_name, "Terraform registry")?;

        let versions = match address {
            TerraformAddress::Provider { .. } => {
                let body: ProviderVersions = decode_json(response, "Terraform registry").await?;
                body.versions
            }
            TerraformAddress::Module { .. } => {
                let body: ModuleVersions = decode_json(response, "Terraform registry").await?;
                body.modules
                    .into_iter()
                    .flat_map(|module| module.versions)
                    .collect()
            }
        };

        Ok(PackageVersions::from_strings(
            versions.into_iter().map(|item| item.version),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn fetch_all_versions_reads_provider_versions() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/v1/providers/hashicorp/aws/versions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "id": "hashicorp/aws",
                    "versions": [
                        {"version": "5.30.0", "protocols": ["5.0"], "platforms": []},
                        {"version": "5.31.0", "protocols": ["5.0"], "platforms": []}
                    ]
                }"#,
            )
            .create_async()
            .await;

        let registry = TerraformRegistry::provider().with_scheme("http");
        let package = format!("{}/hashicorp/aws", server.host_with_port());
        let result = registry.fetch_all_versions(&package).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.version_strings(), vec!["5.30.0", "5.31.0"]);
    }

    #[tokio::test]
    async fn fetch_all_versions_reads_module_versions() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/v1/modules/terraform-aws-modules/vpc/aws/versions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "modules": [{
                        "source": "terraform-aws-modules/vpc/aws",
                        "versions": [{"version": "5.4.0"}, {"version": "5.5.0"}]
                    }]
                }"#,
            )
            .create_async()
            .await;

        let registry = TerraformRegistry::module().with_scheme("http");
        let package = format!("{}/terraform-aws-modules/vpc/aws", server.host_with_port());
        let result = registry.fetch_all_versions(&package).await.unwrap();

        mock.assert_async().await;
        assert_eq!(registry.ecosystem(), Ecosystem::TerraformModule);
        assert_eq!(result.version_strings(), vec!["5.4.0", "5.5.0"]);
    }

    #[tokio::test]
    async fn fetch_all_versions_returns_not_found() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/v1/providers/example/missing/versions")
            .with_status(404)
            .create_async()
            .await;

        let registry = TerraformRegistry::provider().with_scheme("http");
        let package = format!("{}/example/missing", server.host_with_port());
        let result = registry.fetch_all_versions(&package).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(RegistryError::NotFound(_))));
    }
}
