//! Terraform / OpenTofu provider and module connector

use std::fmt;

use crate::version::connector::Connector;
use crate::version::connectors::non_empty;
use crate::version::error::LookupError;
use crate::version::model::VersionRules;
use crate::version::types::Ecosystem;

pub const DEFAULT_TERRAFORM_REGISTRY: &str = "registry.terraform.io";

/// Provider `[host/]namespace/type` or module `[host/]namespace/name/provider`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerraformAddress {
    Provider {
        host: String,
        namespace: String,
        provider_type: String,
    },
    Module {
        host: String,
        namespace: String,
        name: String,
        provider: String,
    },
}

impl TerraformAddress {
    pub fn parse_provider(package_name: &str) -> Result<Self, LookupError> {
        let mut parts = split_address(package_name, 2)?;
        let provider_type = parts.pop().unwrap_or_default();
        let namespace = parts.pop().unwrap_or_default();
        let host = parts.pop().unwrap_or_else(|| DEFAULT_TERRAFORM_REGISTRY.to_string());

        Ok(TerraformAddress::Provider {
            host,
            namespace,
            provider_type,
        })
    }

    pub fn parse_module(package_name: &str) -> Result<Self, LookupError> {
        let mut parts = split_address(package_name, 3)?;
        let provider = parts.pop().unwrap_or_default();
        let name = parts.pop().unwrap_or_default();
        let namespace = parts.pop().unwrap_or_default();
        let host = parts.pop().unwrap_or_else(|| DEFAULT_TERRAFORM_REGISTRY.to_string());

        Ok(TerraformAddress::Module {
            host,
            namespace,
            name,
            provider,
        })
    }

    pub fn host(&self) -> &str {
        match self {
            TerraformAddress::Provider { host, .. } | TerraformAddress::Module { host, .. } => {
                host
            }
        }
    }

    /// Registry API path listing every version
    pub fn versions_path(&self) -> String {
        match self {
            TerraformAddress::Provider {
                namespace,
                provider_type,
                ..
            } => format!("/v1/providers/{}/{}/versions", namespace, provider_type),
            TerraformAddress::Module {
                namespace,
                name,
                provider,
                ..
            } => format!("/v1/modules/{}/{}/{}/versions", namespace, name, provider),
        }
    }
}

impl fmt::Display for TerraformAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerraformAddress::Provider {
                host,
                namespace,
                provider_type,
            } => write!(f, "{}/{}/{}", host, namespace, provider_type),
            TerraformAddress::Module {
                host,
                namespace,
                name,
                provider,
            } => write!(f, "{}/{}/{}/{}", host, namespace, name, provider),
        }
    }
}

/// Split into `required` parts, optionally preceded by a host
fn split_address(package_name: &str, required: usize) -> Result<Vec<String>, LookupError> {
    let trimmed = non_empty(package_name)?;
    let parts: Vec<&str> = trimmed.split('/').collect();

    if parts.len() != required && parts.len() != required + 1 {
        let expected = if required == 2 {
            "[host/]namespace/type"
        } else {
            "[host/]namespace/name/provider"
        };
        return Err(LookupError::invalid_identifier(
            package_name,
            format!("expected {}", expected),
        ));
    }

    if parts.iter().any(|part| part.is_empty()) {
        return Err(LookupError::invalid_identifier(
            package_name,
            "address parts must not be empty",
        ));
    }

    let has_host = parts.len() > required;
    let mut parts: Vec<String> = parts.into_iter().map(str::to_string).collect();
    if has_host {
        parts[0] = parts[0].to_ascii_lowercase();
    }
    Ok(parts)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AddressKind {
    Provider,
    Module,
}

pub struct TerraformConnector {
    kind: AddressKind,
}

impl TerraformConnector {
    pub fn provider() -> Self {
        Self {
            kind: AddressKind::Provider,
        }
    }

    pub fn module() -> Self {
        Self {
            kind: AddressKind::Module,
        }
    }

    pub fn parse(&self, package_name: &str) -> Result<TerraformAddress, LookupError> {
        match self.kind {
            AddressKind::Provider => TerraformAddress::parse_provider(package_name),
            AddressKind::Module => TerraformAddress::parse_module(package_name),
        }
    }
}

impl Connector for TerraformConnector {
    fn ecosystem(&self) -> Ecosystem {
        match self.kind {
            AddressKind::Provider => Ecosystem::TerraformProvider,
            AddressKind::Module => Ecosystem::TerraformModule,
        }
    }

    fn rules(&self) -> VersionRules {
        VersionRules::SEMVER
    }

    fn normalize_package(&self, package_name: &str) -> Result<String, LookupError> {
        self.parse(package_name).map(|address| address.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("hashicorp/aws", "registry.terraform.io", "hashicorp", "aws")]
    #[case("registry.terraform.io/hashicorp/google", "registry.terraform.io", "hashicorp", "google")]
    #[case("registry.opentofu.org/hashicorp/random", "registry.opentofu.org", "hashicorp", "random")]
    #[case("integrations/github", "registry.terraform.io", "integrations", "github")]
    #[case("terraform.example.com/myorg/mycloud", "terraform.example.com", "myorg", "mycloud")]
    fn parse_provider_accepts_addresses(
        #[case] package_name: &str,
        #[case] host: &str,
        #[case] namespace: &str,
        #[case] provider_type: &str,
    ) {
        assert_eq!(
            TerraformAddress::parse_provider(package_name).unwrap(),
            TerraformAddress::Provider {
                host: host.to_string(),
                namespace: namespace.to_string(),
                provider_type: provider_type.to_string(),
            }
        );
    }

    #[rstest]
    #[case("hashicorp")]
    #[case("a/b/c/d")]
    #[case("/aws")]
    #[case("hashicorp/")]
    #[case("")]
    #[case("registry.terraform.io//aws")]
    fn parse_provider_rejects_invalid_addresses(#[case] package_name: &str) {
        assert!(matches!(
            TerraformAddress::parse_provider(package_name),
            Err(LookupError::InvalidPackageIdentifier { .. })
        ));
    }

    #[rstest]
    #[case("terraform-aws-modules/vpc/aws", "registry.terraform.io", "terraform-aws-modules", "vpc", "aws")]
    #[case("registry.terraform.io/terraform-aws-modules/vpc/aws", "registry.terraform.io", "terraform-aws-modules", "vpc", "aws")]
    #[case("registry.opentofu.org/terraform-aws-modules/vpc/aws", "registry.opentofu.org", "terraform-aws-modules", "vpc", "aws")]
    #[case("Azure/network/azurerm", "registry.terraform.io", "Azure", "network", "azurerm")]
    #[case("terraform.example.com/myorg/mymodule/mycloud", "terraform.example.com", "myorg", "mymodule", "mycloud")]
    #[case("GoogleCloudPlatform/lb-http/google", "registry.terraform.io", "GoogleCloudPlatform", "lb-http", "google")]
    fn parse_module_accepts_addresses(
        #[case] package_name: &str,
        #[case] host: &str,
        #[case] namespace: &str,
        #[case] name: &str,
        #[case] provider: &str,
    ) {
        assert_eq!(
            TerraformAddress::parse_module(package_name).unwrap(),
            TerraformAddress::Module {
                host: host.to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
                provider: provider.to_string(),
            }
        );
    }

    #[rstest]
    #[case("terraform-aws-modules/vpc")]
    #[case("a/b/c/d/e")]
    #[case("/vpc/aws")]
    #[case("terraform-aws-modules//aws")]
    #[case("terraform-aws-modules/vpc/")]
    #[case("")]
    #[case("terraform-aws-modules")]
    #[case("registry.terraform.io/terraform-aws-modules//aws")]
    fn parse_module_rejects_invalid_addresses(#[case] package_name: &str) {
        assert!(matches!(
            TerraformAddress::parse_module(package_name),
            Err(LookupError::InvalidPackageIdentifier { .. })
        ));
    }

    #[test]
    fn versions_path_depends_on_kind() {
        let provider = TerraformAddress::parse_provider("hashicorp/aws").unwrap();
        assert_eq!(provider.versions_path(), "/v1/providers/hashicorp/aws/versions");
        assert_eq!(provider.host(), "registry.terraform.io");

        let module = TerraformAddress::parse_module("terraform-aws-modules/vpc/aws").unwrap();
        assert_eq!(
            module.versions_path(),
            "/v1/modules/terraform-aws-modules/vpc/aws/versions"
        );
    }

    #[test]
    fn connector_reports_ecosystem_per_kind() {
        assert_eq!(
            TerraformConnector::provider().ecosystem(),
            Ecosystem::TerraformProvider
        );
        assert_eq!(
            TerraformConnector::module().normalize_package("Azure/network/azurerm"),
            Ok("registry.terraform.io/Azure/network/azurerm".to_string())
        );
    }
}
