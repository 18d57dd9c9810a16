//! Ecosystem-specific connectors

mod crates;
mod dart;
mod docker;
mod github_actions;
mod go;
mod helm;
mod maven;
mod npm;
mod nuget;
mod packagist;
mod pypi;
mod rubygems;
mod swift;
mod terraform;

use std::sync::Arc;

pub use crates::CratesConnector;
pub use dart::DartConnector;
pub use docker::{DockerConnector, DockerImage};
pub use github_actions::{GitHubActionsConnector, GitHubRepo};
pub use go::GoConnector;
pub use helm::{HelmChartRef, HelmConnector};
pub use maven::{MavenConnector, MavenCoordinate};
pub use npm::NpmConnector;
pub use nuget::NuGetConnector;
pub use packagist::PackagistConnector;
pub use pypi::PyPIConnector;
pub use rubygems::RubyGemsConnector;
pub use swift::SwiftConnector;
pub use terraform::{TerraformAddress, TerraformConnector};

use crate::version::connector::Connector;
use crate::version::error::LookupError;
use crate::version::types::Ecosystem;

/// Connector registered for an ecosystem
pub fn connector_for(ecosystem: Ecosystem) -> Arc<dyn Connector> {
    match ecosystem {
        Ecosystem::Npm => Arc::new(NpmConnector),
        Ecosystem::PyPI => Arc::new(PyPIConnector),
        Ecosystem::Docker => Arc::new(DockerConnector),
        Ecosystem::NuGet => Arc::new(NuGetConnector),
        Ecosystem::MavenGradle => Arc::new(MavenConnector),
        Ecosystem::Helm => Arc::new(HelmConnector),
        Ecosystem::TerraformProvider => Arc::new(TerraformConnector::provider()),
        Ecosystem::TerraformModule => Arc::new(TerraformConnector::module()),
        Ecosystem::Go => Arc::new(GoConnector),
        Ecosystem::Php => Arc::new(PackagistConnector),
        Ecosystem::RubyGems => Arc::new(RubyGemsConnector),
        Ecosystem::Rust => Arc::new(CratesConnector),
        Ecosystem::Swift => Arc::new(SwiftConnector),
        Ecosystem::Dart => Arc::new(DartConnector),
        Ecosystem::GitHubActions => Arc::new(GitHubActionsConnector),
    }
}

/// Trimmed package name, rejecting blank input
pub(crate) fn non_empty(package_name: &str) -> Result<&str, LookupError> {
    let trimmed = package_name.trim();
    if trimmed.is_empty() {
        return Err(LookupError::invalid_identifier(
            package_name,
            "package name is empty",
        ));
    }
    Ok(trimmed)
}

/// Reject names containing characters no registry accepts in a path segment
pub(crate) fn plain_name(package_name: &str) -> Result<&str, LookupError> {
    let name = non_empty(package_name)?;
    if name
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '%' | '\\'))
    {
        return Err(LookupError::invalid_identifier(
            package_name,
            "unexpected character in package name",
        ));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_ecosystem_has_a_matching_connector() {
        for ecosystem in Ecosystem::ALL {
            assert_eq!(connector_for(ecosystem).ecosystem(), ecosystem);
        }
    }

    #[test]
    fn plain_name_rejects_path_characters() {
        assert_eq!(plain_name(" serde "), Ok("serde"));
        assert!(plain_name("a/b").is_err());
        assert!(plain_name("a b").is_err());
        assert!(plain_name("  ").is_err());
    }
}
