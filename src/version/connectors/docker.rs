//! Container image connector

use std::fmt;

use crate::version::connector::Connector;
use crate::version::connectors::non_empty;
use crate::version::error::LookupError;
use crate::version::matcher::HintMatcher;
use crate::version::model::VersionRules;
use crate::version::types::Ecosystem;

/// Host serving Docker Hub's registry API
pub const DOCKER_HUB_REGISTRY: &str = "registry-1.docker.io";

/// A parsed image reference without tag or digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerImage {
    /// Registry host, with port when given
    pub registry: String,
    /// Repository path (`library/alpine`, `org/team/app`)
    pub repository: String,
}

impl DockerImage {
    /// Parse `[host[:port]/]repository`
    ///
    /// The first path component is a host when it contains `.` or `:` or is
    /// `localhost`. Docker Hub single-component names gain `library/`.
    pub fn parse(reference: &str) -> Result<Self, LookupError> {
        let trimmed = non_empty(reference)?;

        if trimmed.contains('@') {
            return Err(LookupError::invalid_identifier(
                reference,
                "digest references are not accepted, pass the bare image name",
            ));
        }

        let (registry, repository) = match trimmed.split_once('/') {
            Some((first, rest))
                if first.contains('.') || first.contains(':') || first == "localhost" =>
            {
                (first.to_ascii_lowercase(), rest)
            }
            _ => (DOCKER_HUB_REGISTRY.to_string(), trimmed),
        };

        let registry = match registry.as_str() {
            "docker.io" | "index.docker.io" => DOCKER_HUB_REGISTRY.to_string(),
            _ => registry,
        };

        if repository.contains(':') {
            return Err(LookupError::invalid_identifier(
                reference,
                "tags are not accepted in the image name, pass them as the version hint",
            ));
        }

        if repository.is_empty() || repository.split('/').any(str::is_empty) {
            return Err(LookupError::invalid_identifier(
                reference,
                "image reference has no repository path",
            ));
        }

        let mut repository = repository.to_ascii_lowercase();
        if registry == DOCKER_HUB_REGISTRY && !repository.contains('/') {
            repository = format!("library/{}", repository);
        }

        Ok(Self {
            registry,
            repository,
        })
    }

    pub fn is_docker_hub(&self) -> bool {
        self.registry == DOCKER_HUB_REGISTRY
    }
}

impl fmt::Display for DockerImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.registry, self.repository)
    }
}

/// Docker / OCI image tags, with the manifest digest of the selected tag
pub struct DockerConnector;

impl Connector for DockerConnector {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Docker
    }

    fn rules(&self) -> VersionRules {
        VersionRules::TAG
    }

    fn matcher(&self) -> HintMatcher {
        HintMatcher::for_container_tags(self.rules())
    }

    fn normalize_package(&self, package_name: &str) -> Result<String, LookupError> {
        DockerImage::parse(package_name).map(|image| image.to_string())
    }

    fn wants_details(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("alpine", DOCKER_HUB_REGISTRY, "library/alpine")]
    #[case("bitnami/redis", DOCKER_HUB_REGISTRY, "bitnami/redis")]
    #[case("docker.io/nginx", DOCKER_HUB_REGISTRY, "library/nginx")]
    #[case("index.docker.io/library/node", DOCKER_HUB_REGISTRY, "library/node")]
    #[case("ghcr.io/owner/app", "ghcr.io", "owner/app")]
    #[case("localhost:5000/team/app", "localhost:5000", "team/app")]
    #[case("localhost/app", "localhost", "app")]
    #[case("quay.io/Prometheus/Node-Exporter", "quay.io", "prometheus/node-exporter")]
    fn parse_accepts_references(
        #[case] reference: &str,
        #[case] registry: &str,
        #[case] repository: &str,
    ) {
        let image = DockerImage::parse(reference).unwrap();
        assert_eq!(image.registry, registry);
        assert_eq!(image.repository, repository);
    }

    #[rstest]
    #[case("")]
    #[case("alpine:3.19")]
    #[case("ghcr.io/owner/app:latest")]
    #[case("alpine@sha256:abcdef")]
    #[case("ghcr.io/")]
    #[case("ghcr.io//app")]
    fn parse_rejects_invalid_references(#[case] reference: &str) {
        assert!(matches!(
            DockerImage::parse(reference),
            Err(LookupError::InvalidPackageIdentifier { .. })
        ));
    }

    #[test]
    fn normalized_reference_is_stable() {
        let connector = DockerConnector;
        let normalized = connector.normalize_package("alpine").unwrap();

        assert_eq!(normalized, "registry-1.docker.io/library/alpine");
        assert_eq!(connector.normalize_package(&normalized).unwrap(), normalized);
        assert!(DockerImage::parse(&normalized).unwrap().is_docker_hub());
    }
}
