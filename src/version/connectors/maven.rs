//! Maven / Gradle connector

use std::fmt;

use crate::version::connector::Connector;
use crate::version::connectors::non_empty;
use crate::version::error::LookupError;
use crate::version::model::VersionRules;
use crate::version::types::Ecosystem;

pub const MAVEN_CENTRAL: &str = "https://repo1.maven.org/maven2";

/// `[registry:]groupId:artifactId`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MavenCoordinate {
    pub registry: String,
    pub group_id: String,
    pub artifact_id: String,
}

impl MavenCoordinate {
    pub fn parse(package_name: &str) -> Result<Self, LookupError> {
        let trimmed = non_empty(package_name)?;
        let invalid = |reason: &str| LookupError::invalid_identifier(package_name, reason);

        let mut parts = trimmed.rsplitn(3, ':');
        let artifact_id = parts.next().unwrap_or_default();
        let group_id = parts
            .next()
            .ok_or_else(|| invalid("expected groupId:artifactId"))?;
        let registry = parts.next();

        if group_id.is_empty() || artifact_id.is_empty() {
            return Err(invalid("groupId and artifactId must not be empty"));
        }

        let registry = match registry {
            None => MAVEN_CENTRAL.to_string(),
            Some(registry) => {
                if !(registry.contains('.')
                    || registry.contains('/')
                    || registry.contains("localhost"))
                {
                    return Err(invalid("registry must be a URL or host name"));
                }
                let registry = registry.trim_end_matches('/');
                if registry.starts_with("http://") || registry.starts_with("https://") {
                    registry.to_string()
                } else {
                    format!("https://{}", registry)
                }
            }
        };

        Ok(Self {
            registry,
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
        })
    }

    /// URL of the artifact's `maven-metadata.xml`
    pub fn metadata_url(&self) -> String {
        format!(
            "{}/{}/{}/maven-metadata.xml",
            self.registry,
            self.group_id.replace('.', "/"),
            self.artifact_id
        )
    }
}

impl fmt::Display for MavenCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.registry, self.group_id, self.artifact_id)
    }
}

pub struct MavenConnector;

impl Connector for MavenConnector {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::MavenGradle
    }

    fn rules(&self) -> VersionRules {
        VersionRules::MAVEN
    }

    fn normalize_package(&self, package_name: &str) -> Result<String, LookupError> {
        MavenCoordinate::parse(package_name).map(|coordinate| coordinate.to_string())
    }
}
