//! Helm chart connector

use std::fmt;

use crate::version::connector::{Connector, select_latest};
use crate::version::connectors::non_empty;
use crate::version::error::LookupError;
use crate::version::matcher::HintMatcher;
use crate::version::model::VersionRules;
use crate::version::types::{Ecosystem, PackageVersions, VersionEntry};

/// Chart published in a ChartMuseum-style repository or an OCI registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelmChartRef {
    /// `https://host/path/chart`, versions come from `<repo_url>/index.yaml`
    Index { repo_url: String, chart: String },
    /// `oci://host/path/chart`, versions are image tags
    Oci { registry: String, repository: String },
}

impl HelmChartRef {
    pub fn parse(package_name: &str) -> Result<Self, LookupError> {
        let trimmed = non_empty(package_name)?;
        let invalid = |reason: &str| LookupError::invalid_identifier(package_name, reason);

        if let Some(rest) = trimmed.strip_prefix("oci://") {
            let rest = rest.trim_end_matches('/');
            let (registry, repository) = rest
                .split_once('/')
                .ok_or_else(|| invalid("expected oci://host/path/chart"))?;
            if registry.is_empty() || repository.is_empty() || repository.split('/').any(str::is_empty)
            {
                return Err(invalid("expected oci://host/path/chart"));
            }
            return Ok(HelmChartRef::Oci {
                registry: registry.to_ascii_lowercase(),
                repository: repository.to_string(),
            });
        }

        let scheme = if trimmed.starts_with("https://") {
            "https://"
        } else if trimmed.starts_with("http://") {
            "http://"
        } else {
            return Err(invalid(
                "expected https://host/path/chart or oci://host/path/chart",
            ));
        };

        let rest = trimmed[scheme.len()..].trim_end_matches('/');
        let (host, path) = rest
            .split_once('/')
            .ok_or_else(|| invalid("chart URL has no chart name"))?;
        if host.is_empty() || path.is_empty() {
            return Err(invalid("chart URL has no chart name"));
        }

        let (base, chart) = match path.rsplit_once('/') {
            Some((base, chart)) => (format!("/{}", base), chart),
            None => (String::new(), path),
        };
        if chart.is_empty() {
            return Err(invalid("chart URL has no chart name"));
        }

        Ok(HelmChartRef::Index {
            repo_url: format!("{}{}{}", scheme, host.to_ascii_lowercase(), base),
            chart: chart.to_string(),
        })
    }

    /// Chart name without repository path
    pub fn chart(&self) -> &str {
        match self {
            HelmChartRef::Index { chart, .. } => chart,
            HelmChartRef::Oci { repository, .. } => repository
                .rsplit_once('/')
                .map_or(repository.as_str(), |(_, chart)| chart),
        }
    }
}

impl fmt::Display for HelmChartRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HelmChartRef::Index { repo_url, chart } => write!(f, "{}/{}", repo_url, chart),
            HelmChartRef::Oci {
                registry,
                repository,
            } => write!(f, "oci://{}/{}", registry, repository),
        }
    }
}

pub struct HelmConnector;

impl Connector for HelmConnector {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Helm
    }

    fn rules(&self) -> VersionRules {
        VersionRules::SEMVER
    }

    fn normalize_package(&self, package_name: &str) -> Result<String, LookupError> {
        HelmChartRef::parse(package_name).map(|chart| chart.to_string())
    }

    fn wants_details(&self) -> bool {
        true
    }

    fn select(
        &self,
        package_name: &str,
        versions: &PackageVersions,
        hint: Option<&str>,
    ) -> Result<VersionEntry, LookupError> {
        let matcher = match HelmChartRef::parse(package_name)? {
            HelmChartRef::Oci { .. } => HintMatcher::for_container_tags(self.rules()),
            HelmChartRef::Index { .. } => self.matcher(),
        };
        select_latest(&matcher, &self.rules(), package_name, versions, hint)
    }
}
