//! GitHub Actions connector

use std::fmt;

use crate::version::connector::Connector;
use crate::version::connectors::non_empty;
use crate::version::error::LookupError;
use crate::version::model::VersionRules;
use crate::version::types::Ecosystem;

/// `owner/repo` on GitHub, lowercased
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubRepo {
    pub owner: String,
    pub repo: String,
}

impl GitHubRepo {
    pub fn parse(package_name: &str) -> Result<Self, LookupError> {
        let trimmed = non_empty(package_name)?;
        Self::from_path(trimmed).ok_or_else(|| {
            LookupError::invalid_identifier(package_name, "expected 'owner/repo'")
        })
    }

    /// `owner/repo` with exactly two non-empty segments
    pub(crate) fn from_path(path: &str) -> Option<Self> {
        let (owner, repo) = path.split_once('/')?;
        let valid = |s: &str| {
            !s.is_empty()
                && s
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        };
        if !valid(owner) || !valid(repo) {
            return None;
        }
        Some(Self {
            owner: owner.to_ascii_lowercase(),
            repo: repo.to_ascii_lowercase(),
        })
    }
}

impl fmt::Display for GitHubRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Repository tags of a GitHub Action, plus its `action.yml` metadata
pub struct GitHubActionsConnector;

impl Connector for GitHubActionsConnector {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::GitHubActions
    }

    fn rules(&self) -> VersionRules {
        VersionRules::TAG
    }

    fn normalize_package(&self, package_name: &str) -> Result<String, LookupError> {
        GitHubRepo::parse(package_name).map(|repo| repo.to_string())
    }

    fn wants_details(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    use crate::version::types::PackageVersions;

    #[rstest]
    #[case("actions/checkout", "actions/checkout")]
    #[case("Actions/Setup-Node", "actions/setup-node")]
    #[case(" docker/build-push-action ", "docker/build-push-action")]
    fn normalize_lowercases_owner_and_repo(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(
            GitHubActionsConnector.normalize_package(input),
            Ok(expected.to_string())
        );
    }

    #[rstest]
    #[case("")]
    #[case("checkout")]
    #[case("actions/checkout/sub")]
    #[case("actions/checkout@v4")]
    #[case("/checkout")]
    fn parse_rejects_invalid_names(#[case] input: &str) {
        assert!(matches!(
            GitHubRepo::parse(input),
            Err(LookupError::InvalidPackageIdentifier { .. })
        ));
    }

    #[test]
    fn select_picks_highest_tag() {
        let versions = PackageVersions::from_strings(["v3.6.0", "v4.1.1", "v4.2.0", "v4"]);

        let selected = GitHubActionsConnector
            .select("actions/checkout", &versions, None)
            .unwrap();

        assert_eq!(selected.version, "v4.2.0");
    }
}
