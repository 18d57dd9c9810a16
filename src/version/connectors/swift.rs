//! Swift package connector (GitHub-hosted packages)

use crate::version::connector::Connector;
use crate::version::connectors::GitHubRepo;
use crate::version::connectors::non_empty;
use crate::version::error::LookupError;
use crate::version::model::VersionRules;
use crate::version::types::Ecosystem;

pub struct SwiftConnector;

impl SwiftConnector {
    /// Parse `https://github.com/owner/repo(.git)`
    pub fn parse(package_name: &str) -> Result<GitHubRepo, LookupError> {
        let trimmed = non_empty(package_name)?;
        let invalid = || {
            LookupError::invalid_identifier(
                package_name,
                "expected a GitHub URL such as https://github.com/owner/repo",
            )
        };

        let path = ["https://github.com/", "http://github.com/", "github.com/"]
            .iter()
            .find_map(|prefix| trimmed.strip_prefix(prefix))
            .ok_or_else(invalid)?;
        let path = path.trim_end_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);

        GitHubRepo::from_path(path).ok_or_else(invalid)
    }
}

impl Connector for SwiftConnector {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Swift
    }

    fn rules(&self) -> VersionRules {
        VersionRules::TAG
    }

    /// Canonical `owner/repo` form shared with the GitHub registry client
    fn normalize_package(&self, package_name: &str) -> Result<String, LookupError> {
        Self::parse(package_name).map(|repo| repo.to_string())
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
    #[case("https://github.com/apple/swift-argument-parser", "apple/swift-argument-parser")]
    #[case("https://github.com/Alamofire/Alamofire.git", "alamofire/alamofire")]
    #[case("github.com/vapor/vapor/", "vapor/vapor")]
    fn normalize_accepts_github_urls(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(SwiftConnector.normalize_package(input), Ok(expected.to_string()));
    }

    #[rstest]
    #[case("")]
    #[case("apple/swift-argument-parser")]
    #[case("https://gitlab.com/owner/repo")]
    #[case("https://github.com/owner")]
    #[case("https://github.com/owner/repo/tree/main")]
    fn normalize_rejects_other_urls(#[case] input: &str) {
        assert!(matches!(
            SwiftConnector.normalize_package(input),
            Err(LookupError::InvalidPackageIdentifier { .. })
        ));
    }
}
