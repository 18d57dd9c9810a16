//! npm connector

use crate::version::connector::{Connector, select_with_latest_tag};
use crate::version::connectors::non_empty;
use crate::version::error::LookupError;
use crate::version::model::VersionRules;
use crate::version::types::{Ecosystem, PackageVersions, VersionEntry};

/// npm packages, honoring the `latest` dist-tag
pub struct NpmConnector;

impl Connector for NpmConnector {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Npm
    }

    fn rules(&self) -> VersionRules {
        VersionRules::SEMVER
    }

    /// Accepts `name` or `@scope/name`
    fn normalize_package(&self, package_name: &str) -> Result<String, LookupError> {
        let name = non_empty(package_name)?;
        let invalid = |reason: &str| LookupError::invalid_identifier(package_name, reason);

        let bare = match name.strip_prefix('@') {
            Some(scoped) => {
                let (scope, bare) = scoped
                    .split_once('/')
                    .ok_or_else(|| invalid("scoped packages must look like @scope/name"))?;
                if scope.is_empty() {
                    return Err(invalid("scope must not be empty"));
                }
                bare
            }
            None => name,
        };

        if bare.is_empty() || bare.contains('/') || bare.chars().any(char::is_whitespace) {
            return Err(invalid("not a valid npm package name"));
        }

        Ok(name.to_string())
    }

    fn select(
        &self,
        package_name: &str,
        versions: &PackageVersions,
        hint: Option<&str>,
    ) -> Result<VersionEntry, LookupError> {
        select_with_latest_tag(&self.matcher(), &self.rules(), package_name, versions, hint)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("left-pad")]
    #[case("@types/node")]
    #[case(" express ")]
    fn normalize_accepts_package_names(#[case] input: &str) {
        assert_eq!(
            NpmConnector.normalize_package(input),
            Ok(input.trim().to_string())
        );
    }

    #[rstest]
    #[case("")]
    #[case("@types")]
    #[case("@/node")]
    #[case("@types/")]
    #[case("a/b")]
    fn normalize_rejects_malformed_names(#[case] input: &str) {
        assert!(NpmConnector.normalize_package(input).is_err());
    }

    #[test]
    fn select_prefers_latest_dist_tag() {
        let versions = PackageVersions::from_strings(["4.17.20", "4.17.21", "5.0.0-beta.1"])
            .with_dist_tags(HashMap::from([(
                "latest".to_string(),
                "4.17.20".to_string(),
            )]));

        let selected = NpmConnector.select("lodash", &versions, None).unwrap();

        assert_eq!(selected.version, "4.17.20");
    }

    #[test]
    fn select_without_dist_tag_takes_highest_stable() {
        let versions = PackageVersions::from_strings(["1.0.0", "1.0.1", "1.0.1-beta"]);

        let selected = NpmConnector.select("left-pad", &versions, None).unwrap();

        assert_eq!(selected.version, "1.0.1");
    }
}
