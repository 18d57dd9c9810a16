//! pub.dev connector

use crate::version::connector::{Connector, select_with_latest_tag};
use crate::version::connectors::plain_name;
use crate::version::error::LookupError;
use crate::version::model::VersionRules;
use crate::version::types::{Ecosystem, PackageVersions, VersionEntry};

/// Dart and Flutter packages; pub.dev reports its own `latest`
pub struct DartConnector;

impl Connector for DartConnector {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Dart
    }

    fn rules(&self) -> VersionRules {
        VersionRules::SEMVER
    }

    fn normalize_package(&self, package_name: &str) -> Result<String, LookupError> {
        plain_name(package_name).map(str::to_ascii_lowercase)
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
