//! NuGet connector

use crate::version::connector::Connector;
use crate::version::connectors::plain_name;
use crate::version::error::LookupError;
use crate::version::model::VersionRules;
use crate::version::types::Ecosystem;

/// NuGet package ids are case-insensitive
pub struct NuGetConnector;

impl Connector for NuGetConnector {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::NuGet
    }

    fn rules(&self) -> VersionRules {
        VersionRules::SEMVER
    }

    fn normalize_package(&self, package_name: &str) -> Result<String, LookupError> {
        plain_name(package_name).map(str::to_ascii_lowercase)
    }
}
