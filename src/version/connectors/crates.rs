//! crates.io connector

use crate::version::connector::Connector;
use crate::version::connectors::plain_name;
use crate::version::error::LookupError;
use crate::version::model::VersionRules;
use crate::version::types::Ecosystem;

pub struct CratesConnector;

impl Connector for CratesConnector {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Rust
    }

    fn rules(&self) -> VersionRules {
        VersionRules::SEMVER
    }

    /// crates.io names are case-insensitive
    fn normalize_package(&self, package_name: &str) -> Result<String, LookupError> {
        plain_name(package_name).map(str::to_ascii_lowercase)
    }
}
