//! RubyGems connector

use crate::version::connector::Connector;
use crate::version::connectors::plain_name;
use crate::version::error::LookupError;
use crate::version::model::VersionRules;
use crate::version::types::Ecosystem;

pub struct RubyGemsConnector;

impl Connector for RubyGemsConnector {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::RubyGems
    }

    fn rules(&self) -> VersionRules {
        VersionRules::LOOSE
    }

    fn normalize_package(&self, package_name: &str) -> Result<String, LookupError> {
        plain_name(package_name).map(str::to_string)
    }
}
