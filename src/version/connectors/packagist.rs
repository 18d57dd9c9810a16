//! Packagist (Composer) connector

use crate::version::connector::Connector;
use crate::version::connectors::non_empty;
use crate::version::error::LookupError;
use crate::version::model::VersionRules;
use crate::version::types::Ecosystem;

pub struct PackagistConnector;

impl Connector for PackagistConnector {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Php
    }

    fn rules(&self) -> VersionRules {
        VersionRules::LOOSE
    }

    /// `vendor/package`, lowercased
    fn normalize_package(&self, package_name: &str) -> Result<String, LookupError> {
        let name = non_empty(package_name)?;
        match name.split_once('/') {
            Some((vendor, package))
                if !vendor.is_empty() && !package.is_empty() && !package.contains('/') =>
            {
                Ok(name.to_ascii_lowercase())
            }
            _ => Err(LookupError::invalid_identifier(
                package_name,
                "expected 'vendor/package'",
            )),
        }
    }
}
