//! Go module connector

use crate::version::connector::Connector;
use crate::version::connectors::non_empty;
use crate::version::error::LookupError;
use crate::version::model::VersionRules;
use crate::version::types::Ecosystem;

/// Go modules served by a module proxy; publish dates come from `.info`
pub struct GoConnector;

impl Connector for GoConnector {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Go
    }

    fn rules(&self) -> VersionRules {
        VersionRules::SEMVER
    }

    /// Module paths start with a domain (`golang.org/x/text`, `github.com/a/b`)
    fn normalize_package(&self, package_name: &str) -> Result<String, LookupError> {
        let path = non_empty(package_name)?.trim_end_matches('/');
        let host = path.split('/').next().unwrap_or_default();

        if !host.contains('.') || path.split('/').any(str::is_empty) {
            return Err(LookupError::invalid_identifier(
                package_name,
                "module path must start with a domain name",
            ));
        }
        if path.chars().any(|c| c.is_whitespace() || c == '@') {
            return Err(LookupError::invalid_identifier(
                package_name,
                "module path must not contain a version or whitespace",
            ));
        }

        Ok(path.to_string())
    }

    fn wants_details(&self) -> bool {
        true
    }
}
