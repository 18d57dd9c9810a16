//! PyPI connector

use std::sync::LazyLock;

use regex::Regex;

use crate::version::connector::Connector;
use crate::version::connectors::non_empty;
use crate::version::error::LookupError;
use crate::version::model::VersionRules;
use crate::version::types::Ecosystem;

static PROJECT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-z0-9]([a-z0-9._-]*[a-z0-9])?$").expect("project name pattern is valid")
});

static SEPARATOR_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_.]+").expect("separator pattern is valid"));

pub struct PyPIConnector;

impl Connector for PyPIConnector {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::PyPI
    }

    fn rules(&self) -> VersionRules {
        VersionRules::PEP440
    }

    /// PEP 503 normalization: lowercase, separator runs collapse to `-`
    fn normalize_package(&self, package_name: &str) -> Result<String, LookupError> {
        let name = non_empty(package_name)?;
        if !PROJECT_NAME.is_match(name) {
            return Err(LookupError::invalid_identifier(
                package_name,
                "not a valid Python project name",
            ));
        }
        Ok(SEPARATOR_RUN.replace_all(name, "-").to_lowercase())
    }
}
