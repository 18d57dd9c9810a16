use thiserror::Error;

/// Failure reported by a registry client while fetching raw candidates
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Rate limited: retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Package not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Per-package lookup failure
///
/// Cloneable so a single outcome can be handed to every caller waiting on
/// the same in-flight resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("Invalid package identifier '{package}': {reason}")]
    InvalidPackageIdentifier { package: String, reason: String },

    #[error("Package '{0}' not found")]
    PackageNotFound(String),

    #[error("No version of '{package}' matches{}", hint_suffix(.hint))]
    NoMatchingVersion {
        package: String,
        hint: Option<String>,
    },

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Unsupported ecosystem: {0}")]
    UnsupportedEcosystem(String),

    #[error("Lookup timed out after {0} ms")]
    Timeout(u64),
}

fn hint_suffix(hint: &Option<String>) -> String {
    match hint {
        Some(hint) => format!(" hint '{}'", hint),
        None => " (no usable versions)".to_string(),
    }
}

impl LookupError {
    pub fn invalid_identifier(package: &str, reason: impl Into<String>) -> Self {
        LookupError::InvalidPackageIdentifier {
            package: package.to_string(),
            reason: reason.into(),
        }
    }

    pub fn no_matching_version(package: &str, hint: Option<&str>) -> Self {
        LookupError::NoMatchingVersion {
            package: package.to_string(),
            hint: hint.map(str::to_string),
        }
    }

    /// Whether a later retry could plausibly succeed
    pub(crate) fn is_transient(&self) -> bool {
        matches!(
            self,
            LookupError::UpstreamUnavailable(_) | LookupError::Timeout(_)
        )
    }
}

impl From<RegistryError> for LookupError {
    fn from(error: RegistryError) -> Self {
        match error {
            RegistryError::NotFound(package) => LookupError::PackageNotFound(package),
            other => LookupError::UpstreamUnavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_not_found_maps_to_package_not_found() {
        let error: LookupError = RegistryError::NotFound("left-pad".to_string()).into();
        assert_eq!(error, LookupError::PackageNotFound("left-pad".to_string()));
        assert!(!error.is_transient());
    }

    #[test]
    fn other_registry_errors_map_to_upstream_unavailable() {
        let error: LookupError = RegistryError::RateLimited {
            retry_after_secs: Some(60),
        }
        .into();

        assert_eq!(
            error,
            LookupError::UpstreamUnavailable(
                "Rate limited: retry after Some(60) seconds".to_string()
            )
        );
        assert!(error.is_transient());
    }

    #[test]
    fn no_matching_version_message_mentions_hint() {
        let error = LookupError::no_matching_version("alpine", Some("3.19-alpine"));
        assert_eq!(
            error.to_string(),
            "No version of 'alpine' matches hint '3.19-alpine'"
        );

        let error = LookupError::no_matching_version("alpine", None);
        assert_eq!(
            error.to_string(),
            "No version of 'alpine' matches (no usable versions)"
        );
    }
}
