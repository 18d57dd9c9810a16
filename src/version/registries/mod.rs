//! Registry implementations for fetching package versions

pub mod crates_io;
pub mod docker;
pub mod github;
pub mod go_proxy;
pub mod helm;
pub mod maven;
pub mod npm;
pub mod nuget;
pub mod packagist;
pub mod pub_dev;
pub mod pypi;
pub mod rubygems;
pub mod terraform;
mod yaml;

pub use crates_io::CratesIoRegistry;
pub use docker::DockerRegistry;
pub use github::GitHubRegistry;
pub use go_proxy::GoProxyRegistry;
pub use helm::HelmRegistry;
pub use maven::MavenRegistry;
pub use npm::NpmRegistry;
pub use nuget::NuGetRegistry;
pub use packagist::PackagistRegistry;
pub use pub_dev::PubDevRegistry;
pub use pypi::PyPIRegistry;
pub use rubygems::RubyGemsRegistry;
pub use terraform::TerraformRegistry;

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::version::error::RegistryError;

pub(crate) const USER_AGENT: &str = "version-resolver";

static NEXT_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<([^>]+)>\s*;\s*rel="?next"?"#).expect("link pattern is valid"));

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .expect("Failed to create HTTP client")
}

/// Map registry status codes onto [`RegistryError`]
///
/// 404 means the registry confirmed the package does not exist; 429 carries
/// the `Retry-After` hint; anything else unsuccessful is an invalid response.
pub(crate) fn check_status(
    response: reqwest::Response,
    package_name: &str,
    registry: &str,
) -> Result<reqwest::Response, RegistryError> {
    let status = response.status();

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(RegistryError::NotFound(package_name.to_string()));
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        return Err(RegistryError::RateLimited {
            retry_after_secs: retry_after,
        });
    }

    if !status.is_success() {
        warn!(
            "{} returned status {}: {}",
            registry,
            status,
            response.url()
        );
        return Err(RegistryError::InvalidResponse(format!(
            "Unexpected status: {}",
            status
        )));
    }

    Ok(response)
}

pub(crate) async fn decode_json<T: DeserializeOwned>(
    response: reqwest::Response,
    registry: &str,
) -> Result<T, RegistryError> {
    response.json().await.map_err(|e| {
        warn!("Failed to parse {} response: {}", registry, e);
        RegistryError::InvalidResponse(e.to_string())
    })
}

/// Target of the `rel="next"` entry in a `Link` header, as written
pub(crate) fn next_page(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(reqwest::header::LINK)
        .and_then(|v| v.to_str().ok())
        .and_then(|link| NEXT_LINK.captures(link))
        .map(|caps| caps[1].to_string())
}

/// Normalize a registry timestamp to RFC 3339 (UTC); unknown formats pass through
pub(crate) fn normalize_timestamp(raw: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(&Utc).to_rfc3339();
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(raw) {
        return parsed.with_timezone(&Utc).to_rfc3339();
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return parsed.and_utc().to_rfc3339();
        }
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("2024-01-15T10:30:00Z", "2024-01-15T10:30:00+00:00")]
    #[case("2024-01-15T12:30:00+02:00", "2024-01-15T10:30:00+00:00")]
    #[case("2024-01-15T10:30:00.123456", "2024-01-15T10:30:00.123456+00:00")]
    #[case("2024-01-15 10:30:00", "2024-01-15T10:30:00+00:00")]
    #[case("Mon, 15 Jan 2024 10:30:00 GMT", "2024-01-15T10:30:00+00:00")]
    #[case("yesterday", "yesterday")]
    fn normalize_timestamp_converts_to_rfc3339(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_timestamp(raw), expected);
    }
}
