//! Ecosystem connector trait
//!
//! A connector turns a package identifier and an optional hint into a single
//! resolved version. The shared pipeline lives in [`Connector::resolve`]:
//!
//! 1. validate and normalize the identifier
//! 2. fetch raw candidates through the injected [`Registry`]
//! 3. drop yanked candidates and apply the [`HintMatcher`]
//! 4. parse survivors with the ecosystem's [`VersionRules`] and take the
//!    maximum, ties going to the earliest fetched candidate
//! 5. optionally fetch details (digest, publish date, metadata) for the winner

use tracing::{debug, warn};

use crate::version::error::LookupError;
use crate::version::matcher::HintMatcher;
use crate::version::model::{ParsedVersion, VersionRules, parse};
use crate::version::registry::Registry;
use crate::version::types::{Ecosystem, PackageVersions, ResolutionResult, VersionEntry};

/// Trait for ecosystem-specific resolution logic
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    /// Returns the ecosystem this connector handles
    fn ecosystem(&self) -> Ecosystem;

    /// Version parsing rules for this ecosystem
    fn rules(&self) -> VersionRules;

    fn matcher(&self) -> HintMatcher {
        HintMatcher::new(self.rules())
    }

    /// Validate a package identifier and return its canonical form
    ///
    /// The canonical form is what the registry receives and what the cache
    /// keys on.
    fn normalize_package(&self, package_name: &str) -> Result<String, LookupError>;

    /// Whether the selected version always needs a details fetch
    fn wants_details(&self) -> bool {
        false
    }

    /// Pick the latest eligible candidate
    fn select(
        &self,
        package_name: &str,
        versions: &PackageVersions,
        hint: Option<&str>,
    ) -> Result<VersionEntry, LookupError> {
        select_latest(&self.matcher(), &self.rules(), package_name, versions, hint)
    }

    /// Resolve the latest version of a package
    ///
    /// The result carries `package_name` as given.
    async fn resolve(
        &self,
        package_name: &str,
        hint: Option<&str>,
        include_extra: bool,
        registry: &dyn Registry,
    ) -> Result<ResolutionResult, LookupError> {
        let package = self.normalize_package(package_name)?;
        let mut result = self
            .resolve_normalized(&package, hint, include_extra, registry)
            .await?;
        result.package_name = package_name.to_string();
        Ok(result)
    }

    /// Resolve a package already in the form returned by
    /// [`Connector::normalize_package`]
    async fn resolve_normalized(
        &self,
        package: &str,
        hint: Option<&str>,
        include_extra: bool,
        registry: &dyn Registry,
    ) -> Result<ResolutionResult, LookupError> {
        let versions = registry
            .fetch_all_versions(package)
            .await
            .inspect_err(|e| warn!("Failed to fetch versions for {}: {}", package, e))?;

        let selected = self.select(package, &versions, hint)?;
        debug!(
            "Selected {} for {} {} out of {} candidates",
            selected.version,
            self.ecosystem(),
            package,
            versions.versions.len()
        );

        let mut result =
            ResolutionResult::new(self.ecosystem(), package, selected.version.clone());
        result.digest = selected.digest;
        result.published_on = selected.published_at;

        if self.wants_details() || include_extra {
            match registry
                .fetch_version_details(package, &selected.version, include_extra)
                .await
            {
                Ok(details) => {
                    result.digest = details.digest.or(result.digest);
                    result.published_on = details.published_at.or(result.published_on);
                    result.metadata = details.metadata;
                    result.readme = details.readme;
                }
                Err(e) => warn!(
                    "Failed to fetch details for {} {}: {}",
                    package, selected.version, e
                ),
            }
        }

        Ok(result)
    }
}

/// Default selection: drop yanked, hint-match, then take the maximum
pub fn select_latest(
    matcher: &HintMatcher,
    rules: &VersionRules,
    package_name: &str,
    versions: &PackageVersions,
    hint: Option<&str>,
) -> Result<VersionEntry, LookupError> {
    let live: Vec<&VersionEntry> = versions.versions.iter().filter(|v| !v.yanked).collect();

    let mut best: Option<(&VersionEntry, ParsedVersion)> = None;
    for entry in matcher.filter_candidates(live.as_slice(), hint) {
        let parsed = parse(&entry.version, rules);
        let replace = match &best {
            Some((_, current)) => parsed > *current,
            None => true,
        };
        if replace {
            best = Some((*entry, parsed));
        }
    }

    best.map(|(entry, _)| entry.clone())
        .ok_or_else(|| LookupError::no_matching_version(package_name, hint))
}

/// Honor a registry-declared `latest` tag when no hint narrows the choice
///
/// Falls back to the default selection when the tag is missing or names a
/// version that is not among the live candidates.
pub fn select_with_latest_tag(
    matcher: &HintMatcher,
    rules: &VersionRules,
    package_name: &str,
    versions: &PackageVersions,
    hint: Option<&str>,
) -> Result<VersionEntry, LookupError> {
    let hint = hint.map(str::trim).filter(|h| !h.is_empty());

    if hint.is_none()
        && let Some(tagged) = versions.dist_tags.get("latest")
        && let Some(entry) = versions
            .versions
            .iter()
            .find(|v| !v.yanked && &v.version == tagged)
    {
        return Ok(entry.clone());
    }

    select_latest(matcher, rules, package_name, versions, hint)
}
