//! Registry trait: the injected fetch capability behind every connector

#[cfg(test)]
use mockall::automock;

use crate::version::error::RegistryError;
use crate::version::types::{Ecosystem, PackageVersions, VersionDetails};

/// Fetches raw candidates and per-version details from one package registry
///
/// Implementations own all network I/O and payload parsing. Package
/// identifiers arrive already normalized by the ecosystem's connector.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    /// Returns the ecosystem this registry serves
    fn ecosystem(&self) -> Ecosystem;

    /// Fetches every published version of a package
    ///
    /// # Returns
    /// * `Ok(PackageVersions)` - Candidates in registry order
    /// * `Err(RegistryError::NotFound)` - The registry confirms the package does not exist
    /// * `Err(RegistryError)` - Any other failure
    async fn fetch_all_versions(&self, package_name: &str)
    -> Result<PackageVersions, RegistryError>;

    /// Fetches extra information about the selected version
    ///
    /// Only called for ecosystems whose connector asks for details
    /// (manifest digests, commit dates, action metadata).
    async fn fetch_version_details(
        &self,
        _package_name: &str,
        _version: &str,
        _include_extra: bool,
    ) -> Result<VersionDetails, RegistryError> {
        Ok(VersionDetails::default())
    }
}
