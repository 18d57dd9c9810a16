//! Common types shared by connectors, registries, the cache and the orchestrator

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Package ecosystem a request is resolved against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Ecosystem {
    /// npm registry (registry.npmjs.org)
    #[serde(rename = "npm")]
    Npm,
    /// Python Package Index
    #[serde(rename = "pypi")]
    PyPI,
    /// OCI / Docker registries (image tags)
    #[serde(rename = "docker")]
    Docker,
    /// NuGet gallery
    #[serde(rename = "nuget")]
    NuGet,
    /// Maven repositories (Maven and Gradle builds)
    #[serde(rename = "maven_gradle", alias = "maven", alias = "gradle")]
    MavenGradle,
    /// Helm chart repositories (ChartMuseum index or OCI)
    #[serde(rename = "helm")]
    Helm,
    /// Terraform / OpenTofu provider registry
    #[serde(rename = "terraform_provider")]
    TerraformProvider,
    /// Terraform / OpenTofu module registry
    #[serde(rename = "terraform_module")]
    TerraformModule,
    /// Go module proxy
    #[serde(rename = "go")]
    Go,
    /// Packagist (Composer)
    #[serde(rename = "php", alias = "packagist")]
    Php,
    /// rubygems.org
    #[serde(rename = "rubygems")]
    RubyGems,
    /// crates.io
    #[serde(rename = "rust", alias = "crates")]
    Rust,
    /// Swift packages hosted on GitHub
    #[serde(rename = "swift")]
    Swift,
    /// pub.dev
    #[serde(rename = "dart", alias = "pub")]
    Dart,
    /// GitHub Actions (repository tags)
    #[serde(rename = "github_actions")]
    GitHubActions,
}

impl Ecosystem {
    /// Every supported ecosystem, in display order
    pub const ALL: [Ecosystem; 15] = [
        Ecosystem::Npm,
        Ecosystem::PyPI,
        Ecosystem::Docker,
        Ecosystem::NuGet,
        Ecosystem::MavenGradle,
        Ecosystem::Helm,
        Ecosystem::TerraformProvider,
        Ecosystem::TerraformModule,
        Ecosystem::Go,
        Ecosystem::Php,
        Ecosystem::RubyGems,
        Ecosystem::Rust,
        Ecosystem::Swift,
        Ecosystem::Dart,
        Ecosystem::GitHubActions,
    ];

    /// Returns the string representation of the ecosystem
    pub fn as_str(&self) -> &'static str {
        match self {
            Ecosystem::Npm => "npm",
            Ecosystem::PyPI => "pypi",
            Ecosystem::Docker => "docker",
            Ecosystem::NuGet => "nuget",
            Ecosystem::MavenGradle => "maven_gradle",
            Ecosystem::Helm => "helm",
            Ecosystem::TerraformProvider => "terraform_provider",
            Ecosystem::TerraformModule => "terraform_module",
            Ecosystem::Go => "go",
            Ecosystem::Php => "php",
            Ecosystem::RubyGems => "rubygems",
            Ecosystem::Rust => "rust",
            Ecosystem::Swift => "swift",
            Ecosystem::Dart => "dart",
            Ecosystem::GitHubActions => "github_actions",
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Ecosystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "npm" => Ok(Ecosystem::Npm),
            "pypi" => Ok(Ecosystem::PyPI),
            "docker" => Ok(Ecosystem::Docker),
            "nuget" => Ok(Ecosystem::NuGet),
            "maven_gradle" | "maven" | "gradle" => Ok(Ecosystem::MavenGradle),
            "helm" => Ok(Ecosystem::Helm),
            "terraform_provider" => Ok(Ecosystem::TerraformProvider),
            "terraform_module" => Ok(Ecosystem::TerraformModule),
            "go" => Ok(Ecosystem::Go),
            "php" | "packagist" => Ok(Ecosystem::Php),
            "rubygems" => Ok(Ecosystem::RubyGems),
            "rust" | "crates" => Ok(Ecosystem::Rust),
            "swift" => Ok(Ecosystem::Swift),
            "dart" | "pub" => Ok(Ecosystem::Dart),
            "github_actions" => Ok(Ecosystem::GitHubActions),
            other => Err(format!("unknown ecosystem '{}'", other)),
        }
    }
}

/// A single candidate version as reported by a registry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionEntry {
    /// Raw version or tag string
    pub version: String,
    /// Publish timestamp as reported by the registry
    pub published_at: Option<String>,
    /// Content digest when the listing already exposes one (chart digest, tag commit)
    pub digest: Option<String>,
    /// Yanked, deprecated or otherwise withdrawn by the publisher
    pub yanked: bool,
}

impl VersionEntry {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Self::default()
        }
    }

    pub fn with_published_at(mut self, published_at: Option<String>) -> Self {
        self.published_at = published_at;
        self
    }

    pub fn with_digest(mut self, digest: Option<String>) -> Self {
        self.digest = digest;
        self
    }

    pub fn yanked(mut self, yanked: bool) -> Self {
        self.yanked = yanked;
        self
    }
}

impl AsRef<str> for VersionEntry {
    fn as_ref(&self) -> &str {
        &self.version
    }
}

/// Raw candidates fetched for one package, in registry order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageVersions {
    pub versions: Vec<VersionEntry>,
    /// Registry-declared tags such as npm's `latest`
    pub dist_tags: HashMap<String, String>,
}

impl PackageVersions {
    pub fn new(versions: Vec<VersionEntry>) -> Self {
        Self {
            versions,
            dist_tags: HashMap::new(),
        }
    }

    /// Convenience constructor for listings that carry nothing but version strings
    pub fn from_strings<I, S>(versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(versions.into_iter().map(VersionEntry::new).collect())
    }

    pub fn with_dist_tags(mut self, dist_tags: HashMap<String, String>) -> Self {
        self.dist_tags = dist_tags;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn version_strings(&self) -> Vec<String> {
        self.versions.iter().map(|v| v.version.clone()).collect()
    }
}

/// Extra information about one selected version
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionDetails {
    pub digest: Option<String>,
    pub published_at: Option<String>,
    /// Action metadata (`inputs`, `outputs`, `runs`) for GitHub Actions
    pub metadata: Option<String>,
    pub readme: Option<String>,
}

/// One lookup in a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionRequest {
    pub ecosystem: Ecosystem,
    pub package_name: String,
    #[serde(default, alias = "hint", skip_serializing_if = "Option::is_none")]
    pub version_hint: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub include_extra: bool,
}

impl ResolutionRequest {
    pub fn new(ecosystem: Ecosystem, package_name: impl Into<String>) -> Self {
        Self {
            ecosystem,
            package_name: package_name.into(),
            version_hint: None,
            include_extra: false,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.version_hint = Some(hint.into());
        self
    }

    pub fn with_extra(mut self, include_extra: bool) -> Self {
        self.include_extra = include_extra;
        self
    }
}

/// Successful lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub ecosystem: Ecosystem,
    /// Package identifier exactly as the caller gave it
    pub package_name: String,
    pub latest_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
}

impl ResolutionResult {
    pub fn new(
        ecosystem: Ecosystem,
        package_name: impl Into<String>,
        latest_version: impl Into<String>,
    ) -> Self {
        Self {
            ecosystem,
            package_name: package_name.into(),
            latest_version: latest_version.into(),
            digest: None,
            published_on: None,
            metadata: None,
            readme: None,
        }
    }
}

/// Failed lookup, attached to the package's slot in a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionError {
    pub ecosystem: Ecosystem,
    pub package_name: String,
    pub error: String,
    /// Set when a later retry could plausibly succeed (upstream outage, timeout)
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub retryable: bool,
}

/// Output of a batch: successes and failures, each in input order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub result: Vec<ResolutionResult>,
    pub lookup_errors: Vec<ResolutionError>,
}
