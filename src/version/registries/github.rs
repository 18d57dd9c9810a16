//! GitHub repository tags registry implementation
//!
//! Serves GitHub Actions and GitHub-hosted Swift packages. Candidates are the
//! repository's tags with their commit SHA as digest. Details add the commit
//! date, the `action.yml` sections for actions and the README on request.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::version::connectors::GitHubRepo;
use crate::version::error::RegistryError;
use crate::version::registries::{
    check_status, decode_json, http_client, next_page, normalize_timestamp, yaml,
};
use crate::version::registry::Registry;
use crate::version::types::{Ecosystem, PackageVersions, VersionDetails, VersionEntry};

/// Default base URL for GitHub API
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default base URL for raw repository content
pub const DEFAULT_RAW_URL: &str = "https://raw.githubusercontent.com";

const MAX_PAGES: usize = 10;

/// Top-level `action.yml` sections reported as metadata
const ACTION_SECTIONS: [&str; 3] = ["inputs", "outputs", "runs"];

#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
    commit: TagCommit,
}

#[derive(Debug, Deserialize)]
struct TagCommit {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct Commit {
    sha: String,
    commit: CommitInfo,
}

#[derive(Debug, Deserialize)]
struct CommitInfo {
    author: Option<Signature>,
    committer: Option<Signature>,
}

#[derive(Debug, Deserialize)]
struct Signature {
    date: Option<String>,
}

/// Registry implementation for GitHub repository tags
pub struct GitHubRegistry {
    client: reqwest::Client,
    api_url: String,
    raw_url: String,
    token: Option<String>,
    ecosystem: Ecosystem,
}

impl GitHubRegistry {
    /// Registry for GitHub Actions with custom API and raw content base URLs
    pub fn new(api_url: &str, raw_url: &str) -> Self {
        Self {
            client: http_client(),
            api_url: api_url.trim_end_matches('/').to_string(),
            raw_url: raw_url.trim_end_matches('/').to_string(),
            token: None,
            ecosystem: Ecosystem::GitHubActions,
        }
    }

    /// Same tag listing, serving Swift packages (no action metadata)
    pub fn for_swift(mut self) -> Self {
        self.ecosystem = Ecosystem::Swift;
        self
    }

    /// Personal access token sent with API requests
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    fn parse_repo(package_name: &str) -> Result<GitHubRepo, RegistryError> {
        GitHubRepo::parse(package_name).map_err(|e| {
            RegistryError::InvalidResponse(format!("invalid repository: {}", e))
        })
    }

    fn api_get(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json");
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch_commit(
        &self,
        repo: &GitHubRepo,
        reference: &str,
    ) -> Result<Commit, RegistryError> {
        let url = format!("{}/repos/{}/commits/{}", self.api_url, repo, reference);
        let response = self.api_get(&url).send().await?;
        let response = check_status(response, &repo.to_string(), "GitHub API")?;
        decode_json(response, "GitHub API").await
    }

    /// Raw file at a tag; `Ok(None)` when the file does not exist
    async fn fetch_raw(
        &self,
        repo: &GitHubRepo,
        tag: &str,
        path: &str,
    ) -> Result<Option<String>, RegistryError> {
        let url = format!("{}/{}/{}/{}", self.raw_url, repo, tag, path);
        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response, &repo.to_string(), "GitHub raw content")?;
        let text = response.text().await.map_err(|e| {
            warn!("Failed to read {} from {}: {}", path, repo, e);
            RegistryError::InvalidResponse(e.to_string())
        })?;
        Ok(Some(text))
    }

    async fn fetch_action_metadata(
        &self,
        repo: &GitHubRepo,
        tag: &str,
    ) -> Result<Option<String>, RegistryError> {
        for file in ["action.yml", "action.yaml"] {
            if let Some(content) = self.fetch_raw(repo, tag, file).await? {
                return extract_action_sections(&content).map(Some);
            }
        }
        warn!("No action.yml or action.yaml found for {}@{}", repo, tag);
        Ok(None)
    }
}

impl Default for GitHubRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL, DEFAULT_RAW_URL)
    }
}

/// `inputs`, `outputs` and `runs` of an action manifest, as written
fn extract_action_sections(content: &str) -> Result<String, RegistryError> {
    let tree = yaml::parse(content)?;
    let root = tree.root_node();

    let sections: Vec<&str> = yaml::pair_nodes(root)
        .into_iter()
        .filter(|pair| {
            pair.child_by_field_name("key")
                .is_some_and(|key| ACTION_SECTIONS.contains(&yaml::scalar_text(key, content).as_str()))
        })
        .map(|pair| yaml::source(pair, content).trim_end())
        .collect();

    Ok(sections.join("\n"))
}

#[async_trait::async_trait]
impl Registry for GitHubRegistry {
    fn ecosystem(&self) -> Ecosystem {
        self.ecosystem
    }

    async fn fetch_all_versions(
        &self,
        package_name: &str,
    ) -> Result<PackageVersions, RegistryError> {
        let repo = Self::parse_repo(package_name)?;
        let mut next = Some(format!("{}/repos/{}/tags?per_page=100", self.api_url, repo));
        let mut versions = Vec::new();

        for _ in 0..MAX_PAGES {
            let Some(url) = next.take() else {
                break;
            };

            let response = self.api_get(&url).send().await?;
            let response = check_status(response, package_name, "GitHub API")?;
            next = next_page(&response);

            let tags: Vec<Tag> = decode_json(response, "GitHub API").await?;
            versions.extend(
                tags.into_iter()
                    .map(|tag| VersionEntry::new(tag.name).with_digest(Some(tag.commit.sha))),
            );
        }

        debug!("Fetched {} tags for {}", versions.len(), repo);
        Ok(PackageVersions::new(versions))
    }

    async fn fetch_version_details(
        &self,
        package_name: &str,
        version: &str,
        include_extra: bool,
    ) -> Result<VersionDetails, RegistryError> {
        let repo = Self::parse_repo(package_name)?;
        let mut details = VersionDetails::default();

        if self.ecosystem == Ecosystem::Swift {
            let commit = self.fetch_commit(&repo, version).await?;
            let date = commit
                .commit
                .author
                .and_then(|s| s.date)
                .or_else(|| commit.commit.committer.and_then(|s| s.date));
            details.digest = Some(commit.sha);
            details.published_at = date.as_deref().map(normalize_timestamp);
        } else {
            details.metadata = self.fetch_action_metadata(&repo, version).await?;
        }

        if include_extra {
            details.readme = self.fetch_raw(&repo, version, "README.md").await?;
        }

        Ok(details)
    }
}
