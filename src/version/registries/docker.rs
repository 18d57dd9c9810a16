//! OCI distribution API implementation (Docker Hub, GHCR, Quay, private registries)
//!
//! Tags come from `/v2/<repo>/tags/list`, following `Link` pagination. The
//! digest of a tag is the `Docker-Content-Digest` header of a manifest `HEAD`.
//! Registries that answer 401 with a Bearer challenge get an anonymous pull
//! token from the advertised realm.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::header::{ACCEPT, AUTHORIZATION, WWW_AUTHENTICATE};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::version::connectors::DockerImage;
use crate::version::error::{LookupError, RegistryError};
use crate::version::registries::{check_status, decode_json, http_client, next_page};
use crate::version::registry::Registry;
use crate::version::types::{Ecosystem, PackageVersions, VersionDetails};

const MANIFEST_ACCEPT: &str = "application/vnd.oci.image.index.v1+json, \
    application/vnd.docker.distribution.manifest.list.v2+json, \
    application/vnd.docker.distribution.manifest.v2+json, \
    application/vnd.oci.image.manifest.v1+json";

const DIGEST_HEADER: &str = "docker-content-digest";

/// Upper bound on followed `Link: rel="next"` pages
const MAX_PAGES: usize = 50;

static CHALLENGE_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\w+)="([^"]*)""#).expect("challenge pattern is valid"));

#[derive(Debug, Deserialize)]
struct TagList {
    #[serde(default)]
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

pub struct DockerRegistry {
    client: reqwest::Client,
    scheme: String,
    /// Replaces Docker Hub's registry host (pull-through mirrors)
    hub_url: Option<String>,
}

impl DockerRegistry {
    pub fn new() -> Self {
        Self {
            client: http_client(),
            scheme: "https".to_string(),
            hub_url: None,
        }
    }

    /// Talk to registries over a different scheme (plain `http` for local registries)
    pub fn with_scheme(mut self, scheme: &str) -> Self {
        self.scheme = scheme.to_string();
        self
    }

    pub fn with_hub_url(mut self, hub_url: Option<String>) -> Self {
        self.hub_url = hub_url.map(|url| url.trim_end_matches('/').to_string());
        self
    }

    fn base_url(&self, image: &DockerImage) -> String {
        match &self.hub_url {
            Some(hub_url) if image.is_docker_hub() => hub_url.clone(),
            _ => format!("{}://{}", self.scheme, image.registry),
        }
    }

    fn parse_image(package_name: &str) -> Result<DockerImage, RegistryError> {
        DockerImage::parse(package_name).map_err(|e: LookupError| {
            RegistryError::InvalidResponse(format!("invalid image reference: {}", e))
        })
    }

    /// Send a request, answering one Bearer challenge with an anonymous token
    async fn send(
        &self,
        method: Method,
        url: &str,
        accept: Option<&str>,
        token: &mut Option<String>,
    ) -> Result<reqwest::Response, RegistryError> {
        let response = self.request(method.clone(), url, accept, token.as_deref()).await?;

        if response.status() != StatusCode::UNAUTHORIZED || token.is_some() {
            return Ok(response);
        }

        let Some(challenge) = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
        else {
            return Ok(response);
        };

        *token = Some(self.fetch_token(&challenge).await?);
        self.request(method, url, accept, token.as_deref()).await
    }

    async fn request(
        &self,
        method: Method,
        url: &str,
        accept: Option<&str>,
        token: Option<&str>,
    ) -> Result<reqwest::Response, RegistryError> {
        let mut request = self.client.request(method, url);
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        Ok(request.send().await?)
    }

    async fn fetch_token(&self, challenge: &str) -> Result<String, RegistryError> {
        let params = parse_challenge(challenge);
        let realm = params
            .iter()
            .find(|(k, _)| k == "realm")
            .map(|(_, v)| v.as_str())
            .ok_or_else(|| {
                RegistryError::InvalidResponse(format!("unsupported auth challenge: {}", challenge))
            })?;

        let mut url = reqwest::Url::parse(realm)
            .map_err(|e| RegistryError::InvalidResponse(format!("invalid token realm: {}", e)))?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params.iter().filter(|(k, _)| k != "realm") {
                query.append_pair(key, value);
            }
        }

        debug!("Requesting registry token from {}", url);
        let response = self.client.get(url).send().await?;
        let response = check_status(response, realm, "Registry token service")?;
        let token: TokenResponse = decode_json(response, "registry token service").await?;

        token
            .token
            .or(token.access_token)
            .ok_or_else(|| RegistryError::InvalidResponse("token response has no token".to_string()))
    }
}

impl Default for DockerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// `Bearer realm="...",service="...",scope="..."` into key/value pairs
fn parse_challenge(challenge: &str) -> Vec<(String, String)> {
    CHALLENGE_PARAM
        .captures_iter(challenge)
        .map(|caps| (caps[1].to_ascii_lowercase(), caps[2].to_string()))
        .collect()
}

/// Map a denied or missing repository to `NotFound`
fn repository_status(
    response: reqwest::Response,
    package_name: &str,
) -> Result<reqwest::Response, RegistryError> {
    if matches!(
        response.status(),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
    ) {
        warn!(
            "Registry denied access to {} ({}), treating it as missing",
            package_name,
            response.status()
        );
        return Err(RegistryError::NotFound(package_name.to_string()));
    }
    check_status(response, package_name, "Container registry")
}

#[async_trait::async_trait]
impl Registry for DockerRegistry {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Docker
    }

    async fn fetch_all_versions(
        &self,
        package_name: &str,
    ) -> Result<PackageVersions, RegistryError> {
        let image = Self::parse_image(package_name)?;
        let base_url = self.base_url(&image);
        let mut next = Some(format!("{}/v2/{}/tags/list?n=1000", base_url, image.repository));
        let mut token = None;
        let mut tags = Vec::new();

        for _ in 0..MAX_PAGES {
            let Some(url) = next.take() else {
                break;
            };

            let response = self.send(Method::GET, &url, None, &mut token).await?;
            let response = repository_status(response, package_name)?;

            next = next_page(&response).map(|target| {
                if target.starts_with('/') {
                    format!("{}{}", base_url, target)
                } else {
                    target
                }
            });

            let page: TagList = decode_json(response, "Container registry").await?;
            tags.extend(page.tags.unwrap_or_default());
        }

        debug!("Fetched {} tags for {}", tags.len(), image);
        Ok(PackageVersions::from_strings(tags))
    }

    async fn fetch_version_details(
        &self,
        package_name: &str,
        version: &str,
        _include_extra: bool,
    ) -> Result<VersionDetails, RegistryError> {
        let image = Self::parse_image(package_name)?;
        let url = format!(
            "{}/v2/{}/manifests/{}",
            self.base_url(&image),
            image.repository,
            version
        );

        let mut token = None;
        let response = self
            .send(Method::HEAD, &url, Some(MANIFEST_ACCEPT), &mut token)
            .await?;
        let response = repository_status(response, package_name)?;

        let digest = response
            .headers()
            .get(DIGEST_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                RegistryError::InvalidResponse(format!(
                    "manifest for {}:{} has no digest header",
                    image, version
                ))
            })?;

        Ok(VersionDetails {
            digest: Some(digest),
            ..VersionDetails::default()
        })
    }
}
