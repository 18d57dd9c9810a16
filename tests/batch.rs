//! Batch resolution tests

mod helper;

use std::sync::atomic::Ordering;
use std::time::Duration;

use mockito::Server;
use rstest::rstest;

use helper::{FakeRegistry, create_batch_resolver, create_test_resolver};
use version_resolver::config::{RegistryConfig, ResolverConfig};
use version_resolver::service::BatchResolver;
use version_resolver::version::connector::Connector;
use version_resolver::version::connectors::connector_for;
use version_resolver::version::error::LookupError;
use version_resolver::version::registries::{DockerRegistry, NpmRegistry};
use version_resolver::version::types::{Ecosystem, ResolutionRequest};

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn failure_in_one_request_does_not_affect_others() {
    let registry = FakeRegistry::new(Ecosystem::PyPI)
        .with_versions("requests", &["2.31.0", "2.32.3"])
        .with_versions("flask", &["2.3.3", "3.0.3", "3.1.0rc1"]);
    let resolver = create_batch_resolver(vec![create_test_resolver(registry)], TIMEOUT);

    let response = resolver
        .resolve_batch(&[
            ResolutionRequest::new(Ecosystem::PyPI, "requests"),
            ResolutionRequest::new(Ecosystem::PyPI, "no-such-package"),
            ResolutionRequest::new(Ecosystem::PyPI, "Flask"),
        ])
        .await;

    let resolved: Vec<_> = response
        .result
        .iter()
        .map(|r| (r.package_name.as_str(), r.latest_version.as_str()))
        .collect();
    assert_eq!(resolved, vec![("requests", "2.32.3"), ("Flask", "3.0.3")]);

    assert_eq!(response.lookup_errors.len(), 1);
    assert_eq!(response.lookup_errors[0].package_name, "no-such-package");
    assert_eq!(
        response.lookup_errors[0].error,
        LookupError::PackageNotFound("no-such-package".to_string()).to_string()
    );
}

#[tokio::test]
async fn results_across_ecosystems_keep_input_order() {
    let npm = FakeRegistry::new(Ecosystem::Npm).with_versions("react", &["18.3.1", "19.0.0"]);
    let rust = FakeRegistry::new(Ecosystem::Rust)
        .with_versions("serde", &["1.0.210", "1.0.215"])
        .with_versions("tokio", &["1.41.1", "1.42.0"]);
    let resolver = create_batch_resolver(
        vec![create_test_resolver(npm), create_test_resolver(rust)],
        TIMEOUT,
    );

    let response = resolver
        .resolve_batch(&[
            ResolutionRequest::new(Ecosystem::Rust, "serde"),
            ResolutionRequest::new(Ecosystem::Npm, "react"),
            ResolutionRequest::new(Ecosystem::Rust, "tokio"),
        ])
        .await;

    let resolved: Vec<_> = response
        .result
        .iter()
        .map(|r| (r.ecosystem, r.latest_version.as_str()))
        .collect();
    assert_eq!(
        resolved,
        vec![
            (Ecosystem::Rust, "1.0.215"),
            (Ecosystem::Npm, "19.0.0"),
            (Ecosystem::Rust, "1.42.0"),
        ]
    );
    assert!(response.lookup_errors.is_empty());
}

#[tokio::test]
async fn duplicate_requests_in_a_batch_fetch_once() {
    let registry = FakeRegistry::new(Ecosystem::Npm)
        .with_versions("lodash", &["4.17.20", "4.17.21"])
        .with_delay(Duration::from_millis(50));
    let fetches = registry.fetches();
    let resolver = create_batch_resolver(vec![create_test_resolver(registry)], TIMEOUT);

    let requests = vec![ResolutionRequest::new(Ecosystem::Npm, "lodash"); 8];
    let response = resolver.resolve_batch(&requests).await;

    assert_eq!(response.result.len(), 8);
    assert!(response.result.iter().all(|r| r.latest_version == "4.17.21"));
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn disabled_ecosystem_is_reported_per_request() {
    let mut config = ResolverConfig::default();
    config.registries.insert(
        Ecosystem::Helm,
        RegistryConfig {
            enabled: false,
            base_url: None,
        },
    );
    let resolver = BatchResolver::from_config(&config);

    let response = resolver
        .resolve_batch(&[ResolutionRequest::new(
            Ecosystem::Helm,
            "https://charts.example.com/nginx",
        )])
        .await;

    assert!(response.result.is_empty());
    assert_eq!(response.lookup_errors.len(), 1);
    assert_eq!(response.lookup_errors[0].ecosystem, Ecosystem::Helm);
    assert!(!resolver.ecosystems().contains(&Ecosystem::Helm));
}

#[tokio::test]
async fn invalid_identifiers_fail_without_fetching() {
    let registry = FakeRegistry::new(Ecosystem::Docker);
    let fetches = registry.fetches();
    let resolver = create_batch_resolver(vec![create_test_resolver(registry)], TIMEOUT);

    let response = resolver
        .resolve_batch(&[ResolutionRequest::new(Ecosystem::Docker, "alpine:3.19")])
        .await;

    assert_eq!(response.lookup_errors.len(), 1);
    assert!(response.lookup_errors[0].error.contains("alpine:3.19"));
    assert_eq!(fetches.load(Ordering::SeqCst), 0);
    assert!(resolver.cache().is_empty());
}

#[tokio::test(start_paused = true)]
async fn timed_out_lookup_still_populates_cache() {
    let registry = FakeRegistry::new(Ecosystem::Npm)
        .with_versions("slow", &["1.0.0"])
        .with_delay(Duration::from_secs(10));
    let fetches = registry.fetches();
    let resolver = create_batch_resolver(
        vec![create_test_resolver(registry)],
        Duration::from_millis(100),
    );
    let request = ResolutionRequest::new(Ecosystem::Npm, "slow");

    let err = resolver.resolve(&request).await.unwrap_err();
    assert_eq!(err, LookupError::Timeout(100));

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(resolver.cache().len(), 1);

    let result = resolver.resolve(&request).await.unwrap();
    assert_eq!(result.latest_version, "1.0.0");
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn docker_hint_pins_variant_and_reports_digest() {
    let registry = FakeRegistry::new(Ecosystem::Docker)
        .with_versions(
            "registry-1.docker.io/library/alpine",
            &["3.18-alpine", "3.19-alpine", "3.20-alpine", "3.19-slim", "latest"],
        )
        .with_digest("3.19-alpine", "sha256:4bcff63911fcb4448bd4fdacec207030997caf25e9bea4045fa6c8c44de311d1");
    let resolver = create_batch_resolver(vec![create_test_resolver(registry)], TIMEOUT);

    let response = resolver
        .resolve_batch(&[ResolutionRequest::new(Ecosystem::Docker, "alpine").with_hint("3.19-alpine")])
        .await;

    let result = &response.result[0];
    assert_eq!(result.package_name, "alpine");
    assert_eq!(result.latest_version, "3.19-alpine");
    assert_eq!(
        result.digest.as_deref(),
        Some("sha256:4bcff63911fcb4448bd4fdacec207030997caf25e9bea4045fa6c8c44de311d1")
    );
}

#[tokio::test]
async fn npm_lookup_over_http() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/left-pad")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "name": "left-pad",
                "dist-tags": {"latest": "1.0.1"},
                "versions": {"0.0.9": {}, "1.0.0": {}, "1.0.1": {}},
                "time": {"1.0.1": "2016-03-23T08:21:26.584Z"}
            }"#,
        )
        .expect(1)
        .create_async()
        .await;

    let registry = NpmRegistry::new(&server.url());
    let resolver = create_batch_resolver(vec![create_test_resolver(registry)], TIMEOUT);

    let response = resolver
        .resolve_batch(&[
            ResolutionRequest::new(Ecosystem::Npm, "left-pad"),
            ResolutionRequest::new(Ecosystem::Npm, "left-pad"),
        ])
        .await;

    mock.assert_async().await;
    assert_eq!(response.result.len(), 2);
    assert!(response.result.iter().all(|r| r.latest_version == "1.0.1"));
}

#[tokio::test]
async fn docker_lookup_over_http_resolves_digest() {
    let mut server = Server::new_async().await;
    let tags = server
        .mock("GET", "/v2/library/alpine/tags/list?n=1000")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"name": "library/alpine", "tags": ["3.18-alpine", "3.19-alpine", "3.19.1-alpine", "3.20-alpine", "latest"]}"#)
        .create_async()
        .await;
    let manifest = server
        .mock("HEAD", "/v2/library/alpine/manifests/3.19.1-alpine")
        .with_status(200)
        .with_header("docker-content-digest", "sha256:0123456789abcdef")
        .create_async()
        .await;

    let registry = DockerRegistry::new().with_scheme("http");
    let resolver = create_batch_resolver(vec![create_test_resolver(registry)], TIMEOUT);
    let image = format!("{}/library/alpine", server.host_with_port());

    let response = resolver
        .resolve_batch(&[ResolutionRequest::new(Ecosystem::Docker, image.clone()).with_hint("3.19-alpine")])
        .await;

    tags.assert_async().await;
    manifest.assert_async().await;
    assert_eq!(response.lookup_errors, vec![]);
    assert_eq!(response.result[0].package_name, image);
    assert_eq!(response.result[0].latest_version, "3.19.1-alpine");
    assert_eq!(response.result[0].digest.as_deref(), Some("sha256:0123456789abcdef"));
}

#[tokio::test]
async fn swift_package_resolves_through_batch() {
    let registry = FakeRegistry::new(Ecosystem::Swift)
        .with_versions("apple/swift-argument-parser", &["1.2.0", "1.3.0"])
        .with_digest("1.3.0", "c8ed701b513cf5177118a175d85fbbbcd707ab41");
    let resolver = create_batch_resolver(vec![create_test_resolver(registry)], TIMEOUT);
    let url = "https://github.com/apple/swift-argument-parser";

    let response = resolver
        .resolve_batch(&[ResolutionRequest::new(Ecosystem::Swift, url)])
        .await;

    assert_eq!(response.lookup_errors, vec![]);
    assert_eq!(response.result.len(), 1);
    assert_eq!(response.result[0].package_name, url);
    assert_eq!(response.result[0].latest_version, "1.3.0");
    assert_eq!(
        response.result[0].digest.as_deref(),
        Some("c8ed701b513cf5177118a175d85fbbbcd707ab41")
    );
}

#[rstest]
#[case(Ecosystem::Npm, "left-pad", &["1.2.0", "1.3.0"], "1.3.0")]
#[case(Ecosystem::PyPI, "Django", &["5.0.9", "5.1.2"], "5.1.2")]
#[case(Ecosystem::Docker, "alpine", &["3.19", "3.20", "latest"], "3.20")]
#[case(Ecosystem::NuGet, "Newtonsoft.Json", &["13.0.2", "13.0.3"], "13.0.3")]
#[case(Ecosystem::MavenGradle, "org.slf4j:slf4j-api", &["2.0.15", "2.0.16"], "2.0.16")]
#[case(Ecosystem::Helm, "https://charts.example.com/nginx", &["18.1.0", "18.2.0"], "18.2.0")]
#[case(Ecosystem::TerraformProvider, "hashicorp/aws", &["5.79.0", "5.80.0"], "5.80.0")]
#[case(Ecosystem::TerraformModule, "terraform-aws-modules/vpc/aws", &["5.15.0", "5.16.0"], "5.16.0")]
#[case(Ecosystem::Go, "github.com/gin-gonic/gin", &["v1.9.1", "v1.10.0"], "v1.10.0")]
#[case(Ecosystem::Php, "monolog/monolog", &["3.7.0", "3.8.0"], "3.8.0")]
#[case(Ecosystem::RubyGems, "rails", &["7.2.2", "8.0.0"], "8.0.0")]
#[case(Ecosystem::Rust, "serde", &["1.0.210", "1.0.215"], "1.0.215")]
#[case(Ecosystem::Swift, "https://github.com/vapor/vapor.git", &["4.105.0", "4.106.0"], "4.106.0")]
#[case(Ecosystem::Dart, "http", &["1.1.2", "1.2.2"], "1.2.2")]
#[case(Ecosystem::GitHubActions, "actions/checkout", &["v4.1.7", "v4.2.2"], "v4.2.2")]
#[tokio::test]
async fn every_ecosystem_resolves_through_batch(
    #[case] ecosystem: Ecosystem,
    #[case] package: &str,
    #[case] versions: &[&str],
    #[case] expected: &str,
) {
    let normalized = connector_for(ecosystem).normalize_package(package).unwrap();
    let registry = FakeRegistry::new(ecosystem).with_versions(&normalized, versions);
    let fetches = registry.fetches();
    let resolver = create_batch_resolver(vec![create_test_resolver(registry)], TIMEOUT);

    let response = resolver
        .resolve_batch(&[ResolutionRequest::new(ecosystem, package)])
        .await;

    assert_eq!(response.lookup_errors, vec![]);
    assert_eq!(response.result[0].package_name, package);
    assert_eq!(response.result[0].latest_version, expected);
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
}
