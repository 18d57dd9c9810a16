//! Hint matching
//!
//! Narrows a candidate list before the comparator picks the maximum. A hint
//! has the shape `<numeric-prefix>[-<suffix>]` (`3.19-alpine`, `1.2`,
//! `3.7.0b1`) or is a bare suffix (`alpine`).
//!
//! - Tag-style rules require candidates to carry exactly the hint's suffix,
//!   so `3.19-slim` never satisfies `3.19-alpine`.
//! - Container tags are also pinned to the hint's numeric prefix: `3.19-alpine`
//!   accepts `3.19.2-alpine` but not `3.20-alpine`.
//! - SemVer rules treat the dash part as a pre-release, so only the
//!   pre-release preference is taken from the hint.
//! - Stable candidates win over pre-releases unless the hint itself is a
//!   pre-release or no stable candidate survives.

use std::sync::LazyLock;

use regex::Regex;

use super::model::{DashSuffix, VersionRules, parse};

/// Tags that float between releases and never name a version
const FLOATING_TAGS: &[&str] = &["latest", "stable", "edge", "nightly", "dev", "master", "main"];

static COMMIT_HASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-f0-9]{7,40}$").expect("hash pattern is valid"));

static TAG_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<release>[0-9]+(?:\.[0-9]+)*)[A-Za-z0-9_]*$").expect("tag pattern is valid")
});

/// Normalized hint
#[derive(Debug, Clone, PartialEq, Eq)]
struct Hint {
    /// Release segments the candidate must start with; empty for a bare suffix
    release: Vec<u64>,
    suffix: String,
    prerelease: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct HintMatcher {
    rules: VersionRules,
    container_tags: bool,
}

impl HintMatcher {
    pub fn new(rules: VersionRules) -> Self {
        Self {
            rules,
            container_tags: false,
        }
    }

    /// Matcher for container image tags: floating tags, commit hashes and
    /// date-like numbers are dropped, and unsuffixed tags are preferred when
    /// no hint is given.
    pub fn for_container_tags(rules: VersionRules) -> Self {
        Self {
            rules,
            container_tags: true,
        }
    }

    /// Filter candidates by hint, preserving their original order
    pub fn filter_candidates<'a, S: AsRef<str>>(
        &self,
        candidates: &'a [S],
        hint: Option<&str>,
    ) -> Vec<&'a S> {
        let mut eligible: Vec<&S> = candidates
            .iter()
            .filter(|c| !self.container_tags || is_version_tag(text(*c)))
            .collect();

        let hint = hint.and_then(|h| self.parse_hint(h));

        let allow_prerelease = match &hint {
            Some(hint) => {
                if self.rules.dash_suffix == DashSuffix::Variant {
                    eligible.retain(|c| {
                        split_tag(text(*c))
                            .is_some_and(|(_, suffix)| suffix.eq_ignore_ascii_case(&hint.suffix))
                    });
                } else {
                    eligible.retain(|c| split_tag(text(*c)).is_some());
                }
                if self.container_tags {
                    eligible.retain(|c| {
                        split_tag(text(*c))
                            .is_some_and(|(prefix, _)| has_release_prefix(prefix, &hint.release))
                    });
                }
                hint.prerelease
            }
            None => {
                if self.container_tags {
                    prefer(&mut eligible, |c| {
                        split_tag(text(*c)).is_some_and(|(_, suffix)| suffix.is_empty())
                    });
                }
                false
            }
        };

        if !allow_prerelease {
            let rules = self.rules;
            prefer(&mut eligible, |c| parse(text(*c), &rules).is_stable());
        }

        eligible
    }

    fn parse_hint(&self, raw: &str) -> Option<Hint> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let hint = match split_tag(raw) {
            Some((prefix, suffix)) => Hint {
                release: leading_release(prefix),
                suffix: suffix.to_string(),
                prerelease: parse(raw, &self.rules).is_prerelease(),
            },
            None => Hint {
                release: Vec::new(),
                suffix: raw.to_string(),
                prerelease: false,
            },
        };
        Some(hint)
    }
}

fn text<S: AsRef<str>>(candidate: &S) -> &str {
    candidate.as_ref()
}

/// Keep only the items matching `preferred`, unless none do
fn prefer<T>(items: &mut Vec<T>, preferred: impl Fn(&T) -> bool) {
    if items.iter().any(&preferred) {
        items.retain(preferred);
    }
}

/// Split `v1.2-alpine` into (`1.2`, `alpine`); `None` when there is no
/// numeric prefix
fn split_tag(tag: &str) -> Option<(&str, &str)> {
    let tag = strip_v(tag);
    let (prefix, suffix) = tag.split_once('-').unwrap_or((tag, ""));
    prefix
        .starts_with(|c: char| c.is_ascii_digit())
        .then_some((prefix, suffix))
}

/// Numeric segments at the start of a tag prefix: `3.7.0b1` gives `[3, 7, 0]`
fn leading_release(prefix: &str) -> Vec<u64> {
    let end = prefix
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(prefix.len());
    prefix[..end]
        .split('.')
        .map_while(|segment| segment.parse().ok())
        .collect()
}

/// `3.19.2` extends `3.19`; missing candidate segments count as zero
fn has_release_prefix(prefix: &str, release: &[u64]) -> bool {
    let candidate = leading_release(prefix);
    release
        .iter()
        .enumerate()
        .all(|(i, segment)| candidate.get(i).copied().unwrap_or(0) == *segment)
}

fn strip_v(tag: &str) -> &str {
    match tag.strip_prefix(['v', 'V']) {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ => tag,
    }
}

/// Whether a container tag names a concrete version
pub fn is_version_tag(tag: &str) -> bool {
    if tag.is_empty() || FLOATING_TAGS.contains(&tag.to_ascii_lowercase().as_str()) {
        return false;
    }

    if COMMIT_HASH.is_match(tag) && !tag.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let Some((prefix, _)) = split_tag(tag) else {
        return false;
    };
    let Some(caps) = TAG_PREFIX.captures(prefix) else {
        return false;
    };

    // Single large numbers are build dates, not versions
    let release = &caps["release"];
    if !release.contains('.') && release.parse::<u64>().map_or(true, |n| n >= 1000) {
        return false;
    }

    true
}
