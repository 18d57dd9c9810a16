//! Universal version model and comparator
//!
//! Every raw version string parses into a [`ParsedVersion`]; parsing never
//! fails. Strings the grammar cannot classify become *irregular* versions,
//! which rank below every well-formed version and compare lexicographically
//! among themselves.
//!
//! Ecosystems disagree on a few conventions, so parsing is driven by a
//! [`VersionRules`] value:
//! - what a dash suffix means (`1.0-alpine` is a variant for container tags,
//!   `1.0.0-next.3` is a pre-release for SemVer registries)
//! - how local/build metadata (`+local`) ranks against a plain release
//! - which prefixes and release qualifiers are dropped before parsing

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// How `+local` / build metadata takes part in ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalOrdering {
    /// Build metadata never affects ordering (SemVer)
    Ignore,
    /// A version with local metadata sorts just below the same version without it
    BelowPlain,
    /// A version with local metadata sorts just above the same version without it (PEP 440)
    AbovePlain,
}

/// Meaning of a dash suffix that is not a recognised pre/post/dev marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashSuffix {
    /// `3.19-alpine`: a build variant of the release
    Variant,
    /// `1.0.0-next.3`: an opaque pre-release label
    PreRelease,
}

/// Per-ecosystem parsing rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRules {
    pub name: &'static str,
    /// Prefixes removed when directly followed by a digit
    pub strip_prefixes: &'static [&'static str],
    pub local: LocalOrdering,
    pub dash_suffix: DashSuffix,
    /// Trailing qualifiers equivalent to a plain release (`.Final`, `.RELEASE`)
    pub release_qualifiers: &'static [&'static str],
}

impl VersionRules {
    /// SemVer registries: npm, crates.io, Go, NuGet, Helm, Terraform, pub.dev
    pub const SEMVER: VersionRules = VersionRules {
        name: "semver",
        strip_prefixes: &["v", "V"],
        local: LocalOrdering::Ignore,
        dash_suffix: DashSuffix::PreRelease,
        release_qualifiers: &[],
    };

    /// PEP 440 (PyPI)
    pub const PEP440: VersionRules = VersionRules {
        name: "pep440",
        strip_prefixes: &["v", "V"],
        local: LocalOrdering::AbovePlain,
        dash_suffix: DashSuffix::Variant,
        release_qualifiers: &[],
    };

    /// Container image and git tags
    pub const TAG: VersionRules = VersionRules {
        name: "tag",
        strip_prefixes: &["v", "V"],
        local: LocalOrdering::BelowPlain,
        dash_suffix: DashSuffix::Variant,
        release_qualifiers: &[],
    };

    /// Maven repositories
    pub const MAVEN: VersionRules = VersionRules {
        name: "maven",
        strip_prefixes: &["v", "V"],
        local: LocalOrdering::BelowPlain,
        dash_suffix: DashSuffix::Variant,
        release_qualifiers: &["final", "release", "ga"],
    };

    /// Loosely formatted registries: Packagist, RubyGems
    pub const LOOSE: VersionRules = VersionRules {
        name: "loose",
        strip_prefixes: &["v", "V"],
        local: LocalOrdering::BelowPlain,
        dash_suffix: DashSuffix::Variant,
        release_qualifiers: &[],
    };
}

impl Default for VersionRules {
    fn default() -> Self {
        VersionRules::LOOSE
    }
}

/// Pre-release kind, in ascending rank
///
/// `Other` holds SemVer labels that map to no known kind and ranks below
/// `Alpha`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreKind {
    Other(String),
    Alpha,
    Beta,
    Milestone,
    Rc,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PreRelease {
    pub kind: PreKind,
    pub number: u64,
}

/// One dot-separated segment of local/build metadata
///
/// Declaration order matters: numeric segments outrank alphabetic ones.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LocalSegment {
    Alpha(String),
    Numeric(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Components {
    release: Vec<u64>,
    pre: Option<PreRelease>,
    post: Option<u64>,
    dev: Option<u64>,
    variant: Option<String>,
    local: Option<Vec<LocalSegment>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Shape {
    Regular(Components),
    Irregular(String),
}

/// Structured, totally ordered form of a raw version string
#[derive(Debug, Clone)]
pub struct ParsedVersion {
    raw: String,
    rules: VersionRules,
    shape: Shape,
}

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)^
        (?P<release>[0-9]+(?:\.[0-9]+)*)
        (?P<pre>
            [._-]?
            (?P<pre_l>alpha|a|beta|b|preview|pre|c|rc|milestone|m)
            [._-]?
            (?P<pre_n>[0-9]+)?
        )?
        (?P<post>
            (?:-(?P<post_n1>[0-9]+))
            |
            (?:[._-]?(?P<post_l>post|rev|r)[._-]?(?P<post_n2>[0-9]+)?)
        )?
        (?P<dev>
            [._-]?
            (?P<dev_l>dev|snapshot)
            [._-]?
            (?P<dev_n>[0-9]+)?
        )?
        (?P<variant>-[a-z0-9]+(?:[._-][a-z0-9]+)*)?
        (?P<local>\+[a-z0-9]+(?:[._-][a-z0-9]+)*)?
        $",
    )
    .expect("version pattern is valid")
});

static SEMVER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<major>[0-9]+)\.(?P<minor>[0-9]+)\.(?P<patch>[0-9]+)(?:-(?P<pre>[0-9A-Za-z.-]+))?(?:\+(?P<build>[0-9A-Za-z.-]+))?$",
    )
    .expect("semver pattern is valid")
});

static LABEL_WITH_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<label>[A-Za-z]*)(?P<number>[0-9]*)$").expect("label pattern is valid")
});

/// Parse a raw version string using the given ecosystem rules
///
/// Never fails: unclassifiable input yields an irregular version.
pub fn parse(raw: &str, rules: &VersionRules) -> ParsedVersion {
    let shape = match parse_components(raw, rules) {
        Some(components) => Shape::Regular(components),
        None => {
            debug!("Version '{}' is irregular under {} rules", raw, rules.name);
            Shape::Irregular(raw.trim().to_string())
        }
    };

    ParsedVersion {
        raw: raw.to_string(),
        rules: *rules,
        shape,
    }
}

/// Compare two versions parsed with the same rules
pub fn compare(a: &ParsedVersion, b: &ParsedVersion) -> Ordering {
    a.cmp(b)
}

fn parse_components(raw: &str, rules: &VersionRules) -> Option<Components> {
    let mut text = raw.trim();

    for prefix in rules.strip_prefixes {
        if let Some(rest) = text.strip_prefix(prefix)
            && rest.starts_with(|c: char| c.is_ascii_digit())
        {
            text = rest;
            break;
        }
    }

    let text = strip_release_qualifier(text, rules.release_qualifiers);

    if rules.dash_suffix == DashSuffix::PreRelease
        && let Some(components) = parse_semver(text)
    {
        return Some(components);
    }

    let caps = VERSION_PATTERN.captures(text)?;

    let release = parse_release(caps.name("release")?.as_str())?;

    let mut pre = match caps.name("pre_l") {
        Some(label) => Some(PreRelease {
            kind: pre_kind(label.as_str()),
            number: parse_counter(caps.name("pre_n").map(|m| m.as_str()))?,
        }),
        None => None,
    };

    let post = if let Some(n) = caps.name("post_n1") {
        Some(parse_counter(Some(n.as_str()))?)
    } else if caps.name("post_l").is_some() {
        Some(parse_counter(caps.name("post_n2").map(|m| m.as_str()))?)
    } else {
        None
    };

    let dev = match caps.name("dev_l") {
        Some(_) => Some(parse_counter(caps.name("dev_n").map(|m| m.as_str()))?),
        None => None,
    };

    let mut variant = caps
        .name("variant")
        .map(|m| m.as_str().trim_start_matches('-').to_string());

    if rules.dash_suffix == DashSuffix::PreRelease
        && pre.is_none()
        && let Some(label) = variant.take()
    {
        pre = Some(opaque_pre_release(&label));
    }

    let local = caps
        .name("local")
        .map(|m| parse_local(m.as_str().trim_start_matches('+')));

    Some(Components {
        release,
        pre,
        post,
        dev,
        variant,
        local,
    })
}

fn strip_release_qualifier<'a>(text: &'a str, qualifiers: &[&str]) -> &'a str {
    for qualifier in qualifiers {
        let Some(split_at) = text.len().checked_sub(qualifier.len() + 1) else {
            continue;
        };
        if !text.is_char_boundary(split_at) {
            continue;
        }
        let (head, tail) = text.split_at(split_at);
        let mut tail_chars = tail.chars();
        let separator = tail_chars.next();
        if matches!(separator, Some('.') | Some('-'))
            && tail_chars.as_str().eq_ignore_ascii_case(qualifier)
        {
            return head;
        }
    }
    text
}

/// Strict `MAJOR.MINOR.PATCH[-pre][+build]` parsing for SemVer registries
fn parse_semver(text: &str) -> Option<Components> {
    let caps = SEMVER_PATTERN.captures(text)?;
    let release = vec![
        caps["major"].parse().ok()?,
        caps["minor"].parse().ok()?,
        caps["patch"].parse().ok()?,
    ];

    let mut pre = None;
    let mut dev = None;
    if let Some(identifiers) = caps.name("pre") {
        let parsed = opaque_pre_release(identifiers.as_str());
        let is_dev = matches!(&parsed.kind, PreKind::Other(label) if label == "dev");
        if is_dev {
            dev = Some(parsed.number);
        } else {
            pre = Some(parsed);
        }
    }

    Some(Components {
        release,
        pre,
        post: None,
        dev,
        variant: None,
        local: caps.name("build").map(|m| parse_local(m.as_str())),
    })
}

/// Classify a free-form pre-release string such as `beta.2`, `rc1` or `next.3`
fn opaque_pre_release(identifiers: &str) -> PreRelease {
    let mut label = String::new();
    let mut number = None;

    for identifier in identifiers.split(['.', '-', '_']).filter(|s| !s.is_empty()) {
        if number.is_some() {
            break;
        }
        match LABEL_WITH_NUMBER.captures(identifier) {
            Some(caps) => {
                if label.is_empty() {
                    label = caps["label"].to_ascii_lowercase();
                }
                if !caps["number"].is_empty() {
                    number = caps["number"].parse().ok();
                }
            }
            None if label.is_empty() => label = identifier.to_ascii_lowercase(),
            None => break,
        }
    }

    let kind = match label.as_str() {
        "alpha" | "a" | "beta" | "b" | "milestone" | "m" | "rc" | "c" | "pre" | "preview" => {
            pre_kind(&label)
        }
        _ => PreKind::Other(label),
    };

    PreRelease {
        kind,
        number: number.unwrap_or(0),
    }
}

fn pre_kind(label: &str) -> PreKind {
    match label.to_ascii_lowercase().as_str() {
        "alpha" | "a" => PreKind::Alpha,
        "beta" | "b" => PreKind::Beta,
        "milestone" | "m" => PreKind::Milestone,
        "rc" | "c" | "pre" | "preview" => PreKind::Rc,
        other => PreKind::Other(other.to_string()),
    }
}

fn parse_release(release: &str) -> Option<Vec<u64>> {
    release.split('.').map(|n| n.parse().ok()).collect()
}

fn parse_counter(counter: Option<&str>) -> Option<u64> {
    match counter {
        Some(n) => n.parse().ok(),
        None => Some(0),
    }
}

fn parse_local(local: &str) -> Vec<LocalSegment> {
    local
        .split(['.', '-', '_'])
        .filter(|s| !s.is_empty())
        .map(|segment| match segment.parse::<u64>() {
            Ok(n) => LocalSegment::Numeric(n),
            Err(_) => LocalSegment::Alpha(segment.to_ascii_lowercase()),
        })
        .collect()
}

impl ParsedVersion {
    /// The string this version was parsed from
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn rules(&self) -> &VersionRules {
        &self.rules
    }

    pub fn is_irregular(&self) -> bool {
        matches!(self.shape, Shape::Irregular(_))
    }

    /// Pre-release or development release
    pub fn is_prerelease(&self) -> bool {
        match &self.shape {
            Shape::Regular(c) => c.pre.is_some() || c.dev.is_some(),
            Shape::Irregular(_) => false,
        }
    }

    /// Well-formed and not a pre-release
    pub fn is_stable(&self) -> bool {
        !self.is_irregular() && !self.is_prerelease()
    }

    pub fn release(&self) -> &[u64] {
        match &self.shape {
            Shape::Regular(c) => &c.release,
            Shape::Irregular(_) => &[],
        }
    }

    pub fn pre(&self) -> Option<&PreRelease> {
        self.components().and_then(|c| c.pre.as_ref())
    }

    pub fn post(&self) -> Option<u64> {
        self.components().and_then(|c| c.post)
    }

    pub fn dev(&self) -> Option<u64> {
        self.components().and_then(|c| c.dev)
    }

    pub fn variant(&self) -> Option<&str> {
        self.components().and_then(|c| c.variant.as_deref())
    }

    pub fn local(&self) -> Option<&[LocalSegment]> {
        self.components().and_then(|c| c.local.as_deref())
    }

    fn components(&self) -> Option<&Components> {
        match &self.shape {
            Shape::Regular(c) => Some(c),
            Shape::Irregular(_) => None,
        }
    }
}

impl fmt::Display for ParsedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Pre-release slot of the comparison key; a bare dev release sorts before
/// every pre-release of the same release.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum PreKey<'a> {
    DevOnly,
    Pre(&'a PreRelease),
    Final,
}

/// A missing dev segment sorts after any dev segment
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum DevKey {
    Dev(u64),
    Final,
}

/// A missing variant sorts after any variant
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum VariantKey<'a> {
    Variant(&'a str),
    Plain,
}

fn compare_release(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            x.cmp(&y)
        })
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn pre_key(c: &Components) -> PreKey<'_> {
    match (&c.pre, c.post, c.dev, &c.variant) {
        (None, None, Some(_), None) => PreKey::DevOnly,
        (Some(pre), _, _, _) => PreKey::Pre(pre),
        (None, _, _, _) => PreKey::Final,
    }
}

fn dev_key(c: &Components) -> DevKey {
    c.dev.map_or(DevKey::Final, DevKey::Dev)
}

fn variant_key(c: &Components) -> VariantKey<'_> {
    c.variant.as_deref().map_or(VariantKey::Plain, VariantKey::Variant)
}

fn compare_local(
    a: Option<&Vec<LocalSegment>>,
    b: Option<&Vec<LocalSegment>>,
    ordering: LocalOrdering,
) -> Ordering {
    match (ordering, a, b) {
        (LocalOrdering::Ignore, _, _) => Ordering::Equal,
        (_, None, None) => Ordering::Equal,
        (_, Some(x), Some(y)) => x.cmp(y),
        (LocalOrdering::AbovePlain, Some(_), None) => Ordering::Greater,
        (LocalOrdering::AbovePlain, None, Some(_)) => Ordering::Less,
        (LocalOrdering::BelowPlain, Some(_), None) => Ordering::Less,
        (LocalOrdering::BelowPlain, None, Some(_)) => Ordering::Greater,
    }
}

fn compare_components(a: &Components, b: &Components, local: LocalOrdering) -> Ordering {
    compare_release(&a.release, &b.release)
        .then_with(|| pre_key(a).cmp(&pre_key(b)))
        .then_with(|| a.post.cmp(&b.post))
        .then_with(|| dev_key(a).cmp(&dev_key(b)))
        .then_with(|| variant_key(a).cmp(&variant_key(b)))
        .then_with(|| compare_local(a.local.as_ref(), b.local.as_ref(), local))
}

impl Ord for ParsedVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        debug_assert_eq!(
            self.rules.name, other.rules.name,
            "versions parsed with different rules are not comparable"
        );

        match (&self.shape, &other.shape) {
            (Shape::Regular(a), Shape::Regular(b)) => compare_components(a, b, self.rules.local),
            (Shape::Regular(_), Shape::Irregular(_)) => Ordering::Greater,
            (Shape::Irregular(_), Shape::Regular(_)) => Ordering::Less,
            (Shape::Irregular(a), Shape::Irregular(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for ParsedVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ParsedVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ParsedVersion {}
