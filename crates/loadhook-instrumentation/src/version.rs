//! Version gating for module descriptors.
//!
//! Descriptors declare accepted versions as npm-style range expressions
//! (`^1.0.0`, `>=1.0.0 <2.0.0`, `1.2.3 - 2.0.0`, `1.x || >=3`). They are
//! translated into `semver::VersionReq` alternatives and evaluated against
//! the version found in the module's package manifest.

use std::fmt;

use semver::{BuildMetadata, Comparator, Op, Prerelease, Version, VersionReq};
use tracing::debug;

use loadhook_core::error::AppError;
use loadhook_core::result::AppResult;

/// Range expression accepting every version, including an unknown one.
pub const ANY_VERSION: &str = "*";

/// Decides whether a descriptor applies to an observed package version.
///
/// An absent version only matches when `ranges` contains [`ANY_VERSION`].
/// Otherwise the version must satisfy at least one range. Prerelease
/// versions only match freely when `include_prerelease` is set.
/// Unparseable versions and ranges never match.
pub fn is_supported(ranges: &[String], version: Option<&str>, include_prerelease: bool) -> bool {
    let Some(raw) = version else {
        return ranges.iter().any(|range| range == ANY_VERSION);
    };

    let Some(version) = parse_version(raw) else {
        debug!(version = %raw, "Ignoring unparseable package version");
        return false;
    };

    ranges.iter().any(|range| match VersionRange::parse(range) {
        Ok(parsed) => parsed.satisfied_by(&version, include_prerelease),
        Err(e) => {
            debug!(range = %range, error = %e, "Ignoring unparseable version range");
            false
        }
    })
}

/// Parses a package version, tolerating a leading `v` or `=`.
pub fn parse_version(raw: &str) -> Option<Version> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('=').unwrap_or(trimmed);
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    let mut version = Version::parse(trimmed).ok()?;
    version.build = BuildMetadata::EMPTY;
    Some(version)
}

/// A parsed range expression: a union of comparator sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    raw: String,
    alternatives: Vec<VersionReq>,
}

impl VersionRange {
    /// Parses an npm-style range expression.
    pub fn parse(raw: &str) -> AppResult<Self> {
        let alternatives = raw
            .split("||")
            .map(|alternative| -> AppResult<VersionReq> {
                let translated = translate_comparator_set(alternative)?;
                Ok(VersionReq::parse(&translated)?)
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self {
            raw: raw.to_string(),
            alternatives,
        })
    }

    /// Whether `version` satisfies any alternative of the range.
    pub fn satisfied_by(&self, version: &Version, include_prerelease: bool) -> bool {
        self.alternatives.iter().any(|req| {
            if include_prerelease {
                req.comparators
                    .iter()
                    .all(|cmp| comparator_matches_prerelease(cmp, version))
            } else {
                req.matches(version)
            }
        })
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Rewrites one space-separated comparator set into `VersionReq` syntax.
fn translate_comparator_set(set: &str) -> AppResult<String> {
    let set = set.trim();
    if set.is_empty() {
        return Ok(ANY_VERSION.to_string());
    }

    if let Some((low, high)) = set.split_once(" - ") {
        let low = strip_v(low.trim());
        let high = strip_v(high.trim());
        if low.is_empty() || high.is_empty() {
            return Err(AppError::version(format!("Invalid hyphen range '{set}'")));
        }
        return Ok(format!(">={low}, <={high}"));
    }

    let mut comparators = Vec::new();
    let mut pending_op: Option<&str> = None;
    for token in set.split_whitespace() {
        if token.chars().all(is_operator_char) {
            pending_op = Some(token);
            continue;
        }
        let token = match pending_op.take() {
            Some(op) => format!("{op}{token}"),
            None => token.to_string(),
        };
        comparators.push(translate_comparator(&token));
    }

    if let Some(op) = pending_op {
        return Err(AppError::version(format!(
            "Dangling operator '{op}' in range '{set}'"
        )));
    }

    Ok(comparators.join(", "))
}

fn translate_comparator(token: &str) -> String {
    let split = token
        .char_indices()
        .find(|(_, c)| !is_operator_char(*c))
        .map(|(i, _)| i)
        .unwrap_or(token.len());
    let (op, version) = token.split_at(split);
    let version = strip_v(version);

    // A bare version is an exact match, not the caret match VersionReq
    // would otherwise assume.
    if op.is_empty() && !has_wildcard(version) {
        format!("={version}")
    } else {
        format!("{op}{version}")
    }
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '<' | '>' | '=' | '~' | '^')
}

fn has_wildcard(version: &str) -> bool {
    version
        .split('.')
        .any(|part| matches!(part, "*" | "x" | "X"))
}

fn strip_v(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

/// Evaluates a comparator without the prerelease restriction.
///
/// Partial comparators are expanded into bounds whose open ends sit below
/// the lowest prerelease of the boundary version, so `<2` excludes
/// `2.0.0-beta` while `>=1` admits `1.0.0-rc`. An upper bound whose
/// component would overflow is treated as unbounded.
fn comparator_matches_prerelease(cmp: &Comparator, version: &Version) -> bool {
    let floor = |major: u64, minor: u64, patch: u64| Version {
        major,
        minor,
        patch,
        pre: lowest_prerelease(),
        build: BuildMetadata::EMPTY,
    };
    let exact = |patch: u64| Version {
        major: cmp.major,
        minor: cmp.minor.unwrap_or(0),
        patch,
        pre: cmp.pre.clone(),
        build: BuildMetadata::EMPTY,
    };
    let (major, minor, patch) = (cmp.major, cmp.minor, cmp.patch);

    let next_patch = |minor: u64, patch: u64| patch.checked_add(1).map(|p| floor(major, minor, p));
    let next_minor = |minor: u64| minor.checked_add(1).map(|m| floor(major, m, 0));
    let next_major = || major.checked_add(1).map(|m| floor(m, 0, 0));
    let below = |upper: Option<Version>| upper.is_none_or(|upper| *version < upper);

    // Half-open interval [lower, upper) covering a partial version.
    let span = || match (minor, patch) {
        (Some(minor), Some(patch)) => (exact(patch), next_patch(minor, patch)),
        (Some(minor), None) => (floor(major, minor, 0), next_minor(minor)),
        (None, _) => (floor(major, 0, 0), next_major()),
    };

    match cmp.op {
        Op::Exact | Op::Wildcard => match patch {
            Some(patch) => *version == exact(patch),
            None => {
                let (lower, upper) = span();
                *version >= lower && below(upper)
            }
        },
        Op::Greater => match patch {
            Some(patch) => *version > exact(patch),
            None => span().1.is_some_and(|upper| *version >= upper),
        },
        Op::GreaterEq => match patch {
            Some(patch) => *version >= exact(patch),
            None => *version >= span().0,
        },
        Op::Less => match patch {
            Some(patch) => *version < exact(patch),
            None => *version < span().0,
        },
        Op::LessEq => match patch {
            Some(patch) => *version <= exact(patch),
            None => below(span().1),
        },
        Op::Tilde => {
            // Tilde keeps a release floor even when prereleases are included.
            let lower = match patch {
                Some(patch) => exact(patch),
                None => Version::new(major, minor.unwrap_or(0), 0),
            };
            let upper = match minor {
                Some(minor) => next_minor(minor),
                None => next_major(),
            };
            *version >= lower && below(upper)
        }
        Op::Caret => {
            let lower = match patch {
                Some(patch) => exact(patch),
                None => floor(major, minor.unwrap_or(0), 0),
            };
            let upper = match (major, minor, patch) {
                (0, Some(0), Some(patch)) => next_patch(0, patch),
                (0, Some(minor), _) => next_minor(minor),
                _ => next_major(),
            };
            *version >= lower && below(upper)
        }
        _ => false,
    }
}

fn lowest_prerelease() -> Prerelease {
    Prerelease::new("0").unwrap_or_default()
}
