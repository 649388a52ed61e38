//! Skip-range parsing and version matching
//!
//! Skip-ranges in an index dump use the blang/semver range grammar:
//! - Comparators separated by whitespace are ANDed: ">=1.0.0 <2.0.0"
//! - Groups separated by "||" are ORed: "<1.0.0 || >=2.0.0 <3.0.0"
//! - A bare version is an exact match: "1.2.3"
//!
//! The `semver` crate speaks the Cargo dialect (comma-ANDed comparators,
//! bare versions meaning caret), so parsing normalizes each group into a
//! [`semver::VersionReq`] rather than reimplementing range evaluation.

use std::fmt;

use anyhow::{bail, Context, Result};
use semver::{Version, VersionReq};

/// A parsed skip-range predicate.
///
/// Keeps the raw range text so renderers can annotate implicit edges with
/// exactly what the bundle declared.
#[derive(Debug, Clone)]
pub struct SkipRange {
    alternatives: Vec<VersionReq>,
    raw: String,
}

impl SkipRange {
    /// Parse a skip-range expression.
    pub fn parse(input: &str) -> Result<Self> {
        let raw = input.trim();
        if raw.is_empty() {
            bail!("empty version range");
        }

        let mut alternatives = Vec::new();
        for group in raw.split("||") {
            let comparators: Vec<String> =
                group.split_whitespace().map(normalize_comparator).collect();
            if comparators.is_empty() {
                bail!("empty alternative in version range '{}'", raw);
            }
            let req = VersionReq::parse(&comparators.join(", "))
                .with_context(|| format!("invalid version range '{}'", raw))?;
            alternatives.push(req);
        }

        Ok(Self {
            alternatives,
            raw: raw.to_string(),
        })
    }

    /// True when the version satisfies any ORed group of the range.
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }

    /// The range text as declared by the bundle.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for SkipRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Parse a bundle version string.
pub fn parse_version(text: &str) -> Result<Version> {
    Version::parse(text.trim())
        .with_context(|| format!("invalid semantic version '{}'", text))
}

/// A bare version in a blang range means exact, but `VersionReq` would treat
/// it as a caret requirement; pin it down with an explicit `=`.
fn normalize_comparator(token: &str) -> String {
    if token.starts_with(|c: char| c.is_ascii_digit()) {
        format!("={}", token)
    } else {
        token.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_space_separated_range() {
        let range = SkipRange::parse(">=1.0.0 <2.0.0").unwrap();
        assert!(range.matches(&version("1.0.0")));
        assert!(range.matches(&version("1.5.0")));
        assert!(!range.matches(&version("2.0.0")));
        assert!(!range.matches(&version("0.9.9")));
    }

    #[test]
    fn test_upper_bound_is_exclusive() {
        let range = SkipRange::parse("<1.0.0").unwrap();
        assert!(range.matches(&version("0.9.0")));
        assert!(!range.matches(&version("1.0.0")));
    }

    #[test]
    fn test_bare_version_is_exact() {
        let range = SkipRange::parse("1.2.3").unwrap();
        assert!(range.matches(&version("1.2.3")));
        // The semver crate alone would read "1.2.3" as ^1.2.3 and accept this
        assert!(!range.matches(&version("1.3.0")));
    }

    #[test]
    fn test_or_groups() {
        let range = SkipRange::parse(">=1.0.0 <2.0.0 || >=3.0.0").unwrap();
        assert!(range.matches(&version("1.5.0")));
        assert!(range.matches(&version("3.1.0")));
        assert!(!range.matches(&version("2.5.0")));
    }

    #[test]
    fn test_invalid_range() {
        assert!(SkipRange::parse("not-a-range").is_err());
        assert!(SkipRange::parse("").is_err());
        assert!(SkipRange::parse(">=1.0.0 ||").is_err());
    }

    #[test]
    fn test_raw_text_preserved() {
        let range = SkipRange::parse(" >=0.16.0 <0.19.4 ").unwrap();
        assert_eq!(range.as_str(), ">=0.16.0 <0.19.4");
        assert_eq!(range.to_string(), ">=0.16.0 <0.19.4");
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("1.2.3").unwrap(), version("1.2.3"));
        assert!(parse_version("one.two.three").is_err());
        assert!(parse_version("").is_err());
    }
}
