//! Three-part semantic version for runtime dependency requirements
//!
//! Handles dotted version strings as they appear in versioned symbol names:
//! `2`, `2.34`, `2.34.1`. Missing minor and patch components default to zero,
//! and the canonical rendering always carries all three components.

use crate::error::VersionParseError;
use std::fmt;
use std::str::FromStr;

/// A comparable major.minor.patch version.
///
/// Ordering is lexicographic on (major, minor, patch), which the derived
/// implementations provide given the field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SemanticVersion {
    /// Major component, always present in the source string
    pub major: u64,
    /// Minor component, 0 when absent
    pub minor: u64,
    /// Patch component, 0 when absent
    pub patch: u64,
}

impl SemanticVersion {
    /// Creates a version from explicit components
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

fn parse_component(input: &str, token: &str, name: &str) -> Result<u64, VersionParseError> {
    token
        .parse()
        .map_err(|_| VersionParseError::new(input, format!("{} component is not a number", name)))
}

impl FromStr for SemanticVersion {
    type Err = VersionParseError;

    /// Splits on '.'; the major component is required, minor and patch
    /// default to 0. Components past the third are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        let major = match parts.next() {
            Some(token) if !token.is_empty() => parse_component(s, token, "major")?,
            _ => return Err(VersionParseError::new(s, "missing major component")),
        };
        let minor = match parts.next() {
            Some(token) => parse_component(s, token, "minor")?,
            None => 0,
        };
        let patch = match parts.next() {
            Some(token) => parse_component(s, token, "patch")?,
            None => 0,
        };

        Ok(Self {
            major,
            minor,
            patch,
        })
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
