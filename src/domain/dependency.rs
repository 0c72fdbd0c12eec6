//! Shared-library dependency records discovered in a compiled binary

use crate::domain::SemanticVersion;
use std::fmt;

/// One dependency of one binary: a shared-library name and, when the binary
/// carries versioned symbol requirements against it, the highest symbol
/// version required.
///
/// Records from different binaries are never merged with each other; only the
/// [`crate::domain::DependencyReport`] aggregates across binaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Library name as reported by the dynamic section (e.g. `libc.so.6`
    /// for NEEDED entries, `GLIBC` for versioned symbol namespaces)
    pub library: String,
    /// Highest symbol version required from the library, if any
    pub version: Option<SemanticVersion>,
}

impl Dependency {
    /// Creates a name-only dependency (a NEEDED entry)
    pub fn needed(library: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            version: None,
        }
    }

    /// Creates a versioned symbol requirement
    pub fn versioned(library: impl Into<String>, version: SemanticVersion) -> Self {
        Self {
            library: library.into(),
            version: Some(version),
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            Some(version) => write!(f, "{} {}", self.library, version),
            None => write!(f, "{}", self.library),
        }
    }
}
