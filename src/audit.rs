//! Binary dependency auditor
//!
//! Inspects a compiled binary with `objdump -p` and extracts:
//! - NEEDED entries: shared libraries the binary is dynamically linked against
//! - Versioned symbol requirements: `<LIBRARY>_<version>` tokens naming the
//!   minimum version of a symbol namespace (e.g. GLIBC) required at runtime

use crate::domain::{Dependency, SemanticVersion};
use crate::error::{AuditError, ToolError, VersionParseError};
use regex::Regex;
use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;

// Line shapes in objdump -p output
static NEEDED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^  NEEDED\s+(?P<dependency>\S.*)$").unwrap());
static SYMBOL_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^    0x[0-9a-f]+ 0x00 \d+ (?P<library>.*)_(?P<version>.*)$").unwrap()
});

/// Everything one audited binary requires at runtime, in discovery order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AuditFindings {
    /// Dependency records as they appeared in the dump
    pub records: Vec<Dependency>,
}

impl AuditFindings {
    /// NEEDED library names in discovery order, for display
    pub fn needed(&self) -> impl Iterator<Item = &str> {
        self.records
            .iter()
            .filter(|r| r.version.is_none())
            .map(|r| r.library.as_str())
    }

    /// (symbol namespace, version) requirements, for the report
    pub fn requirements(&self) -> impl Iterator<Item = (&str, SemanticVersion)> {
        self.records
            .iter()
            .filter_map(|r| r.version.map(|v| (r.library.as_str(), v)))
    }
}

/// Scans objdump output for dependency information.
///
/// Every line is tested against both patterns; in practice the two shapes are
/// mutually exclusive by format. An unparseable version in a symbol
/// requirement is a hard error, never a silently shortened report.
pub fn scan(output: &str) -> Result<AuditFindings, VersionParseError> {
    let mut findings = AuditFindings::default();

    for line in output.lines() {
        if let Some(caps) = NEEDED_RE.captures(line) {
            findings.records.push(Dependency::needed(&caps["dependency"]));
        }

        if let Some(caps) = SYMBOL_VERSION_RE.captures(line) {
            let version: SemanticVersion = caps["version"].parse()?;
            findings
                .records
                .push(Dependency::versioned(&caps["library"], version));
        }
    }

    Ok(findings)
}

/// Runs `objdump -p` on a binary and scans its output.
pub fn audit_binary(path: &Path) -> Result<AuditFindings, AuditError> {
    let output = Command::new("objdump")
        .arg("-p")
        .arg(path)
        .output()
        .map_err(|e| ToolError::launch("objdump", e))?;

    if !output.status.success() {
        return Err(ToolError::failed("objdump", &output).into());
    }

    let text = String::from_utf8_lossy(&output.stdout);
    scan(&text).map_err(|source| AuditError::UnexpectedOutput {
        path: path.to_path_buf(),
        source,
    })
}
