//! Aggregated dependency report for one audit run
//!
//! Collects every versioned symbol requirement observed across the audited
//! binaries and exposes the per-library maximum, which is the "minimum
//! compatible system" summary shown to the operator.

use crate::domain::{Dependency, SemanticVersion};
use std::collections::BTreeMap;

/// Per-library version observations across all audited binaries.
///
/// Created empty per audit run, populated by repeated [`record`] or
/// [`absorb`] calls, and read through [`maxima`] once the run completes.
/// Name-only NEEDED dependencies never enter the report; they are displayed
/// per binary at audit time.
///
/// [`record`]: DependencyReport::record
/// [`absorb`]: DependencyReport::absorb
/// [`maxima`]: DependencyReport::maxima
#[derive(Debug, Default, Clone)]
pub struct DependencyReport {
    versions: BTreeMap<String, Vec<SemanticVersion>>,
}

impl DependencyReport {
    /// Creates an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one versioned requirement for a library
    pub fn record(&mut self, library: impl Into<String>, version: SemanticVersion) {
        self.versions.entry(library.into()).or_default().push(version);
    }

    /// Records every versioned requirement found in one audited binary.
    /// Name-only records pass through untouched.
    pub fn absorb(&mut self, records: &[Dependency]) {
        for record in records {
            if let Some(version) = record.version {
                self.record(record.library.clone(), version);
            }
        }
    }

    /// Returns the largest version recorded per library
    pub fn maxima(&self) -> BTreeMap<String, SemanticVersion> {
        self.versions
            .iter()
            .filter_map(|(library, versions)| {
                versions
                    .iter()
                    .max()
                    .map(|max| (library.clone(), *max))
            })
            .collect()
    }

    /// True if no versioned requirement has been recorded
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}
