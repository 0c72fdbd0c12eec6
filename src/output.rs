//! Operator-facing rendering of audit and publish results
//!
//! This module provides:
//! - Human-readable dependency listings with colors
//! - The "maximum versions required" summary table
//! - A JSON view of the whole audit for machine consumption

use crate::audit::AuditFindings;
use crate::domain::{DependencyReport, PublishOutcome};
use colored::Colorize;
use std::io::Write;

/// Prints the NEEDED dependencies of one audited binary.
pub fn print_dependencies(out: &mut impl Write, name: &str, findings: &AuditFindings) -> std::io::Result<()> {
    writeln!(out, "List of {} dependencies:", name.bold())?;
    for library in findings.needed() {
        writeln!(out, "  {}", library)?;
    }
    Ok(())
}

/// Prints the per-library maximum versions required across all audited
/// binaries.
pub fn print_maxima(out: &mut impl Write, report: &DependencyReport) -> std::io::Result<()> {
    writeln!(out, "{}", "Maximum versions required:".bold())?;
    for (library, version) in report.maxima() {
        writeln!(out, "  {} {}", library, version.to_string().cyan())?;
    }
    Ok(())
}

/// Prints the terminal publish state.
pub fn print_outcome(out: &mut impl Write, outcome: &PublishOutcome) -> std::io::Result<()> {
    if outcome.created_release {
        writeln!(out, "Released {} on GitHub.", outcome.tag.green())?;
    } else {
        writeln!(out, "Version {} already released.", outcome.tag)?;
    }
    if outcome.replaced_asset {
        writeln!(out, "Replaced {} on GitHub.", outcome.asset_name)?;
    } else {
        writeln!(out, "Uploaded {} on GitHub.", outcome.asset_name)?;
    }
    Ok(())
}

/// Builds the JSON document for `--json` output.
pub fn audit_json(
    audited: &[(String, AuditFindings)],
    report: &DependencyReport,
) -> serde_json::Value {
    let binaries: Vec<serde_json::Value> = audited
        .iter()
        .map(|(name, findings)| {
            serde_json::json!({
                "name": name,
                "needed": findings.needed().collect::<Vec<_>>(),
                "requirements": findings
                    .requirements()
                    .map(|(library, version)| {
                        serde_json::json!({
                            "library": library,
                            "version": version.to_string(),
                        })
                    })
                    .collect::<Vec<_>>(),
            })
        })
        .collect();

    let maxima: serde_json::Map<String, serde_json::Value> = report
        .maxima()
        .into_iter()
        .map(|(library, version)| (library, serde_json::Value::String(version.to_string())))
        .collect();

    serde_json::json!({
        "binaries": binaries,
        "maximum_versions": maxima,
    })
}
