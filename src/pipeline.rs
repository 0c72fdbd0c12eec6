//! Release pipeline orchestration
//!
//! Runs the whole sequence in order, fully sequentially:
//! checkout → build → audit → target discovery → bundle → publish.
//!
//! Every step blocks until its external program returns, and the first
//! failure aborts the run; a partial audit is never reported as complete.
//! Only the publish step is retried, as a whole, relying on the publisher's
//! idempotence rather than per-step rollback.

use crate::audit::{audit_binary, AuditFindings};
use crate::cli::CliArgs;
use crate::domain::DependencyReport;
use crate::error::{AppError, ToolError};
use crate::output;
use crate::progress::Progress;
use crate::publish::{GitHubClient, ReleasePublisher};
use crate::retry::Retrier;
use crate::toolchain;

/// Repository the bundle is published to, under the configured organization
const RELEASE_REPO: &str = "llvm";

/// Pipeline bound to one invocation's arguments
pub struct Pipeline {
    args: CliArgs,
    progress: Progress,
}

impl Pipeline {
    /// Creates the pipeline; progress display follows quiet mode
    pub fn new(args: CliArgs) -> Self {
        let progress = Progress::new(!args.quiet);
        Self { args, progress }
    }

    /// Runs the pipeline to completion
    pub async fn run(&mut self) -> Result<(), AppError> {
        let work_dir = &self.args.work_dir;

        // Resolve credentials before doing hours of work that would only
        // fail at publish time. Audit-only runs never talk to the API.
        let credentials = if self.args.audit_only {
            None
        } else {
            Some(self.args.resolve_credentials()?)
        };

        let source_dir = work_dir.join(toolchain::SOURCE_DIR);
        if !source_dir.is_dir() {
            self.progress.step("Cloning llvm-project...");
            toolchain::checkout_source(work_dir, &self.args.version)?;
        } else if self.args.verbose {
            eprintln!("Using existing checkout at {}", source_dir.display());
        }

        let build_dir = work_dir.join("build");
        let install_dir = work_dir.join("install");
        std::fs::create_dir_all(&build_dir)
            .map_err(|e| ToolError::io(&build_dir, e))?;
        std::fs::create_dir_all(&install_dir)
            .map_err(|e| ToolError::io(&install_dir, e))?;

        self.progress.step("Building LLVM and Clang...");
        toolchain::configure_and_build(work_dir, &build_dir, &install_dir)?;
        self.progress.finish_and_clear();

        // Audit the runtime footprint of the shipped binaries.
        let mut report = DependencyReport::new();
        let mut audited: Vec<(String, AuditFindings)> = Vec::new();
        for (name, path) in toolchain::audited_binaries(&install_dir) {
            let findings = audit_binary(&path)?;
            report.absorb(&findings.records);
            audited.push((name, findings));
        }

        let mut stdout = std::io::stdout().lock();
        if self.args.json {
            let doc = output::audit_json(&audited, &report);
            serde_json::to_writer_pretty(&mut stdout, &doc)
                .map_err(|e| ToolError::io("stdout", e.into()))?;
        } else {
            for (name, findings) in &audited {
                output::print_dependencies(&mut stdout, name, findings)
                    .map_err(|e| ToolError::io("stdout", e))?;
            }
            output::print_maxima(&mut stdout, &report)
                .map_err(|e| ToolError::io("stdout", e))?;
        }
        drop(stdout);

        if self.args.audit_only {
            return Ok(());
        }

        self.progress.step("Discovering target triple...");
        let target = toolchain::discover_target(&install_dir)?;
        self.progress.finish_and_clear();
        if self.args.verbose {
            eprintln!("Target: {}", target);
        }

        let bundle_version = self.args.bundle_version();
        let bundle_name = toolchain::bundle_name(&bundle_version, &target);
        let archive_path = work_dir.join(toolchain::archive_name(&bundle_version, &target));

        if archive_path.exists() {
            // A crashed earlier run may have left a finished archive behind;
            // publishing it again is safe.
            if self.args.verbose {
                eprintln!("Reusing existing archive {}", archive_path.display());
            }
        } else {
            self.progress
                .step(&format!("Bundling to {}...", archive_path.display()));
            toolchain::bundle(&install_dir, &bundle_name, &archive_path)?;
            self.progress.finish_and_clear();
        }

        let credentials = match credentials {
            Some(credentials) => credentials,
            // Only audit-only runs skip resolution, and those returned above.
            None => return Ok(()),
        };
        let client = GitHubClient::new(self.args.gh_org.clone(), RELEASE_REPO, credentials)?;
        let publisher =
            ReleasePublisher::new(&client, &self.args.version, self.args.release_candidate);

        self.progress
            .step(&format!("Publishing {}...", bundle_version));
        let outcome = Retrier::new()
            .run("publishing release", || publisher.publish(&archive_path))
            .await?;
        self.progress.finish_and_clear();

        let mut stdout = std::io::stdout().lock();
        output::print_outcome(&mut stdout, &outcome)
            .map_err(|e| ToolError::io("stdout", e))?;

        Ok(())
    }
}

// Fail-before-any-work behavior for missing credentials is covered in
// tests/integration_tests.rs, where the child process gets its own
// environment; mutating this process's environment would race with
// parallel tests.
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_repo_constant() {
        assert_eq!(RELEASE_REPO, "llvm");
    }
}
