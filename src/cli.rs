//! CLI argument parsing module for llvmpack

use crate::error::ConfigError;
use crate::publish::Credentials;
use clap::Parser;
use std::path::PathBuf;

/// Environment fallbacks for the GitHub credential pair
const GITHUB_USERNAME_ENV: &str = "GITHUB_USERNAME";
const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Toolchain bundle builder and release publisher
#[derive(Parser, Debug, Clone)]
#[command(
    name = "llvmpack",
    version,
    about = "Build, audit, bundle, and publish an LLVM+Clang toolchain"
)]
pub struct CliArgs {
    /// LLVM version to build and publish (e.g. 18.1.8)
    #[arg(id = "llvm-version", value_name = "VERSION")]
    pub version: String,

    /// LLVM release candidate number; makes the release a prerelease
    #[arg(long)]
    pub release_candidate: Option<u32>,

    /// GitHub user name. Defaults to environment variable GITHUB_USERNAME
    #[arg(long)]
    pub gh_user: Option<String>,

    /// GitHub api token. Defaults to environment variable GITHUB_TOKEN
    #[arg(long)]
    pub gh_token: Option<String>,

    /// GitHub organization the archive will be uploaded to
    #[arg(long, default_value = "ycm-core")]
    pub gh_org: String,

    /// Directory holding the checkout, build tree, and produced archive
    #[arg(long, default_value = ".")]
    pub work_dir: PathBuf,

    /// Stop after printing the dependency report; no bundling or publishing
    #[arg(long)]
    pub audit_only: bool,

    /// Output the dependency report in JSON format
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable quiet mode - no progress display
    #[arg(short, long)]
    pub quiet: bool,
}

impl CliArgs {
    /// The version string used as release tag and in the bundle name
    pub fn bundle_version(&self) -> String {
        match self.release_candidate {
            Some(n) => format!("{}-rc{}", self.version, n),
            None => self.version.clone(),
        }
    }

    /// Resolves the credential pair, falling back to the environment.
    ///
    /// A missing credential is a configuration error, never retried.
    pub fn resolve_credentials(&self) -> Result<Credentials, ConfigError> {
        let user = match &self.gh_user {
            Some(user) => user.clone(),
            None => std::env::var(GITHUB_USERNAME_ENV).map_err(|_| {
                ConfigError::MissingCredential {
                    flag: "--gh-user",
                    env: GITHUB_USERNAME_ENV,
                }
            })?,
        };
        let token = match &self.gh_token {
            Some(token) => token.clone(),
            None => std::env::var(GITHUB_TOKEN_ENV).map_err(|_| {
                ConfigError::MissingCredential {
                    flag: "--gh-token",
                    env: GITHUB_TOKEN_ENV,
                }
            })?,
        };
        Ok(Credentials { user, token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_version_is_required() {
        assert!(CliArgs::try_parse_from(["llvmpack"]).is_err());
    }

    #[test]
    fn test_default_args() {
        let args = CliArgs::parse_from(["llvmpack", "18.1.8"]);
        assert_eq!(args.version, "18.1.8");
        assert!(args.release_candidate.is_none());
        assert!(args.gh_user.is_none());
        assert!(args.gh_token.is_none());
        assert_eq!(args.gh_org, "ycm-core");
        assert_eq!(args.work_dir, PathBuf::from("."));
        assert!(!args.audit_only);
        assert!(!args.json);
        assert!(!args.verbose);
        assert!(!args.quiet);
    }

    #[test]
    fn test_release_candidate_flag() {
        let args = CliArgs::parse_from(["llvmpack", "18.1.0", "--release-candidate", "3"]);
        assert_eq!(args.release_candidate, Some(3));
    }

    #[test]
    fn test_release_candidate_rejects_non_numeric() {
        assert!(
            CliArgs::try_parse_from(["llvmpack", "18.1.0", "--release-candidate", "rc1"]).is_err()
        );
    }

    #[test]
    fn test_bundle_version_plain() {
        let args = CliArgs::parse_from(["llvmpack", "18.1.0"]);
        assert_eq!(args.bundle_version(), "18.1.0");
    }

    #[test]
    fn test_bundle_version_with_candidate() {
        let args = CliArgs::parse_from(["llvmpack", "18.1.0", "--release-candidate", "1"]);
        assert_eq!(args.bundle_version(), "18.1.0-rc1");
    }

    #[test]
    fn test_credential_flags() {
        let args = CliArgs::parse_from([
            "llvmpack",
            "18.1.0",
            "--gh-user",
            "octocat",
            "--gh-token",
            "secret",
        ]);
        let creds = args.resolve_credentials().unwrap();
        assert_eq!(creds.user, "octocat");
        assert_eq!(creds.token, "secret");
    }

    #[test]
    fn test_org_and_work_dir_flags() {
        let args = CliArgs::parse_from([
            "llvmpack",
            "18.1.0",
            "--gh-org",
            "my-org",
            "--work-dir",
            "/tmp/llvm",
        ]);
        assert_eq!(args.gh_org, "my-org");
        assert_eq!(args.work_dir, PathBuf::from("/tmp/llvm"));
    }

    #[test]
    fn test_audit_only_and_output_flags() {
        let args = CliArgs::parse_from(["llvmpack", "18.1.0", "--audit-only", "--json", "-q"]);
        assert!(args.audit_only);
        assert!(args.json);
        assert!(args.quiet);
    }
}
