//! Application error types using thiserror
//!
//! Error hierarchy:
//! - AuditError: binary dependency audit failures
//! - ToolError: external program invocation failures
//! - ReleaseError: GitHub release API failures
//! - ConfigError: missing or invalid configuration

use crate::retry::RetryFailure;
use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Binary audit related errors
    #[error(transparent)]
    Audit(#[from] AuditError),

    /// External tool related errors
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// Release API related errors
    #[error(transparent)]
    Release(#[from] ReleaseError),

    /// Publishing gave up, fatally or after the retry budget ran out.
    /// Keeps the attempt count in the message instead of reporting only
    /// the last error.
    #[error(transparent)]
    Publish(#[from] RetryFailure<ReleaseError>),

    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Malformed version string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid version string '{input}': {reason}")]
pub struct VersionParseError {
    /// The string that failed to parse
    pub input: String,
    /// Why it failed
    pub reason: String,
}

impl VersionParseError {
    /// Creates a new VersionParseError
    pub fn new(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while auditing a compiled binary
#[derive(Error, Debug)]
pub enum AuditError {
    /// A versioned symbol requirement carried an unparseable version
    #[error("unexpected objdump output for {path}: {source}")]
    UnexpectedOutput {
        path: PathBuf,
        #[source]
        source: VersionParseError,
    },

    /// The introspection tool could not be run on the binary
    #[error(transparent)]
    Tool(#[from] ToolError),
}

/// Errors raised when invoking external programs
#[derive(Error, Debug)]
pub enum ToolError {
    /// The program could not be launched at all
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program exited with a nonzero status
    #[error("{program} failed ({status}): {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    /// Expected output was missing
    #[error("{program} produced no usable output: {message}")]
    NoOutput { program: String, message: String },

    /// Filesystem operation around a tool invocation failed
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ToolError {
    /// Creates a new Launch error
    pub fn launch(program: impl Into<String>, source: std::io::Error) -> Self {
        ToolError::Launch {
            program: program.into(),
            source,
        }
    }

    /// Creates a new Failed error from a captured process output
    pub fn failed(program: impl Into<String>, output: &std::process::Output) -> Self {
        ToolError::Failed {
            program: program.into(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }

    /// Creates a new NoOutput error
    pub fn no_output(program: impl Into<String>, message: impl Into<String>) -> Self {
        ToolError::NoOutput {
            program: program.into(),
            message: message.into(),
        }
    }

    /// Creates a new Io error
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ToolError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised while talking to the release API
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// The API answered with a non-success status
    #[error("{context} failed with message: {message}")]
    Api {
        context: String,
        status: u16,
        message: String,
    },

    /// The request never produced a response
    #[error("{context} failed: {message}")]
    Network { context: String, message: String },

    /// The local artifact could not be read
    #[error("failed to read artifact {path}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReleaseError {
    /// Creates a new Api error
    pub fn api(context: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        ReleaseError::Api {
            context: context.into(),
            status,
            message: message.into(),
        }
    }

    /// Creates a new Network error
    pub fn network(context: impl Into<String>, message: impl Into<String>) -> Self {
        ReleaseError::Network {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Whether retrying the publish sequence can plausibly succeed.
    ///
    /// Network failures and server-side statuses are transient; client-side
    /// statuses (bad credentials, malformed request) and local IO are not.
    pub fn is_transient(&self) -> bool {
        match self {
            ReleaseError::Network { .. } => true,
            ReleaseError::Api { status, .. } => *status >= 500 || *status == 429,
            ReleaseError::Artifact { .. } => false,
        }
    }
}

impl crate::retry::Transient for ReleaseError {
    fn is_transient(&self) -> bool {
        ReleaseError::is_transient(self)
    }
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required credential was supplied neither on the command line nor
    /// through the environment
    #[error("must specify either {flag} or {env} in environment")]
    MissingCredential {
        flag: &'static str,
        env: &'static str,
    },

    /// The working directory does not exist
    #[error("working directory not found: {path}")]
    WorkDirNotFound { path: PathBuf },
}
