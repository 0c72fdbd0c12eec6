//! Core domain models for llvmpack
//!
//! This module contains the fundamental types used throughout the application:
//! - Semantic versions for symbol requirement comparison
//! - Dependency records discovered in compiled binaries
//! - The per-run dependency report with its maxima view
//! - Release and asset value objects mirroring the remote API

mod dependency;
mod release;
mod report;
mod version;

pub use dependency::Dependency;
pub use release::{PublishOutcome, Release, ReleaseAsset, ReleaseDraft};
pub use report::DependencyReport;
pub use version::SemanticVersion;
