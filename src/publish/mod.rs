//! Release publishing
//!
//! This module provides:
//! - The `ReleaseHost` trait over the remote release store
//! - A GitHub REST implementation of that trait
//! - The idempotent find-or-create, delete-then-upload publisher

mod client;
mod publisher;

pub use client::{Credentials, GitHubClient};
pub use publisher::ReleasePublisher;

use crate::domain::{Release, ReleaseDraft};
use crate::error::ReleaseError;
use async_trait::async_trait;
use std::path::Path;

/// The remote release store, as much of it as publishing needs.
///
/// The store does not enforce asset-name uniqueness itself; the publisher
/// does, through this interface.
#[async_trait]
pub trait ReleaseHost: Send + Sync {
    /// Lists all releases of the target project
    async fn list_releases(&self) -> Result<Vec<Release>, ReleaseError>;

    /// Creates a release, returning it with its upload endpoint
    async fn create_release(&self, draft: &ReleaseDraft) -> Result<Release, ReleaseError>;

    /// Deletes an asset by id
    async fn delete_asset(&self, asset_id: u64) -> Result<(), ReleaseError>;

    /// Uploads a local artifact to a release's upload endpoint.
    ///
    /// The artifact is read from disk by the implementation at upload time,
    /// so a retried attempt re-reads it; a toolchain bundle runs to hundreds
    /// of megabytes and must never be held in memory whole.
    async fn upload_asset(
        &self,
        upload_url: &str,
        name: &str,
        artifact: &Path,
    ) -> Result<(), ReleaseError>;
}
