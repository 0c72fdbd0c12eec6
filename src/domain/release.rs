//! Release and asset value objects mirroring the remote release API

use serde::{Deserialize, Serialize};

/// A release as returned by the list-releases endpoint.
///
/// Only the fields the publisher acts on are modeled; the tag identifies the
/// release and the upload URL is where asset bytes go.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    /// Version tag, e.g. "18.1.0" or "18.1.0-rc1"
    pub tag_name: String,
    /// Asset upload endpoint, usually carrying a `{?name,label}` template
    pub upload_url: String,
    /// Assets already attached to this release
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// An asset attached to a release
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    /// Asset id used for deletion
    pub id: u64,
    /// Asset filename, unique per release once the publisher has run
    pub name: String,
}

/// Request body for creating a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseDraft {
    /// Version tag the release will carry
    pub tag_name: String,
    /// Human-readable release name
    pub name: String,
    /// Release description
    pub body: String,
    /// True for release candidates
    pub prerelease: bool,
}

/// Terminal state of a successful publish attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    /// Tag of the release the asset now lives under
    pub tag: String,
    /// Name of the uploaded asset
    pub asset_name: String,
    /// True when a new release was created, false when one already existed
    pub created_release: bool,
    /// True when a stale asset of the same name was deleted first
    pub replaced_asset: bool,
}
