//! GitHub release API client
//!
//! Implements [`ReleaseHost`] over the GitHub REST API:
//! - List releases: GET /repos/{owner}/{repo}/releases (200)
//! - Create release: POST /repos/{owner}/{repo}/releases (201)
//! - Delete asset: DELETE /repos/{owner}/{repo}/releases/assets/{id} (204)
//! - Upload asset: POST to the release's upload_url (201)
//!
//! Non-success responses carry a JSON body with a `message` field; that
//! message is surfaced to the operator. This client does no retrying of its
//! own; the whole publish sequence is retried at the pipeline level.

use crate::domain::{Release, ReleaseDraft};
use crate::error::ReleaseError;
use crate::publish::ReleaseHost;
use async_trait::async_trait;
use reqwest::{Body, Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// GitHub REST API base URL
const GITHUB_API_URL: &str = "https://api.github.com";

/// Content type of the tar.xz bundle
const ARCHIVE_CONTENT_TYPE: &str = "application/x-xz";

/// Timeout for API requests; uploads get a longer budget
const API_TIMEOUT: Duration = Duration::from_secs(30);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// User-Agent header (GitHub rejects anonymous clients)
const USER_AGENT: &str = concat!("llvmpack/", env!("CARGO_PKG_VERSION"));

/// Error body shape for non-success GitHub responses
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Basic-auth credential pair
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Account name
    pub user: String,
    /// API token
    pub token: String,
}

/// GitHub client bound to one owner/repo pair
pub struct GitHubClient {
    client: Client,
    owner: String,
    repo: String,
    credentials: Credentials,
}

impl GitHubClient {
    /// Creates a client for the given organization and repository
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        credentials: Credentials,
    ) -> Result<Self, ReleaseError> {
        let client = Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                ReleaseError::network("creating HTTP client", e.to_string())
            })?;

        Ok(Self {
            client,
            owner: owner.into(),
            repo: repo.into(),
            credentials,
        })
    }

    fn releases_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/releases",
            GITHUB_API_URL, self.owner, self.repo
        )
    }

    fn asset_url(&self, asset_id: u64) -> String {
        format!(
            "{}/repos/{}/{}/releases/assets/{}",
            GITHUB_API_URL, self.owner, self.repo, asset_id
        )
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.basic_auth(&self.credentials.user, Some(&self.credentials.token))
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        context: &str,
    ) -> Result<Response, ReleaseError> {
        self.authed(builder)
            .send()
            .await
            .map_err(|e| ReleaseError::network(context, e.to_string()))
    }

    /// Turns a non-success response into an Api error carrying the remote
    /// message when one is present.
    async fn api_error(response: Response, context: &str) -> ReleaseError {
        let status = response.status();
        let message = match response.json::<ApiErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
        };
        ReleaseError::api(context, status.as_u16(), message)
    }
}

/// Strips the `{?name,label}` URI-template suffix GitHub appends to
/// upload URLs.
pub(crate) fn plain_upload_url(upload_url: &str) -> &str {
    upload_url
        .split_once('{')
        .map(|(base, _)| base)
        .unwrap_or(upload_url)
}

#[async_trait]
impl ReleaseHost for GitHubClient {
    async fn list_releases(&self) -> Result<Vec<Release>, ReleaseError> {
        let context = "listing releases";
        let builder = self.client.get(self.releases_url()).timeout(API_TIMEOUT);
        let response = self.send(builder, context).await?;

        if response.status() != StatusCode::OK {
            return Err(Self::api_error(response, context).await);
        }

        response
            .json()
            .await
            .map_err(|e| ReleaseError::network(context, format!("failed to parse JSON: {}", e)))
    }

    async fn create_release(&self, draft: &ReleaseDraft) -> Result<Release, ReleaseError> {
        let context = "creating release";
        let builder = self
            .client
            .post(self.releases_url())
            .timeout(API_TIMEOUT)
            .json(draft);
        let response = self.send(builder, context).await?;

        if response.status() != StatusCode::CREATED {
            return Err(Self::api_error(response, context).await);
        }

        response
            .json()
            .await
            .map_err(|e| ReleaseError::network(context, format!("failed to parse JSON: {}", e)))
    }

    async fn delete_asset(&self, asset_id: u64) -> Result<(), ReleaseError> {
        let context = "deleting asset";
        let builder = self
            .client
            .delete(self.asset_url(asset_id))
            .timeout(API_TIMEOUT);
        let response = self.send(builder, context).await?;

        if response.status() != StatusCode::NO_CONTENT {
            return Err(Self::api_error(response, context).await);
        }
        Ok(())
    }

    async fn upload_asset(
        &self,
        upload_url: &str,
        name: &str,
        artifact: &Path,
    ) -> Result<(), ReleaseError> {
        let context = "uploading asset";
        // Stream the archive from disk; it is far too large to buffer.
        let file = tokio::fs::File::open(artifact)
            .await
            .map_err(|source| ReleaseError::Artifact {
                path: artifact.to_path_buf(),
                source,
            })?;
        let length = file
            .metadata()
            .await
            .map_err(|source| ReleaseError::Artifact {
                path: artifact.to_path_buf(),
                source,
            })?
            .len();
        let builder = self
            .client
            .post(plain_upload_url(upload_url))
            .query(&[("name", name)])
            .header(reqwest::header::CONTENT_TYPE, ARCHIVE_CONTENT_TYPE)
            .header(reqwest::header::CONTENT_LENGTH, length)
            .body(Body::from(file));
        let response = self.send(builder, context).await?;

        if response.status() != StatusCode::CREATED {
            return Err(Self::api_error(response, context).await);
        }
        Ok(())
    }
}
