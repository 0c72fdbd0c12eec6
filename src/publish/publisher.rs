//! Idempotent release publisher
//!
//! One publish attempt walks a fixed sequence of states:
//!
//! 1. Locate: find a release whose tag equals the bundle version.
//! 2. Create: if none exists, create it (prerelease for release candidates).
//! 3. Reconcile: if one exists, delete any asset with the target name so at
//!    most one asset of that name survives the upload.
//! 4. Upload: stream the artifact bytes to the release's upload endpoint.
//!
//! There is no rollback: a release created in step 2 stays even if the
//! upload later fails. Retrying the whole sequence is safe because step 1
//! finds whatever a previous attempt left behind and the sequence converges
//! to exactly one asset of the target name under the target tag.

use crate::domain::{PublishOutcome, Release, ReleaseDraft};
use crate::error::ReleaseError;
use crate::publish::ReleaseHost;
use std::path::Path;

/// What the created release's body says
const RELEASE_BODY_SUFFIX: &str = " without realtime, terminfo, and zlib dependencies.";

/// Publisher bound to one target version
pub struct ReleasePublisher<'a> {
    host: &'a dyn ReleaseHost,
    /// Base toolchain version, e.g. "18.1.0"
    version: String,
    /// Release candidate number, when publishing a prerelease
    release_candidate: Option<u32>,
}

impl<'a> ReleasePublisher<'a> {
    /// Creates a publisher for a base version and optional rc number
    pub fn new(host: &'a dyn ReleaseHost, version: impl Into<String>, release_candidate: Option<u32>) -> Self {
        Self {
            host,
            version: version.into(),
            release_candidate,
        }
    }

    /// The release tag: the version, suffixed with `-rcN` for candidates
    pub fn bundle_version(&self) -> String {
        match self.release_candidate {
            Some(n) => format!("{}-rc{}", self.version, n),
            None => self.version.clone(),
        }
    }

    /// Human-readable release name shown on the releases page
    pub fn release_name(&self) -> String {
        let mut name = format!("LLVM and Clang {}", self.version);
        if let Some(n) = self.release_candidate {
            name.push_str(&format!(" RC{}", n));
        }
        name
    }

    fn draft(&self) -> ReleaseDraft {
        let name = self.release_name();
        ReleaseDraft {
            tag_name: self.bundle_version(),
            body: format!("{}{}", name, RELEASE_BODY_SUFFIX),
            name,
            prerelease: self.release_candidate.is_some(),
        }
    }

    /// Publishes the artifact, reconciling against whatever already exists.
    pub async fn publish(&self, artifact: &Path) -> Result<PublishOutcome, ReleaseError> {
        let asset_name = artifact
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        // An unreadable artifact fails before any remote call; the bytes
        // themselves are streamed from disk by the host at upload time.
        std::fs::metadata(artifact).map_err(|source| ReleaseError::Artifact {
            path: artifact.to_path_buf(),
            source,
        })?;

        let tag = self.bundle_version();
        let existing = self.locate(&tag).await?;

        let (upload_url, created_release, replaced_asset) = match existing {
            Some(release) => {
                let replaced = self.reconcile(&release, &asset_name).await?;
                (release.upload_url, false, replaced)
            }
            None => {
                let release = self.host.create_release(&self.draft()).await?;
                (release.upload_url, true, false)
            }
        };

        self.host
            .upload_asset(&upload_url, &asset_name, artifact)
            .await?;

        Ok(PublishOutcome {
            tag,
            asset_name,
            created_release,
            replaced_asset,
        })
    }

    /// Finds the release whose tag equals the bundle version, if any.
    async fn locate(&self, tag: &str) -> Result<Option<Release>, ReleaseError> {
        let releases = self.host.list_releases().await?;
        Ok(releases.into_iter().find(|r| r.tag_name == tag))
    }

    /// Deletes any same-named asset from an existing release so the upload
    /// leaves exactly one asset of that name. Returns whether one was
    /// deleted.
    async fn reconcile(&self, release: &Release, asset_name: &str) -> Result<bool, ReleaseError> {
        for asset in &release.assets {
            if asset.name == asset_name {
                self.host.delete_asset(asset.id).await?;
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReleaseAsset;
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::Mutex;

    /// What the mock host saw, in call order
    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        List,
        Create(String),
        Delete(u64),
        Upload(String),
    }

    /// In-memory release store behaving like the real one: no asset-name
    /// uniqueness of its own.
    #[derive(Default)]
    struct MockHost {
        state: Mutex<MockState>,
    }

    #[derive(Default)]
    struct MockState {
        releases: Vec<Release>,
        next_asset_id: u64,
        calls: Vec<Call>,
        fail_upload_once: bool,
        uploaded: Vec<Vec<u8>>,
    }

    impl MockHost {
        fn new() -> Self {
            Self::default()
        }

        fn with_release(self, tag: &str, assets: Vec<ReleaseAsset>) -> Self {
            self.state.lock().unwrap().releases.push(Release {
                tag_name: tag.to_string(),
                upload_url: format!("https://uploads.example/{}{{?name,label}}", tag),
                assets,
            });
            self
        }

        fn calls(&self) -> Vec<Call> {
            self.state.lock().unwrap().calls.clone()
        }

        fn assets_of(&self, tag: &str) -> Vec<String> {
            self.state
                .lock()
                .unwrap()
                .releases
                .iter()
                .find(|r| r.tag_name == tag)
                .map(|r| r.assets.iter().map(|a| a.name.clone()).collect())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl ReleaseHost for MockHost {
        async fn list_releases(&self) -> Result<Vec<Release>, ReleaseError> {
            let mut state = self.state.lock().unwrap();
            state.calls.push(Call::List);
            Ok(state.releases.clone())
        }

        async fn create_release(&self, draft: &ReleaseDraft) -> Result<Release, ReleaseError> {
            let mut state = self.state.lock().unwrap();
            state.calls.push(Call::Create(draft.tag_name.clone()));
            let release = Release {
                tag_name: draft.tag_name.clone(),
                upload_url: format!(
                    "https://uploads.example/{}{{?name,label}}",
                    draft.tag_name
                ),
                assets: Vec::new(),
            };
            state.releases.push(release.clone());
            Ok(release)
        }

        async fn delete_asset(&self, asset_id: u64) -> Result<(), ReleaseError> {
            let mut state = self.state.lock().unwrap();
            state.calls.push(Call::Delete(asset_id));
            for release in &mut state.releases {
                release.assets.retain(|a| a.id != asset_id);
            }
            Ok(())
        }

        async fn upload_asset(
            &self,
            upload_url: &str,
            name: &str,
            artifact: &Path,
        ) -> Result<(), ReleaseError> {
            // The real host streams; reading eagerly is fine at test sizes.
            let bytes = std::fs::read(artifact).map_err(|source| ReleaseError::Artifact {
                path: artifact.to_path_buf(),
                source,
            })?;
            let mut state = self.state.lock().unwrap();
            state.calls.push(Call::Upload(name.to_string()));
            if state.fail_upload_once {
                state.fail_upload_once = false;
                return Err(ReleaseError::api("uploading asset", 502, "Bad Gateway"));
            }
            state.uploaded.push(bytes);
            let id = state.next_asset_id;
            state.next_asset_id += 1;
            let tag = upload_url
                .trim_start_matches("https://uploads.example/")
                .split('{')
                .next()
                .unwrap()
                .to_string();
            let release = state
                .releases
                .iter_mut()
                .find(|r| r.tag_name == tag)
                .expect("upload to unknown release");
            release.assets.push(ReleaseAsset {
                id,
                name: name.to_string(),
            });
            Ok(())
        }
    }

    fn artifact_file(name: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"archive bytes").unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn test_publish_creates_release_when_absent() {
        let host = MockHost::new();
        let publisher = ReleasePublisher::new(&host, "18.1.0", None);
        let (_dir, artifact) = artifact_file("clang+llvm-18.1.0-x86_64.tar.xz");

        let outcome = publisher.publish(&artifact).await.unwrap();

        assert!(outcome.created_release);
        assert!(!outcome.replaced_asset);
        assert_eq!(outcome.tag, "18.1.0");
        assert_eq!(
            host.calls(),
            vec![
                Call::List,
                Call::Create("18.1.0".to_string()),
                Call::Upload("clang+llvm-18.1.0-x86_64.tar.xz".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_publish_reuses_existing_release() {
        let host = MockHost::new().with_release("18.1.0", Vec::new());
        let publisher = ReleasePublisher::new(&host, "18.1.0", None);
        let (_dir, artifact) = artifact_file("clang+llvm-18.1.0-x86_64.tar.xz");

        let outcome = publisher.publish(&artifact).await.unwrap();

        assert!(!outcome.created_release);
        assert!(!outcome.replaced_asset);
        // No create, no delete: straight to upload.
        assert_eq!(
            host.calls(),
            vec![
                Call::List,
                Call::Upload("clang+llvm-18.1.0-x86_64.tar.xz".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_publish_twice_converges_to_one_asset() {
        let host = MockHost::new();
        let publisher = ReleasePublisher::new(&host, "18.1.0", None);
        let (_dir, artifact) = artifact_file("clang+llvm-18.1.0-x86_64.tar.xz");

        publisher.publish(&artifact).await.unwrap();
        let second = publisher.publish(&artifact).await.unwrap();

        assert!(!second.created_release);
        assert!(second.replaced_asset);
        assert_eq!(
            host.assets_of("18.1.0"),
            vec!["clang+llvm-18.1.0-x86_64.tar.xz"]
        );
        // The second run performed exactly one delete followed by one upload.
        let calls = host.calls();
        let second_run = &calls[3..];
        assert_eq!(
            second_run,
            &[
                Call::List,
                Call::Delete(0),
                Call::Upload("clang+llvm-18.1.0-x86_64.tar.xz".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_publish_leaves_other_assets_alone() {
        let host = MockHost::new().with_release(
            "18.1.0",
            vec![
                ReleaseAsset {
                    id: 100,
                    name: "clang+llvm-18.1.0-aarch64.tar.xz".to_string(),
                },
                ReleaseAsset {
                    id: 101,
                    name: "clang+llvm-18.1.0-x86_64.tar.xz".to_string(),
                },
            ],
        );
        {
            host.state.lock().unwrap().next_asset_id = 102;
        }
        let publisher = ReleasePublisher::new(&host, "18.1.0", None);
        let (_dir, artifact) = artifact_file("clang+llvm-18.1.0-x86_64.tar.xz");

        let outcome = publisher.publish(&artifact).await.unwrap();

        assert!(outcome.replaced_asset);
        let mut assets = host.assets_of("18.1.0");
        assets.sort();
        assert_eq!(
            assets,
            vec![
                "clang+llvm-18.1.0-aarch64.tar.xz",
                "clang+llvm-18.1.0-x86_64.tar.xz",
            ]
        );
        assert!(host.calls().contains(&Call::Delete(101)));
        assert!(!host.calls().contains(&Call::Delete(100)));
    }

    #[tokio::test]
    async fn test_retry_after_failed_upload_finds_created_release() {
        // A crash between Create and Upload must not duplicate the release
        // on the next attempt.
        let host = MockHost::new();
        host.state.lock().unwrap().fail_upload_once = true;
        let publisher = ReleasePublisher::new(&host, "18.1.0", None);
        let (_dir, artifact) = artifact_file("clang+llvm-18.1.0-x86_64.tar.xz");

        let first = publisher.publish(&artifact).await;
        assert!(first.is_err());

        let second = publisher.publish(&artifact).await.unwrap();
        assert!(!second.created_release, "locate finds the earlier release");
        assert_eq!(
            host.assets_of("18.1.0"),
            vec!["clang+llvm-18.1.0-x86_64.tar.xz"]
        );
        let creates = host
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::Create(_)))
            .count();
        assert_eq!(creates, 1);
    }

    #[tokio::test]
    async fn test_upload_reads_artifact_from_disk_per_attempt() {
        // The host receives a path and pulls the bytes itself, so a retried
        // attempt picks up whatever is on disk at that moment.
        let host = MockHost::new();
        host.state.lock().unwrap().fail_upload_once = true;
        let publisher = ReleasePublisher::new(&host, "18.1.0", None);
        let (_dir, artifact) = artifact_file("clang+llvm-18.1.0-x86_64.tar.xz");

        assert!(publisher.publish(&artifact).await.is_err());
        std::fs::write(&artifact, b"rebuilt archive bytes").unwrap();
        publisher.publish(&artifact).await.unwrap();

        let uploaded = host.state.lock().unwrap().uploaded.clone();
        assert_eq!(uploaded, vec![b"rebuilt archive bytes".to_vec()]);
    }

    #[tokio::test]
    async fn test_release_candidate_naming_and_prerelease() {
        let host = MockHost::new();
        let publisher = ReleasePublisher::new(&host, "18.1.0", Some(2));

        assert_eq!(publisher.bundle_version(), "18.1.0-rc2");
        assert_eq!(publisher.release_name(), "LLVM and Clang 18.1.0 RC2");

        let draft = publisher.draft();
        assert!(draft.prerelease);
        assert_eq!(draft.tag_name, "18.1.0-rc2");
        assert_eq!(draft.name, "LLVM and Clang 18.1.0 RC2");
        assert!(draft.body.starts_with("LLVM and Clang 18.1.0 RC2"));
    }

    #[tokio::test]
    async fn test_final_release_is_not_prerelease() {
        let host = MockHost::new();
        let publisher = ReleasePublisher::new(&host, "18.1.0", None);

        assert_eq!(publisher.bundle_version(), "18.1.0");
        assert_eq!(publisher.release_name(), "LLVM and Clang 18.1.0");
        assert!(!publisher.draft().prerelease);
    }

    #[tokio::test]
    async fn test_publish_missing_artifact_is_fatal() {
        let host = MockHost::new();
        let publisher = ReleasePublisher::new(&host, "18.1.0", None);

        let err = publisher
            .publish(Path::new("/nonexistent/bundle.tar.xz"))
            .await
            .unwrap_err();
        assert!(!err.is_transient());
        assert!(host.calls().is_empty(), "no remote call before reading the artifact");
    }
}
