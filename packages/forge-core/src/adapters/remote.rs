use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::artifact::{ArtifactBundle, ArtifactMeta, ArtifactType};
use crate::error::{ForgeError, Result};

use super::{Adapter, FilesystemAdapter};

/// Adapter over a remote git registry.
///
/// The repository is cloned into a cache directory keyed by a hash of the
/// source URL (same URL, same path), then every call delegates to a
/// [`FilesystemAdapter`] over the clone. The first access clones; later
/// accesses fast-forward the clone, falling back to the stale cache when the
/// remote is unreachable.
pub struct RemoteAdapter {
    name: String,
    url: String,
    inner: FilesystemAdapter,
    synced: Mutex<bool>,
}

impl RemoteAdapter {
    pub fn new(name: impl Into<String>, url: impl Into<String>, cache_root: impl Into<PathBuf>) -> Self {
        let name = name.into();
        let url = url.into();
        let cache_dir = cache_root.into().join(cache_key(&url));
        Self {
            inner: FilesystemAdapter::new(name.clone(), cache_dir),
            name,
            url,
            synced: Mutex::new(false),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        self.inner.root()
    }

    /// Clone on first access, pull on later access. Runs at most once per
    /// adapter instance.
    async fn ensure_fresh(&self) -> Result<()> {
        let mut synced = self.synced.lock().await;
        if *synced {
            return Ok(());
        }

        let cache_dir = self.inner.root();
        if tokio::fs::try_exists(cache_dir.join(".git")).await.unwrap_or(false) {
            debug!(adapter = %self.name, "updating cached clone");
            let pulled = run_git(&["-C", &cache_dir.display().to_string(), "pull", "--ff-only"]).await;
            if let Err(e) = pulled {
                // A stale cache still serves reads.
                warn!(adapter = %self.name, error = %e, "update failed, using cached copy");
            }
        } else {
            debug!(adapter = %self.name, url = %self.url, "cloning remote registry");
            if let Some(parent) = cache_dir.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            run_git(&["clone", "--depth", "1", &self.url, &cache_dir.display().to_string()]).await?;
        }

        *synced = true;
        Ok(())
    }
}

/// Deterministic cache key: hex of the URL's sha256, truncated for path
/// friendliness.
fn cache_key(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    hex::encode(&digest[..8])
}

async fn run_git(args: &[&str]) -> Result<()> {
    let output = Command::new("git").args(args).output().await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ForgeError::Git(format!(
            "git {}: {}",
            args.first().copied().unwrap_or(""),
            stderr.trim()
        )));
    }
    Ok(())
}

#[async_trait]
impl Adapter for RemoteAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list(&self, artifact_type: ArtifactType) -> Result<Vec<ArtifactMeta>> {
        self.ensure_fresh().await?;
        self.inner.list(artifact_type).await
    }

    async fn read(&self, artifact_type: ArtifactType, id: &str) -> Result<ArtifactBundle> {
        self.ensure_fresh().await?;
        self.inner.read(artifact_type, id).await
    }

    async fn exists(&self, artifact_type: ArtifactType, id: &str) -> Result<bool> {
        self.ensure_fresh().await?;
        self.inner.exists(artifact_type, id).await
    }

    async fn write(
        &self,
        artifact_type: ArtifactType,
        id: &str,
        bundle: &ArtifactBundle,
    ) -> Result<()> {
        self.ensure_fresh().await?;
        self.inner.write(artifact_type, id, bundle).await
    }
}
