pub mod lockfile;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::artifact::FileOperation;
use crate::error::{ForgeError, Result};

pub use lockfile::{LockFile, LockedArtifact, LOCKFILE_NAME};

/// Policy applied when a file exists on disk but is not lockfile-owned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictStrategy {
    Overwrite,
    Backup,
    Skip,
    /// Interactive resolution is a caller concern; inside the merge engine
    /// prompt behaves exactly like skip.
    Prompt,
}

impl FromStr for ConflictStrategy {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "overwrite" => Ok(ConflictStrategy::Overwrite),
            "backup" => Ok(ConflictStrategy::Backup),
            "skip" => Ok(ConflictStrategy::Skip),
            "prompt" => Ok(ConflictStrategy::Prompt),
            other => Err(ForgeError::Config(format!(
                "Unknown conflict strategy '{}' (expected overwrite|backup|skip|prompt)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConflictRecord {
    pub path: String,
    pub strategy: ConflictStrategy,
    pub resolution: String,
}

#[derive(Debug, Default, Serialize)]
pub struct MergeReport {
    pub written: Vec<String>,
    pub skipped: Vec<String>,
    pub backed_up: Vec<String>,
    pub conflicts: Vec<ConflictRecord>,
}

/// Applies file operations to a workspace, consulting the lockfile to tell
/// package-owned files (safe to overwrite) from user territory (conflict
/// policy applies).
pub struct WorkspaceManager {
    root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn lockfile_path(&self) -> PathBuf {
        self.root.join(LOCKFILE_NAME)
    }

    /// Merge operations into the workspace, in input order.
    ///
    /// Each write is independently durable; the batch is not transactional.
    pub async fn merge_files(
        &self,
        operations: &[FileOperation],
        lock: &LockFile,
        strategy: ConflictStrategy,
    ) -> Result<MergeReport> {
        let owned = lock.owned_paths();
        let mut report = MergeReport::default();

        for op in operations {
            let target = self.root.join(&op.path);
            let exists = tokio::fs::try_exists(&target).await.unwrap_or(false);

            if !exists {
                write_file(&target, &op.content).await?;
                report.written.push(op.path.clone());
                continue;
            }

            if owned.contains(&op.path) {
                // Owned from a prior install: overwriting loses nothing of
                // the user's.
                debug!(path = %op.path, "overwriting package-owned file");
                write_file(&target, &op.content).await?;
                report.written.push(op.path.clone());
                continue;
            }

            // Existing file outside the lock: unknown content, treat as a
            // conflict and apply the policy.
            let resolution = match strategy {
                ConflictStrategy::Overwrite => {
                    write_file(&target, &op.content).await?;
                    report.written.push(op.path.clone());
                    "overwritten"
                }
                ConflictStrategy::Backup => {
                    let backup = self.root.join(format!("{}.bak", op.path));
                    tokio::fs::copy(&target, &backup).await?;
                    report.backed_up.push(format!("{}.bak", op.path));
                    write_file(&target, &op.content).await?;
                    report.written.push(op.path.clone());
                    "backed-up"
                }
                ConflictStrategy::Skip | ConflictStrategy::Prompt => {
                    report.skipped.push(op.path.clone());
                    "skipped"
                }
            };

            report.conflicts.push(ConflictRecord {
                path: op.path.clone(),
                strategy,
                resolution: resolution.to_string(),
            });
        }

        Ok(report)
    }

    /// Delete every lock-owned path absent from `current_files`.
    ///
    /// Paths still present in `current_files` are left alone regardless of
    /// lock status. Missing-file deletes are swallowed.
    pub async fn clean_untracked(
        &self,
        lock: &LockFile,
        current_files: &[String],
    ) -> Result<Vec<String>> {
        let mut removed = Vec::new();
        for path in lock.owned_paths() {
            if current_files.iter().any(|f| f == &path) {
                continue;
            }
            let target = self.root.join(&path);
            match tokio::fs::remove_file(&target).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path, error = %e, "failed to remove untracked file");
                }
            }
            removed.push(path);
        }
        Ok(removed)
    }
}

async fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content).await?;
    Ok(())
}
