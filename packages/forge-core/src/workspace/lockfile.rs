use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::artifact::{ArtifactType, FileOperation, ResolvedArtifact};
use crate::error::Result;

pub const LOCKFILE_NAME: &str = "forge.lock";
const LOCKFILE_VERSION: &str = "1";

/// One locked artifact: the durable record of which on-disk paths it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockedArtifact {
    pub id: String,
    #[serde(rename = "type")]
    pub artifact_type: ArtifactType,
    pub version: String,
    pub registry: String,
    /// 64 lowercase hex chars over the raw content.
    pub sha256: String,
    pub files: Vec<String>,
    pub resolved_at: DateTime<Utc>,
}

/// `forge.lock`: the sole source of truth for file ownership. A path absent
/// from every `files` list is user territory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockFile {
    pub version: String,
    pub locked_at: DateTime<Utc>,
    #[serde(default)]
    pub artifacts: BTreeMap<String, LockedArtifact>,
}

impl Default for LockFile {
    fn default() -> Self {
        Self {
            version: LOCKFILE_VERSION.to_string(),
            locked_at: Utc::now(),
            artifacts: BTreeMap::new(),
        }
    }
}

impl LockFile {
    /// Load from disk; a missing file is an empty lock.
    pub async fn load(path: &Path) -> Result<LockFile> {
        match tokio::fs::read_to_string(path).await {
            Ok(raw) => Ok(serde_yaml::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(LockFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        tokio::fs::write(path, yaml).await?;
        Ok(())
    }

    /// The union of every locked artifact's owned paths, materialized once
    /// per merge call.
    pub fn owned_paths(&self) -> HashSet<String> {
        self.artifacts
            .values()
            .flat_map(|a| a.files.iter().cloned())
            .collect()
    }

    /// Rebuild the lock from scratch after a successful install.
    ///
    /// `workspace-config` artifacts are excluded from locking; each entry
    /// owns the emitted paths whose `source_ref` matches it.
    pub fn rebuild(
        resolved: &[Arc<ResolvedArtifact>],
        operations: &[FileOperation],
        registry: &str,
    ) -> LockFile {
        let now = Utc::now();
        let mut artifacts = BTreeMap::new();

        for artifact in resolved {
            if artifact.reference.artifact_type == ArtifactType::WorkspaceConfig {
                continue;
            }
            let key = artifact.key();
            let files: Vec<String> = operations
                .iter()
                .filter(|op| op.source_ref.key() == key)
                .map(|op| op.path.clone())
                .collect();

            artifacts.insert(
                key,
                LockedArtifact {
                    id: artifact.reference.id.clone(),
                    artifact_type: artifact.reference.artifact_type,
                    version: artifact.bundle.meta.version.clone(),
                    registry: registry.to_string(),
                    sha256: hex::encode(Sha256::digest(artifact.bundle.content.as_bytes())),
                    files,
                    resolved_at: now,
                },
            );
        }

        LockFile {
            version: LOCKFILE_VERSION.to_string(),
            locked_at: now,
            artifacts,
        }
    }
}
