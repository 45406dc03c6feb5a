use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::artifact::{ArtifactBundle, ArtifactMeta, ArtifactType};
use crate::error::{ForgeError, Result};

use super::Adapter;

/// Adapter over a local registry tree:
/// `{root}/skills/{id}/metadata.yaml + SKILL.md`, and the equivalent
/// layout for agents, plugins and workspace-configs.
pub struct FilesystemAdapter {
    name: String,
    root: PathBuf,
}

impl FilesystemAdapter {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn artifact_dir(&self, artifact_type: ArtifactType, id: &str) -> PathBuf {
        self.root.join(artifact_type.dir_name()).join(id)
    }

    async fn read_meta(&self, metadata_path: &Path) -> Result<ArtifactMeta> {
        let raw = tokio::fs::read_to_string(metadata_path).await?;
        let meta: ArtifactMeta =
            serde_yaml::from_str(&raw).map_err(|e| ForgeError::InvalidMetadata {
                path: metadata_path.display().to_string(),
                message: e.to_string(),
            })?;
        meta.validate().map_err(|message| ForgeError::InvalidMetadata {
            path: metadata_path.display().to_string(),
            message,
        })?;
        Ok(meta)
    }
}

#[async_trait]
impl Adapter for FilesystemAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list(&self, artifact_type: ArtifactType) -> Result<Vec<ArtifactMeta>> {
        let type_dir = self.root.join(artifact_type.dir_name());
        let mut entries = match tokio::fs::read_dir(&type_dir).await {
            Ok(entries) => entries,
            Err(_) => {
                debug!(adapter = %self.name, dir = %type_dir.display(), "type directory missing, listing empty");
                return Ok(Vec::new());
            }
        };

        let mut metas = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let metadata_path = entry.path().join("metadata.yaml");
            match self.read_meta(&metadata_path).await {
                Ok(meta) => metas.push(meta),
                Err(e) => {
                    // Invalid entries are skipped during listing; read() on
                    // them still fails loudly.
                    warn!(adapter = %self.name, path = %metadata_path.display(), error = %e, "skipping unreadable artifact");
                }
            }
        }
        Ok(metas)
    }

    async fn read(&self, artifact_type: ArtifactType, id: &str) -> Result<ArtifactBundle> {
        let dir = self.artifact_dir(artifact_type, id);
        let metadata_path = dir.join("metadata.yaml");
        if !tokio::fs::try_exists(&metadata_path).await.unwrap_or(false) {
            return Err(ForgeError::ArtifactNotFound(format!(
                "{}:{}",
                artifact_type, id
            )));
        }

        let meta = self.read_meta(&metadata_path).await?;

        let (content, content_path) = match artifact_type.content_file() {
            Some(file) => {
                let path = dir.join(file);
                let content = match tokio::fs::read_to_string(&path).await {
                    Ok(content) => content,
                    Err(_) => String::new(),
                };
                (content, path.display().to_string())
            }
            None => (String::new(), metadata_path.display().to_string()),
        };

        Ok(ArtifactBundle {
            meta,
            content,
            content_path,
        })
    }

    async fn exists(&self, artifact_type: ArtifactType, id: &str) -> Result<bool> {
        let metadata_path = self.artifact_dir(artifact_type, id).join("metadata.yaml");
        Ok(tokio::fs::try_exists(&metadata_path).await.unwrap_or(false))
    }

    async fn write(
        &self,
        artifact_type: ArtifactType,
        id: &str,
        bundle: &ArtifactBundle,
    ) -> Result<()> {
        let dir = self.artifact_dir(artifact_type, id);
        tokio::fs::create_dir_all(&dir).await?;

        let yaml = serde_yaml::to_string(&bundle.meta)?;
        tokio::fs::write(dir.join("metadata.yaml"), yaml).await?;

        if let Some(file) = artifact_type.content_file() {
            tokio::fs::write(dir.join(file), &bundle.content).await?;
        }
        Ok(())
    }
}
