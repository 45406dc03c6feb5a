use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::artifact::{ArtifactRef, ArtifactType};
use crate::error::{ForgeError, Result};

pub const CONFIG_NAME: &str = "forge.yaml";

/// One registry source, in priority order. Either a local directory tree or
/// a remote git repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySource {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Declared artifacts, one ordered `id -> version-range` map per type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeclaredArtifacts {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub skills: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub agents: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub plugins: IndexMap<String, String>,
    #[serde(default, rename = "workspace-configs", skip_serializing_if = "IndexMap::is_empty")]
    pub workspace_configs: IndexMap<String, String>,
}

impl DeclaredArtifacts {
    fn section_mut(&mut self, artifact_type: ArtifactType) -> &mut IndexMap<String, String> {
        match artifact_type {
            ArtifactType::Skill => &mut self.skills,
            ArtifactType::Agent => &mut self.agents,
            ArtifactType::Plugin => &mut self.plugins,
            ArtifactType::WorkspaceConfig => &mut self.workspace_configs,
        }
    }
}

/// `forge.yaml`: the workspace's declared registries and artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub registries: Vec<RegistrySource>,
    #[serde(default)]
    pub artifacts: DeclaredArtifacts,
}

fn default_version() -> String {
    "1".to_string()
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            registries: Vec::new(),
            artifacts: DeclaredArtifacts::default(),
        }
    }
}

impl WorkspaceConfig {
    /// Load from disk; a missing file yields the default (empty) config.
    pub async fn load(path: &Path) -> Result<WorkspaceConfig> {
        match tokio::fs::read_to_string(path).await {
            Ok(raw) => serde_yaml::from_str(&raw).map_err(|e| {
                ForgeError::Config(format!("failed to parse {}: {}", path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(WorkspaceConfig::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        tokio::fs::write(path, yaml).await?;
        Ok(())
    }

    /// Every declared artifact as a ref, in declaration order per section.
    pub fn declared_refs(&self) -> Vec<ArtifactRef> {
        let sections = [
            (ArtifactType::Skill, &self.artifacts.skills),
            (ArtifactType::Agent, &self.artifacts.agents),
            (ArtifactType::Plugin, &self.artifacts.plugins),
            (ArtifactType::WorkspaceConfig, &self.artifacts.workspace_configs),
        ];

        let mut refs = Vec::new();
        for (artifact_type, section) in sections {
            for (id, version) in section {
                refs.push(ArtifactRef::new(artifact_type, id.clone(), version.clone()));
            }
        }
        refs
    }

    pub fn add_ref(&mut self, reference: &ArtifactRef) {
        self.artifacts
            .section_mut(reference.artifact_type)
            .insert(reference.id.clone(), reference.version.clone());
    }

    /// Returns true when the ref was actually declared.
    pub fn remove_ref(&mut self, reference: &ArtifactRef) -> bool {
        self.artifacts
            .section_mut(reference.artifact_type)
            .shift_remove(&reference.id)
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_refs_cover_all_sections() {
        let yaml = "version: '1'\nregistries:\n  - name: local\n    path: ./registry\nartifacts:\n  skills:\n    developer: 1.0.0\n  agents:\n    reviewer: '*'\n";
        let config: WorkspaceConfig = serde_yaml::from_str(yaml).unwrap();
        let refs = config.declared_refs();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0], ArtifactRef::new(ArtifactType::Skill, "developer", "1.0.0"));
        assert_eq!(refs[1], ArtifactRef::new(ArtifactType::Agent, "reviewer", "*"));
    }

    #[test]
    fn test_add_and_remove_ref() {
        let mut config = WorkspaceConfig::default();
        let r = ArtifactRef::new(ArtifactType::Plugin, "extras", "^2.0");
        config.add_ref(&r);
        assert_eq!(config.artifacts.plugins.get("extras"), Some(&"^2.0".to_string()));
        assert!(config.remove_ref(&r));
        assert!(!config.remove_ref(&r));
    }
}
