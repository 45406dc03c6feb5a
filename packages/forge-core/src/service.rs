use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::adapters::{Adapter, CompositeAdapter, FilesystemAdapter, RemoteAdapter};
use crate::artifact::{ArtifactRef, ArtifactType};
use crate::compiler::Compiler;
use crate::config::{WorkspaceConfig, CONFIG_NAME};
use crate::error::{ForgeError, Result};
use crate::registry::{ArtifactSummary, Registry, SearchResult};
use crate::resolver::Resolver;
use crate::workspace::{ConflictStrategy, LockFile, MergeReport, WorkspaceManager};

#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub target: String,
    pub dry_run: bool,
    pub conflict_strategy: ConflictStrategy,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            target: "claude".to_string(),
            dry_run: false,
            conflict_strategy: ConflictStrategy::Skip,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InstallReport {
    pub installed: Vec<ArtifactRef>,
    /// Paths the compiler planned, in dependency order.
    pub planned: Vec<String>,
    pub merge: MergeReport,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    /// Everything the configured registries offer.
    Registry,
    /// What the workspace's lockfile currently holds.
    Workspace,
}

/// Facade wiring the pipeline together for the CLI/MCP surface:
/// ref strings -> resolver -> compiler -> merge engine.
pub struct ForgeService {
    workspace_root: PathBuf,
    cache_root: PathBuf,
}

impl ForgeService {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        let cache_root = dirs::home_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(".forge")
            .join("cache");
        Self {
            workspace_root: workspace_root.into(),
            cache_root,
        }
    }

    /// Override where remote registries are cloned.
    pub fn with_cache_root(mut self, cache_root: impl Into<PathBuf>) -> Self {
        self.cache_root = cache_root.into();
        self
    }

    fn config_path(&self) -> PathBuf {
        self.workspace_root.join(CONFIG_NAME)
    }

    async fn load_config(&self) -> Result<WorkspaceConfig> {
        WorkspaceConfig::load(&self.config_path()).await
    }

    /// Build the priority-composed registry from the config. The first
    /// configured source is the write target.
    fn build_registry(&self, config: &WorkspaceConfig) -> Result<Registry> {
        if config.registries.is_empty() {
            return Err(ForgeError::Config(
                "no registries configured in forge.yaml".to_string(),
            ));
        }

        let mut adapters: Vec<Arc<dyn Adapter>> = Vec::new();
        for source in &config.registries {
            match (&source.path, &source.url) {
                (Some(path), _) => {
                    let root = {
                        let p = PathBuf::from(path);
                        if p.is_absolute() {
                            p
                        } else {
                            self.workspace_root.join(p)
                        }
                    };
                    adapters.push(Arc::new(FilesystemAdapter::new(source.name.as_str(), root)));
                }
                (None, Some(url)) => {
                    adapters.push(Arc::new(RemoteAdapter::new(
                        source.name.as_str(),
                        url.as_str(),
                        &self.cache_root,
                    )));
                }
                (None, None) => {
                    return Err(ForgeError::Config(format!(
                        "registry '{}' needs a path or a url",
                        source.name
                    )));
                }
            }
        }

        let composite = CompositeAdapter::new(adapters, 0)?;
        Ok(Registry::new(Arc::new(composite)))
    }

    /// Declare refs in the workspace config, verifying each exists in some
    /// configured source first.
    pub async fn add(&self, refs: &[String]) -> Result<()> {
        let mut config = self.load_config().await?;
        let registry = self.build_registry(&config)?;

        for raw in refs {
            let reference = ArtifactRef::parse(raw)?;
            if !registry
                .adapter()
                .exists(reference.artifact_type, &reference.id)
                .await?
            {
                return Err(ForgeError::ArtifactNotFound(reference.key()));
            }
            config.add_ref(&reference);
        }

        config.save(&self.config_path()).await
    }

    pub async fn remove(&self, refs: &[String]) -> Result<()> {
        let mut config = self.load_config().await?;
        for raw in refs {
            let reference = ArtifactRef::parse(raw)?;
            if !config.remove_ref(&reference) {
                return Err(ForgeError::ArtifactNotFound(reference.key()));
            }
        }
        config.save(&self.config_path()).await
    }

    /// The full pipeline: resolve everything declared, compile for the
    /// target, merge into the workspace, rewrite the lockfile.
    pub async fn install(&self, options: InstallOptions) -> Result<InstallReport> {
        let config = self.load_config().await?;
        let registry = self.build_registry(&config)?;
        let registry_name = config
            .registries
            .first()
            .map(|s| s.name.clone())
            .unwrap_or_else(|| "default".to_string());

        // Fresh resolver per run: the cache must not leak across installs.
        let mut resolver = Resolver::new(registry);
        let resolved = resolver.resolve_all(&config.declared_refs()).await?;

        let compiler = Compiler::new();
        let operations = compiler.emit_all(&resolved, &options.target)?;
        let planned: Vec<String> = operations.iter().map(|op| op.path.clone()).collect();
        let installed: Vec<ArtifactRef> =
            resolved.iter().map(|a| a.reference.clone()).collect();

        if options.dry_run {
            return Ok(InstallReport {
                installed,
                planned,
                merge: MergeReport::default(),
                dry_run: true,
            });
        }

        let manager = WorkspaceManager::new(&self.workspace_root);
        let lock = LockFile::load(&manager.lockfile_path()).await?;
        let merge = manager
            .merge_files(&operations, &lock, options.conflict_strategy)
            .await?;

        let new_lock = LockFile::rebuild(&resolved, &operations, &registry_name);
        new_lock.save(&manager.lockfile_path()).await?;

        Ok(InstallReport {
            installed,
            planned,
            merge,
            dry_run: false,
        })
    }

    pub async fn search(
        &self,
        query: &str,
        artifact_type: Option<ArtifactType>,
    ) -> Result<Vec<SearchResult>> {
        let config = self.load_config().await?;
        let registry = self.build_registry(&config)?;
        registry.search(query, artifact_type).await
    }

    pub async fn list(
        &self,
        scope: ListScope,
        artifact_type: Option<ArtifactType>,
    ) -> Result<Vec<ArtifactSummary>> {
        match scope {
            ListScope::Registry => {
                let config = self.load_config().await?;
                let registry = self.build_registry(&config)?;
                registry.list(artifact_type).await
            }
            ListScope::Workspace => {
                let manager = WorkspaceManager::new(&self.workspace_root);
                let lock = LockFile::load(&manager.lockfile_path()).await?;
                let summaries = lock
                    .artifacts
                    .values()
                    .filter(|a| artifact_type.map_or(true, |t| a.artifact_type == t))
                    .map(|a| ArtifactSummary {
                        reference: ArtifactRef::new(a.artifact_type, a.id.clone(), a.version.clone()),
                        name: a.id.clone(),
                        description: String::new(),
                        tags: Vec::new(),
                    })
                    .collect();
                Ok(summaries)
            }
        }
    }

    /// Resolve one ref string and return the flattened install order.
    pub async fn resolve(&self, ref_string: &str) -> Result<Vec<ArtifactRef>> {
        let reference = ArtifactRef::parse(ref_string)?;
        let config = self.load_config().await?;
        let registry = self.build_registry(&config)?;

        let mut resolver = Resolver::new(registry);
        let resolved = resolver.resolve_all(std::slice::from_ref(&reference)).await?;
        Ok(resolved.iter().map(|a| a.reference.clone()).collect())
    }
}
