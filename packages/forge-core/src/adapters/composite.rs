use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::artifact::{ArtifactBundle, ArtifactMeta, ArtifactType};
use crate::error::{ForgeError, Result};

use super::Adapter;

/// Composes an ordered list of adapters into one.
///
/// Index 0 is the highest priority. Reads fall through the list in order;
/// listings merge with the highest-priority entry winning per id; writes go
/// to the single adapter at `writable_index`, regardless of artifact type.
pub struct CompositeAdapter {
    name: String,
    adapters: Vec<Arc<dyn Adapter>>,
    writable_index: usize,
}

impl CompositeAdapter {
    pub fn new(adapters: Vec<Arc<dyn Adapter>>, writable_index: usize) -> Result<Self> {
        if adapters.is_empty() {
            return Err(ForgeError::AdapterConfig(
                "composite adapter requires at least one adapter".to_string(),
            ));
        }
        if writable_index >= adapters.len() {
            return Err(ForgeError::AdapterConfig(format!(
                "writable index {} out of range for {} adapters",
                writable_index,
                adapters.len()
            )));
        }
        Ok(Self {
            name: "composite".to_string(),
            adapters,
            writable_index,
        })
    }
}

#[async_trait]
impl Adapter for CompositeAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list(&self, artifact_type: ArtifactType) -> Result<Vec<ArtifactMeta>> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut merged = Vec::new();

        for adapter in &self.adapters {
            match adapter.list(artifact_type).await {
                Ok(metas) => {
                    for meta in metas {
                        // First occurrence across the scan wins, so the
                        // highest-priority adapter's metadata is kept.
                        if seen.insert(meta.id.clone()) {
                            merged.push(meta);
                        }
                    }
                }
                Err(e) => {
                    warn!(adapter = adapter.name(), error = %e, "adapter failed during list, continuing");
                }
            }
        }
        Ok(merged)
    }

    async fn read(&self, artifact_type: ArtifactType, id: &str) -> Result<ArtifactBundle> {
        let mut attempts = Vec::new();
        for adapter in &self.adapters {
            match adapter.read(artifact_type, id).await {
                Ok(bundle) => return Ok(bundle),
                Err(e) => {
                    warn!(adapter = adapter.name(), error = %e, "adapter failed during read, trying next");
                    attempts.push(format!("{}: {}", adapter.name(), e));
                }
            }
        }
        Err(ForgeError::AllAdaptersFailed {
            key: format!("{}:{}", artifact_type, id),
            attempts,
        })
    }

    async fn exists(&self, artifact_type: ArtifactType, id: &str) -> Result<bool> {
        for adapter in &self.adapters {
            match adapter.exists(artifact_type, id).await {
                Ok(true) => return Ok(true),
                Ok(false) => continue,
                Err(e) => {
                    warn!(adapter = adapter.name(), error = %e, "adapter failed during exists, trying next");
                }
            }
        }
        Ok(false)
    }

    async fn write(
        &self,
        artifact_type: ArtifactType,
        id: &str,
        bundle: &ArtifactBundle,
    ) -> Result<()> {
        self.adapters[self.writable_index]
            .write(artifact_type, id, bundle)
            .await
    }
}
