pub mod claude;

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::artifact::{ArtifactRef, FileOperation, ResolvedArtifact};
use crate::error::{ForgeError, Result};

pub use claude::ClaudeStrategy;

/// Output of one strategy invocation for one artifact.
#[derive(Debug)]
pub struct CompiledUnit {
    pub operations: Vec<FileOperation>,
    pub target: String,
    pub artifact: ArtifactRef,
}

/// Per-target emission of a resolved artifact into file operations.
pub trait EmitStrategy: Send + Sync {
    fn target(&self) -> &str;
    fn emit(&self, artifact: &ResolvedArtifact) -> Result<CompiledUnit>;
}

/// Dispatches resolved artifacts to the strategy registered for a target.
pub struct Compiler {
    strategies: HashMap<String, Box<dyn EmitStrategy>>,
}

impl Compiler {
    /// A compiler with the reference `claude` strategy registered.
    pub fn new() -> Self {
        let mut compiler = Self {
            strategies: HashMap::new(),
        };
        compiler.register(Box::new(ClaudeStrategy));
        compiler
    }

    pub fn register(&mut self, strategy: Box<dyn EmitStrategy>) {
        self.strategies.insert(strategy.target().to_string(), strategy);
    }

    pub fn emit(&self, artifact: &ResolvedArtifact, target: &str) -> Result<CompiledUnit> {
        let strategy = self
            .strategies
            .get(target)
            .ok_or_else(|| ForgeError::UnsupportedTarget(target.to_string()))?;
        strategy.emit(artifact)
    }

    /// Emits every artifact and merges the operations into one list keyed by
    /// output path. When two artifacts produce the same path, the later
    /// artifact in the input wins.
    pub fn emit_all(
        &self,
        artifacts: &[Arc<ResolvedArtifact>],
        target: &str,
    ) -> Result<Vec<FileOperation>> {
        if !self.strategies.contains_key(target) {
            return Err(ForgeError::UnsupportedTarget(target.to_string()));
        }

        let mut by_path: IndexMap<String, FileOperation> = IndexMap::new();
        for artifact in artifacts {
            let unit = self.emit(artifact, target)?;
            for op in unit.operations {
                by_path.insert(op.path.clone(), op);
            }
        }
        Ok(by_path.into_values().collect())
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}
