use std::collections::HashSet;

use crate::artifact::{ArtifactType, FileOperation, OperationKind, ResolvedArtifact};
use crate::error::Result;

use super::{CompiledUnit, EmitStrategy};

/// Reference strategy emitting the `.claude/` directory layout.
///
/// Walks the dependency tree depth-first, emitting each dependency's
/// operations before the artifact's own, so a consumer processing the list
/// in order always sees prerequisites first. Content is copied
/// byte-for-byte from the bundle.
pub struct ClaudeStrategy;

impl ClaudeStrategy {
    fn emit_tree(
        &self,
        artifact: &ResolvedArtifact,
        visited: &mut HashSet<String>,
        out: &mut Vec<FileOperation>,
    ) {
        if !visited.insert(artifact.key()) {
            return;
        }

        for dep in &artifact.dependencies {
            self.emit_tree(dep, visited, out);
        }

        let path = match artifact.reference.artifact_type {
            ArtifactType::Skill => format!(".claude/skills/{}/SKILL.md", artifact.reference.id),
            ArtifactType::Agent => format!(".claude/agents/{}.md", artifact.reference.id),
            // Plugins and workspace-configs emit nothing themselves; their
            // skills and agents are reachable as dependencies and emit
            // independently.
            ArtifactType::Plugin | ArtifactType::WorkspaceConfig => return,
        };

        out.push(FileOperation {
            path,
            content: artifact.bundle.content.clone(),
            source_ref: artifact.reference.clone(),
            operation: OperationKind::Create,
        });
    }
}

impl EmitStrategy for ClaudeStrategy {
    fn target(&self) -> &str {
        "claude"
    }

    fn emit(&self, artifact: &ResolvedArtifact) -> Result<CompiledUnit> {
        let mut operations = Vec::new();
        let mut visited = HashSet::new();
        self.emit_tree(artifact, &mut visited, &mut operations);
        Ok(CompiledUnit {
            operations,
            target: self.target().to_string(),
            artifact: artifact.reference.clone(),
        })
    }
}
