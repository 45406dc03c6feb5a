use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use semver::{Version, VersionReq};

use crate::artifact::{ArtifactMeta, ArtifactRef, ArtifactType, ResolvedArtifact};
use crate::error::{ForgeError, Result};
use crate::registry::Registry;

/// Turns requested refs into cycle-checked, version-satisfied dependency
/// trees.
///
/// State is scoped to one install run: the cache dedups diamond dependencies
/// (one `Arc` shared by every parent) and makes repeat lookups idempotent,
/// while `in_progress` exists purely for cycle detection. Construct a fresh
/// resolver per run or call [`Resolver::reset`] between runs.
pub struct Resolver {
    registry: Registry,
    cache: HashMap<String, Arc<ResolvedArtifact>>,
    in_progress: HashSet<String>,
}

impl Resolver {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            cache: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Clears the per-run cache and cycle-detection state.
    pub fn reset(&mut self) {
        self.cache.clear();
        self.in_progress.clear();
    }

    pub async fn resolve(&mut self, reference: &ArtifactRef) -> Result<Arc<ResolvedArtifact>> {
        self.resolve_with_stack(reference.clone(), Vec::new()).await
    }

    /// Resolves every ref, then flattens the trees depth-first post-order:
    /// dependencies always precede the artifact that declared them, and an
    /// id shared by multiple parents appears exactly once.
    pub async fn resolve_all(&mut self, refs: &[ArtifactRef]) -> Result<Vec<Arc<ResolvedArtifact>>> {
        let mut roots = Vec::new();
        for reference in refs {
            roots.push(self.resolve(reference).await?);
        }

        let mut visited = HashSet::new();
        let mut ordered = Vec::new();
        for root in &roots {
            flatten_post_order(root, &mut visited, &mut ordered);
        }
        Ok(ordered)
    }

    fn resolve_with_stack<'a>(
        &'a mut self,
        reference: ArtifactRef,
        call_stack: Vec<String>,
    ) -> Pin<Box<dyn Future<Output = Result<Arc<ResolvedArtifact>>> + Send + 'a>> {
        Box::pin(async move {
            let key = reference.key();

            // Cache hit returns the version already settled this run, even
            // when the requested version string differs.
            if let Some(cached) = self.cache.get(&key) {
                return Ok(cached.clone());
            }

            if self.in_progress.contains(&key) {
                let mut chain = call_stack;
                chain.push(key);
                return Err(ForgeError::CircularDependency { chain });
            }

            self.in_progress.insert(key.clone());
            let result = self.resolve_fetched(&reference, &key, call_stack).await;
            self.in_progress.remove(&key);
            result
        })
    }

    async fn resolve_fetched(
        &mut self,
        reference: &ArtifactRef,
        key: &str,
        call_stack: Vec<String>,
    ) -> Result<Arc<ResolvedArtifact>> {
        let bundle = self.registry.get(reference).await?;
        check_version(reference, &bundle.meta.version, key)?;

        let dep_refs = declared_dependencies(&bundle.meta, reference.artifact_type)?;

        let mut stack = call_stack;
        stack.push(key.to_string());

        let mut dependencies = Vec::new();
        for dep_ref in dep_refs {
            dependencies.push(self.resolve_with_stack(dep_ref, stack.clone()).await?);
        }

        let resolved = Arc::new(ResolvedArtifact {
            reference: reference.clone(),
            bundle,
            dependencies,
        });
        self.cache.insert(key.to_string(), resolved.clone());
        Ok(resolved)
    }
}

/// Wildcard and `latest` requests never trigger a range check. An exact
/// request requires equality; anything else is matched as a semver range
/// against the single available version.
fn check_version(reference: &ArtifactRef, available: &str, key: &str) -> Result<()> {
    let requested = reference.version.as_str();
    if requested == "*" || requested == "latest" {
        return Ok(());
    }

    let mismatch = || ForgeError::VersionMismatch {
        key: key.to_string(),
        requested: requested.to_string(),
        available: available.to_string(),
    };

    let concrete = Version::parse(available).map_err(|_| mismatch())?;

    if let Ok(exact) = Version::parse(requested) {
        if exact == concrete {
            return Ok(());
        }
        return Err(mismatch());
    }

    let range = VersionReq::parse(requested).map_err(|_| mismatch())?;
    if range.matches(&concrete) {
        Ok(())
    } else {
        Err(mismatch())
    }
}

/// Declared dependencies, in metadata declaration order.
///
/// Map keys carry an optional `skill:`/`agent:`/`plugin:` prefix (default
/// `skill`); for agents, every `skills[]` entry not already declared
/// explicitly joins as an implicit wildcard skill dependency.
fn declared_dependencies(meta: &ArtifactMeta, artifact_type: ArtifactType) -> Result<Vec<ArtifactRef>> {
    let mut refs = Vec::new();
    for (dep_key, range) in &meta.dependencies {
        let parsed = ArtifactRef::parse(dep_key)?;
        refs.push(ArtifactRef::new(parsed.artifact_type, parsed.id, range.clone()));
    }

    if artifact_type == ArtifactType::Agent {
        for skill_id in &meta.skills {
            let already_declared = refs
                .iter()
                .any(|r| r.artifact_type == ArtifactType::Skill && &r.id == skill_id);
            if !already_declared {
                refs.push(ArtifactRef::new(ArtifactType::Skill, skill_id.clone(), "*"));
            }
        }
    }

    Ok(refs)
}

fn flatten_post_order(
    node: &Arc<ResolvedArtifact>,
    visited: &mut HashSet<String>,
    out: &mut Vec<Arc<ResolvedArtifact>>,
) {
    if !visited.insert(node.key()) {
        return;
    }
    for dep in &node.dependencies {
        flatten_post_order(dep, visited, out);
    }
    out.push(node.clone());
}
