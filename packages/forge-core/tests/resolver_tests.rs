mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use forge_core::adapters::{Adapter, FilesystemAdapter};
use forge_core::{ArtifactBundle, ArtifactMeta, ArtifactRef, ArtifactType, ForgeError, Registry, Resolver};

/// Delegating adapter that counts fetches, for cache-behavior assertions.
struct CountingAdapter {
    inner: FilesystemAdapter,
    reads: AtomicUsize,
}

impl CountingAdapter {
    fn new(inner: FilesystemAdapter) -> Self {
        Self {
            inner,
            reads: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Adapter for CountingAdapter {
    fn name(&self) -> &str {
        "counting"
    }

    async fn list(&self, artifact_type: ArtifactType) -> forge_core::Result<Vec<ArtifactMeta>> {
        self.inner.list(artifact_type).await
    }

    async fn read(&self, artifact_type: ArtifactType, id: &str) -> forge_core::Result<ArtifactBundle> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read(artifact_type, id).await
    }

    async fn exists(&self, artifact_type: ArtifactType, id: &str) -> forge_core::Result<bool> {
        self.inner.exists(artifact_type, id).await
    }

    async fn write(
        &self,
        artifact_type: ArtifactType,
        id: &str,
        bundle: &ArtifactBundle,
    ) -> forge_core::Result<()> {
        self.inner.write(artifact_type, id, bundle).await
    }
}

fn counting_resolver(root: &TempDir) -> (Resolver, Arc<CountingAdapter>) {
    let adapter = Arc::new(CountingAdapter::new(FilesystemAdapter::new(
        "local",
        root.path(),
    )));
    let dyn_adapter: Arc<dyn Adapter> = adapter.clone();
    let resolver = Resolver::new(Registry::new(dyn_adapter));
    (resolver, adapter)
}

fn skill_ref(id: &str) -> ArtifactRef {
    ArtifactRef::new(ArtifactType::Skill, id, "*")
}

#[tokio::test]
async fn resolving_same_ref_twice_fetches_once() {
    let tmp = TempDir::new().unwrap();
    common::write_skill(tmp.path(), "developer", "1.0.0", &[]);
    let (mut resolver, adapter) = counting_resolver(&tmp);

    let first = resolver.resolve(&skill_ref("developer")).await.unwrap();
    // A different version string still hits the cache: one version per id
    // per run.
    let second = resolver
        .resolve(&ArtifactRef::new(ArtifactType::Skill, "developer", "9.9.9"))
        .await
        .unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(adapter.reads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn diamond_dependency_resolves_once() {
    let tmp = TempDir::new().unwrap();
    common::write_skill(tmp.path(), "a", "1.0.0", &[("b", "*"), ("c", "*")]);
    common::write_skill(tmp.path(), "b", "1.0.0", &[("d", "*")]);
    common::write_skill(tmp.path(), "c", "1.0.0", &[("d", "*")]);
    common::write_skill(tmp.path(), "d", "1.0.0", &[]);
    let (mut resolver, adapter) = counting_resolver(&tmp);

    let a = resolver.resolve(&skill_ref("a")).await.unwrap();

    assert_eq!(adapter.reads.load(Ordering::SeqCst), 4);
    let via_b = &a.dependencies[0].dependencies[0];
    let via_c = &a.dependencies[1].dependencies[0];
    assert_eq!(via_b.reference.id, "d");
    assert!(Arc::ptr_eq(via_b, via_c));
}

#[tokio::test]
async fn self_cycle_fails_with_chain() {
    let tmp = TempDir::new().unwrap();
    common::write_skill(tmp.path(), "a", "1.0.0", &[("a", "*")]);
    let (mut resolver, _) = counting_resolver(&tmp);

    match resolver.resolve(&skill_ref("a")).await {
        Err(ForgeError::CircularDependency { chain }) => {
            assert_eq!(chain, vec!["skill:a", "skill:a"]);
        }
        other => panic!("expected CircularDependency, got {:?}", other),
    }
}

#[tokio::test]
async fn indirect_cycle_fails_with_full_chain() {
    let tmp = TempDir::new().unwrap();
    common::write_skill(tmp.path(), "a", "1.0.0", &[("b", "*")]);
    common::write_skill(tmp.path(), "b", "1.0.0", &[("a", "*")]);
    let (mut resolver, _) = counting_resolver(&tmp);

    match resolver.resolve(&skill_ref("a")).await {
        Err(ForgeError::CircularDependency { chain }) => {
            assert!(chain.contains(&"skill:a".to_string()));
            assert!(chain.contains(&"skill:b".to_string()));
            assert_eq!(chain.last().unwrap(), "skill:a");
        }
        other => panic!("expected CircularDependency, got {:?}", other),
    }
}

#[tokio::test]
async fn wildcard_and_latest_skip_range_check() {
    let tmp = TempDir::new().unwrap();
    common::write_skill(tmp.path(), "old", "0.0.1", &[]);
    let (mut resolver, _) = counting_resolver(&tmp);

    resolver.resolve(&skill_ref("old")).await.unwrap();
    resolver.reset();
    resolver
        .resolve(&ArtifactRef::new(ArtifactType::Skill, "old", "latest"))
        .await
        .unwrap();
}

#[tokio::test]
async fn unsatisfied_range_reports_available_version() {
    let tmp = TempDir::new().unwrap();
    common::write_skill(tmp.path(), "old", "1.0.0", &[]);
    let (mut resolver, _) = counting_resolver(&tmp);

    match resolver
        .resolve(&ArtifactRef::new(ArtifactType::Skill, "old", ">=2.0.0"))
        .await
    {
        Err(ForgeError::VersionMismatch {
            requested,
            available,
            ..
        }) => {
            assert_eq!(requested, ">=2.0.0");
            assert_eq!(available, "1.0.0");
        }
        other => panic!("expected VersionMismatch, got {:?}", other),
    }
}

#[tokio::test]
async fn missing_artifact_aborts_resolution() {
    let tmp = TempDir::new().unwrap();
    common::write_skill(tmp.path(), "a", "1.0.0", &[("ghost", "*")]);
    let (mut resolver, _) = counting_resolver(&tmp);

    assert!(resolver.resolve(&skill_ref("a")).await.is_err());
}

#[tokio::test]
async fn resolve_all_orders_dependencies_first() {
    let tmp = TempDir::new().unwrap();
    common::write_skill(tmp.path(), "main", "1.0.0", &[("dep", "*")]);
    common::write_skill(tmp.path(), "dep", "1.0.0", &[]);
    let (mut resolver, _) = counting_resolver(&tmp);

    let ordered = resolver
        .resolve_all(&[skill_ref("main")])
        .await
        .unwrap();

    let ids: Vec<_> = ordered.iter().map(|a| a.reference.id.clone()).collect();
    let dep_index = ids.iter().position(|id| id == "dep").unwrap();
    let main_index = ids.iter().position(|id| id == "main").unwrap();
    assert!(dep_index < main_index);
}

#[tokio::test]
async fn resolve_all_dedups_repeated_refs() {
    let tmp = TempDir::new().unwrap();
    common::write_skill(tmp.path(), "developer", "1.0.0", &[]);
    let (mut resolver, _) = counting_resolver(&tmp);

    let ordered = resolver
        .resolve_all(&[skill_ref("developer"), skill_ref("developer")])
        .await
        .unwrap();
    assert_eq!(ordered.len(), 1);
}

#[tokio::test]
async fn agent_pulls_implicit_skills() {
    let tmp = TempDir::new().unwrap();
    common::write_agent(tmp.path(), "reviewer", "1.0.0", &[], &["lint"]);
    common::write_skill(tmp.path(), "lint", "2.1.0", &[]);
    let (mut resolver, _) = counting_resolver(&tmp);

    let agent = resolver
        .resolve(&ArtifactRef::new(ArtifactType::Agent, "reviewer", "*"))
        .await
        .unwrap();
    assert_eq!(agent.dependencies.len(), 1);
    assert_eq!(agent.dependencies[0].reference.key(), "skill:lint");
}

#[tokio::test]
async fn reset_clears_the_run_cache() {
    let tmp = TempDir::new().unwrap();
    common::write_skill(tmp.path(), "developer", "1.0.0", &[]);
    let (mut resolver, adapter) = counting_resolver(&tmp);

    resolver.resolve(&skill_ref("developer")).await.unwrap();
    resolver.reset();
    resolver.resolve(&skill_ref("developer")).await.unwrap();
    assert_eq!(adapter.reads.load(Ordering::SeqCst), 2);
}
