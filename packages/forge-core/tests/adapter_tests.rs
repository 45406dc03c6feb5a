mod common;

use tempfile::TempDir;

use forge_core::adapters::{Adapter, FilesystemAdapter};
use forge_core::{ArtifactType, ForgeError};

#[tokio::test]
async fn list_of_missing_type_directory_is_empty() {
    let tmp = TempDir::new().unwrap();
    let adapter = FilesystemAdapter::new("local", tmp.path());
    assert!(adapter.list(ArtifactType::Skill).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_skips_invalid_entries_but_keeps_valid_ones() {
    let tmp = TempDir::new().unwrap();
    common::write_skill(tmp.path(), "good", "1.0.0", &[]);
    let bad_dir = tmp.path().join("skills/bad");
    std::fs::create_dir_all(&bad_dir).unwrap();
    std::fs::write(bad_dir.join("metadata.yaml"), "id: [not: valid").unwrap();

    let adapter = FilesystemAdapter::new("local", tmp.path());
    let metas = adapter.list(ArtifactType::Skill).await.unwrap();
    assert_eq!(metas.len(), 1);
    assert_eq!(metas[0].id, "good");
}

#[tokio::test]
async fn read_missing_artifact_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let adapter = FilesystemAdapter::new("local", tmp.path());
    match adapter.read(ArtifactType::Skill, "ghost").await {
        Err(ForgeError::ArtifactNotFound(key)) => assert_eq!(key, "skill:ghost"),
        other => panic!("expected ArtifactNotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn read_invalid_metadata_fails_with_path_and_message() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("skills/broken");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("metadata.yaml"),
        "id: broken\nname: Broken\nversion: not-semver\n",
    )
    .unwrap();

    let adapter = FilesystemAdapter::new("local", tmp.path());
    match adapter.read(ArtifactType::Skill, "broken").await {
        Err(ForgeError::InvalidMetadata { path, message }) => {
            assert!(path.ends_with("skills/broken/metadata.yaml"));
            assert!(message.contains("semver"));
        }
        other => panic!("expected InvalidMetadata, got {:?}", other),
    }
}

#[tokio::test]
async fn read_returns_opaque_content_verbatim() {
    let tmp = TempDir::new().unwrap();
    common::write_skill(tmp.path(), "developer", "1.0.0", &[]);
    let weird = "---\n{{ template }} {% block %}\n---\n";
    std::fs::write(tmp.path().join("skills/developer/SKILL.md"), weird).unwrap();

    let adapter = FilesystemAdapter::new("local", tmp.path());
    let bundle = adapter.read(ArtifactType::Skill, "developer").await.unwrap();
    assert_eq!(bundle.content, weird);
    assert!(bundle.content_path.ends_with("SKILL.md"));
}

#[tokio::test]
async fn exists_reflects_metadata_presence() {
    let tmp = TempDir::new().unwrap();
    common::write_skill(tmp.path(), "developer", "1.0.0", &[]);

    let adapter = FilesystemAdapter::new("local", tmp.path());
    assert!(adapter.exists(ArtifactType::Skill, "developer").await.unwrap());
    assert!(!adapter.exists(ArtifactType::Skill, "ghost").await.unwrap());
    assert!(!adapter.exists(ArtifactType::Agent, "developer").await.unwrap());
}

#[tokio::test]
async fn write_round_trips_and_overwrites() {
    let tmp = TempDir::new().unwrap();
    common::write_skill(tmp.path(), "developer", "1.0.0", &[]);
    let adapter = FilesystemAdapter::new("local", tmp.path());

    let mut bundle = adapter.read(ArtifactType::Skill, "developer").await.unwrap();
    bundle.content = "replaced body".to_string();
    adapter
        .write(ArtifactType::Skill, "developer", &bundle)
        .await
        .unwrap();

    let reread = adapter.read(ArtifactType::Skill, "developer").await.unwrap();
    assert_eq!(reread.content, "replaced body");
    assert_eq!(reread.meta, bundle.meta);
}

#[tokio::test]
async fn plugin_read_has_no_content_file() {
    let tmp = TempDir::new().unwrap();
    common::write_plugin(tmp.path(), "extras", "1.0.0", &[], &[]);

    let adapter = FilesystemAdapter::new("local", tmp.path());
    let bundle = adapter.read(ArtifactType::Plugin, "extras").await.unwrap();
    assert!(bundle.content.is_empty());
    assert!(bundle.content_path.ends_with("metadata.yaml"));
}
