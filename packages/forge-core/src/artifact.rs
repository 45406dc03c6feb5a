use std::fmt::{Display, Formatter};
use std::sync::Arc;

use indexmap::IndexMap;
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::{ForgeError, Result};

/// The four kinds of installable artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactType {
    Skill,
    Agent,
    Plugin,
    WorkspaceConfig,
}

impl ArtifactType {
    pub const ALL: [ArtifactType; 4] = [
        ArtifactType::Skill,
        ArtifactType::Agent,
        ArtifactType::Plugin,
        ArtifactType::WorkspaceConfig,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactType::Skill => "skill",
            ArtifactType::Agent => "agent",
            ArtifactType::Plugin => "plugin",
            ArtifactType::WorkspaceConfig => "workspace-config",
        }
    }

    /// Directory holding artifacts of this type in a registry tree.
    pub fn dir_name(&self) -> &'static str {
        match self {
            ArtifactType::Skill => "skills",
            ArtifactType::Agent => "agents",
            ArtifactType::Plugin => "plugins",
            ArtifactType::WorkspaceConfig => "workspace-configs",
        }
    }

    /// Content file accompanying metadata.yaml, if the type has one.
    pub fn content_file(&self) -> Option<&'static str> {
        match self {
            ArtifactType::Skill => Some("SKILL.md"),
            ArtifactType::Agent => Some("AGENT.md"),
            ArtifactType::Plugin | ArtifactType::WorkspaceConfig => None,
        }
    }

    pub fn parse(s: &str) -> Result<ArtifactType> {
        match s {
            "skill" => Ok(ArtifactType::Skill),
            "agent" => Ok(ArtifactType::Agent),
            "plugin" => Ok(ArtifactType::Plugin),
            "workspace-config" => Ok(ArtifactType::WorkspaceConfig),
            other => Err(ForgeError::Config(format!(
                "Unknown artifact type '{}'",
                other
            ))),
        }
    }
}

impl Display for ArtifactType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference to an artifact: `[type:]id[@version]`.
///
/// The identity key for caching and dedup is `type:id`, version-independent:
/// a resolution run settles on at most one version per id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    #[serde(rename = "type")]
    pub artifact_type: ArtifactType,
    pub id: String,
    pub version: String,
}

impl ArtifactRef {
    pub fn new(artifact_type: ArtifactType, id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            artifact_type,
            id: id.into(),
            version: version.into(),
        }
    }

    /// Parse the `[type:]id[@version]` grammar. A missing type prefix
    /// defaults to `skill`, a missing version to `*`.
    pub fn parse(s: &str) -> Result<ArtifactRef> {
        let (type_part, rest) = match s.split_once(':') {
            Some((t, rest)) => (Some(t), rest),
            None => (None, s),
        };

        let artifact_type = match type_part {
            Some(t) => ArtifactType::parse(t)?,
            None => ArtifactType::Skill,
        };

        let (id, version) = match rest.split_once('@') {
            Some((id, v)) => (id, v),
            None => (rest, "*"),
        };

        if id.is_empty() {
            return Err(ForgeError::Config(format!(
                "Invalid artifact reference '{}': empty id",
                s
            )));
        }

        Ok(ArtifactRef::new(artifact_type, id, version))
    }

    /// The `type:id` identity key.
    pub fn key(&self) -> String {
        format!("{}:{}", self.artifact_type, self.id)
    }
}

impl Display for ArtifactRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}@{}", self.artifact_type, self.id, self.version)
    }
}

/// Artifact metadata as stored in `metadata.yaml`.
///
/// One struct covers all four types; the per-type sections are optional and
/// empty where a type does not carry them. `dependencies` keeps declaration
/// order, which the resolver relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// `id-or-prefixed-id -> semver-range`, declaration order preserved.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub dependencies: IndexMap<String, String>,
    /// Agents: skills wired in implicitly. Plugins: bundled skills.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    /// Plugins: bundled agents.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agents: Vec<String>,
}

impl ArtifactMeta {
    /// Schema validation applied on every read. Returns the first failure.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.id.is_empty() {
            return Err("id must not be empty".to_string());
        }
        if !is_kebab_case(&self.id) {
            return Err(format!("id '{}' must be kebab-case", self.id));
        }
        if self.name.is_empty() {
            return Err("name must not be empty".to_string());
        }
        if Version::parse(&self.version).is_err() {
            return Err(format!("version '{}' is not valid semver", self.version));
        }
        Ok(())
    }
}

fn is_kebab_case(s: &str) -> bool {
    !s.starts_with('-')
        && !s.ends_with('-')
        && s.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// An artifact's metadata plus its opaque content payload.
///
/// `content` is never parsed or interpreted by the pipeline; it passes
/// through untouched, template-looking syntax and all.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactBundle {
    pub meta: ArtifactMeta,
    pub content: String,
    pub content_path: String,
}

/// One node of a resolved dependency tree.
///
/// Shared dependencies are the same `Arc` reused at every parent site, so a
/// diamond dependency is resolved exactly once.
#[derive(Debug)]
pub struct ResolvedArtifact {
    pub reference: ArtifactRef,
    pub bundle: ArtifactBundle,
    pub dependencies: Vec<Arc<ResolvedArtifact>>,
}

impl ResolvedArtifact {
    pub fn key(&self) -> String {
        self.reference.key()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Create,
    Update,
}

/// A single workspace-relative file write produced by the compiler.
#[derive(Debug, Clone, PartialEq)]
pub struct FileOperation {
    pub path: String,
    pub content: String,
    pub source_ref: ArtifactRef,
    pub operation: OperationKind,
}
