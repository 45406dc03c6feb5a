//! forge-core: the resolution-and-installation pipeline behind the `forge`
//! package manager for AI-agent artifacts.
//!
//! Data flow: ref strings -> [`Resolver`] (via [`Registry`] over an
//! [`adapters::Adapter`]) -> resolved artifact trees -> [`Compiler`] ->
//! file operations -> [`WorkspaceManager`] merge + `forge.lock`.

pub mod adapters;
pub mod artifact;
pub mod compiler;
pub mod config;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod service;
pub mod workspace;

pub use artifact::{
    ArtifactBundle, ArtifactMeta, ArtifactRef, ArtifactType, FileOperation, OperationKind,
    ResolvedArtifact,
};
pub use compiler::{Compiler, EmitStrategy};
pub use config::WorkspaceConfig;
pub use error::{ForgeError, Result};
pub use registry::Registry;
pub use resolver::Resolver;
pub use service::{ForgeService, InstallOptions, InstallReport, ListScope};
pub use workspace::{ConflictStrategy, LockFile, MergeReport, WorkspaceManager};
