pub mod composite;
pub mod filesystem;
pub mod remote;

use async_trait::async_trait;

use crate::artifact::{ArtifactBundle, ArtifactMeta, ArtifactType};
use crate::error::Result;

pub use composite::CompositeAdapter;
pub use filesystem::FilesystemAdapter;
pub use remote::RemoteAdapter;

/// Storage-backend capability set over one artifact source.
///
/// Implementations: [`FilesystemAdapter`] (direct directory tree),
/// [`RemoteAdapter`] (clone-then-delegate), and [`CompositeAdapter`]
/// (priority composition of other adapters).
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Human-readable source name, used in aggregate error messages.
    fn name(&self) -> &str;

    /// List every artifact of a type. A missing directory is not an error:
    /// the result is simply empty.
    async fn list(&self, artifact_type: ArtifactType) -> Result<Vec<ArtifactMeta>>;

    /// Fetch one artifact's bundle. Fails with `ArtifactNotFound` if absent
    /// and `InvalidMetadata` if its metadata fails schema validation.
    async fn read(&self, artifact_type: ArtifactType, id: &str) -> Result<ArtifactBundle>;

    async fn exists(&self, artifact_type: ArtifactType, id: &str) -> Result<bool>;

    /// Store a bundle, creating any needed directory structure and
    /// overwriting unconditionally.
    async fn write(
        &self,
        artifact_type: ArtifactType,
        id: &str,
        bundle: &ArtifactBundle,
    ) -> Result<()>;
}
