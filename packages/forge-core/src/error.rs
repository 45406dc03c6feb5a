use thiserror::Error;

pub type Result<T> = std::result::Result<T, ForgeError>;

#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("Invalid metadata at {path}: {message}")]
    InvalidMetadata { path: String, message: String },

    #[error("Circular dependency detected: {}", chain.join(" -> "))]
    CircularDependency { chain: Vec<String> },

    #[error("Version mismatch for {key}: requested '{requested}', available '{available}'")]
    VersionMismatch {
        key: String,
        requested: String,
        available: String,
    },

    #[error("All adapters failed for {key}: {}", attempts.join("; "))]
    AllAdaptersFailed { key: String, attempts: Vec<String> },

    #[error("Unsupported compile target: {0}")]
    UnsupportedTarget(String),

    #[error("Adapter configuration error: {0}")]
    AdapterConfig(String),

    #[error("Git command failed: {0}")]
    Git(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ForgeError {
    /// Returns an actionable suggestion for the error, surfaced verbatim
    /// by the CLI layer.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            ForgeError::ArtifactNotFound(key) => Some(format!(
                "Run `forge search {}` to look for similarly named artifacts.",
                key.rsplit(':').next().unwrap_or(key)
            )),
            ForgeError::InvalidMetadata { .. } => {
                Some("Check the artifact's metadata.yaml for schema errors.".to_string())
            }
            ForgeError::CircularDependency { .. } => Some(
                "Break the cycle by removing one of the dependency declarations.".to_string(),
            ),
            ForgeError::VersionMismatch { .. } => Some(
                "Relax the version range in your workspace config, or use '*'.".to_string(),
            ),
            ForgeError::AllAdaptersFailed { .. } => {
                Some("Check that your configured registries are reachable.".to_string())
            }
            ForgeError::Config(_) => {
                Some("Check your forge.yaml for syntax errors or missing fields.".to_string())
            }
            _ => None,
        }
    }
}
