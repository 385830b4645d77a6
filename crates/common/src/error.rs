//! Error types shared across Storyreel crates.

use std::fmt;
use std::path::PathBuf;

/// Kind of media asset a project references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Narration,
    Image,
    TrailingStill,
    BackgroundMusic,
    StyleSheet,
    Project,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AssetKind::Narration => "narration audio",
            AssetKind::Image => "scene image",
            AssetKind::TrailingStill => "trailing still",
            AssetKind::BackgroundMusic => "background music",
            AssetKind::StyleSheet => "style sheet",
            AssetKind::Project => "project description",
        };
        f.write_str(label)
    }
}

/// Top-level error type for Storyreel operations.
#[derive(Debug, thiserror::Error)]
pub enum ReelError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Project error: {message}")]
    Project { message: String },

    #[error("{kind} not found: {}", path.display())]
    AssetNotFound { kind: AssetKind, path: PathBuf },

    #[error("No valid scenes: every scene was skipped")]
    EmptyAssembly,

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Render exceeded its deadline of {secs}s")]
    Timeout { secs: u64 },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ReelError.
pub type ReelResult<T> = Result<T, ReelError>;

impl ReelError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn project(msg: impl Into<String>) -> Self {
        Self::Project {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    pub fn asset_not_found(kind: AssetKind, path: impl Into<PathBuf>) -> Self {
        Self::AssetNotFound {
            kind,
            path: path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_not_found_message_names_kind_and_path() {
        let err = ReelError::asset_not_found(AssetKind::Narration, "audio/001.wav");
        assert_eq!(err.to_string(), "narration audio not found: audio/001.wav");
    }

    #[test]
    fn test_missing_documents_name_their_kind() {
        let err = ReelError::asset_not_found(AssetKind::StyleSheet, "styles.json");
        assert_eq!(err.to_string(), "style sheet not found: styles.json");
        let err = ReelError::asset_not_found(AssetKind::Project, "project.json");
        assert_eq!(err.to_string(), "project description not found: project.json");
    }
}
