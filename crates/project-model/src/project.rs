//! Project description types.
//!
//! A project ties together global canvas/output settings and the ordered
//! list of scenes that make up the finished video.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use storyreel_common::error::{AssetKind, ReelError};

use crate::color::{ColorError, ColorSpec, Rgb};
use crate::scene::Scene;

/// Top-level project document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDocument {
    /// Canvas, output, and music settings.
    pub project_settings: ProjectSettings,

    /// Scenes in playback order.
    pub scenes: Vec<Scene>,
}

/// Global project settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSettings {
    /// Canvas width in pixels.
    pub width: u32,

    /// Canvas height in pixels.
    pub height: u32,

    /// Output frame rate.
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Canvas fill beneath the image. `null` disables the background layer.
    #[serde(default = "default_background_color")]
    pub background_color: Option<ColorSpec>,

    /// Output file (relative to the output dir).
    #[serde(default = "default_output_file")]
    pub output_file: String,

    /// Background music (relative to the bgm dir).
    #[serde(default)]
    pub bgm_path: Option<String>,

    /// Linear gain applied to the background music.
    #[serde(default = "default_bgm_volume")]
    pub bgm_volume: f64,
}

fn default_fps() -> u32 {
    30
}

fn default_background_color() -> Option<ColorSpec> {
    Some(ColorSpec::Text("white".to_string()))
}

fn default_output_file() -> String {
    "output_shorts.mp4".to_string()
}

fn default_bgm_volume() -> f64 {
    0.2
}

impl ProjectSettings {
    /// Vertical 1080x1920 canvas at 30 fps with a white background.
    pub fn vertical() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: default_fps(),
            background_color: default_background_color(),
            output_file: default_output_file(),
            bgm_path: None,
            bgm_volume: default_bgm_volume(),
        }
    }

    /// The normalized background color, `Ok(None)` when disabled.
    pub fn background_rgb(&self) -> Result<Option<Rgb>, ColorError> {
        self.background_color.as_ref().map(Rgb::parse).transpose()
    }
}

impl ProjectDocument {
    /// Load and validate a project description.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ProjectError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let project: ProjectDocument =
            serde_json::from_str(&json).map_err(|e| ProjectError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;
        project.validate()?;
        Ok(project)
    }

    /// Check invariants that do not depend on media files.
    pub fn validate(&self) -> Result<(), ProjectError> {
        let settings = &self.project_settings;
        if settings.width == 0 || settings.height == 0 {
            return Err(ProjectError::validation(format!(
                "canvas must be non-empty, got {}x{}",
                settings.width, settings.height
            )));
        }
        if settings.fps == 0 {
            return Err(ProjectError::validation("fps must be at least 1"));
        }
        if !settings.bgm_volume.is_finite() || settings.bgm_volume < 0.0 {
            return Err(ProjectError::validation(
                "bgm_volume must be a non-negative number",
            ));
        }
        settings.background_rgb()?;

        for (scene_idx, scene) in self.scenes.iter().enumerate() {
            for (cue_idx, cue) in scene.subtitles.iter().enumerate() {
                if !cue.start_offset.is_finite() || cue.start_offset < 0.0 {
                    return Err(ProjectError::validation(format!(
                        "scene {} cue {}: start_offset must be a non-negative number",
                        scene_idx + 1,
                        cue_idx + 1
                    )));
                }
                if let Some(duration) = cue.duration {
                    if !duration.is_finite() {
                        return Err(ProjectError::validation(format!(
                            "scene {} cue {}: duration must be a finite number",
                            scene_idx + 1,
                            cue_idx + 1
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

/// Errors that can occur when loading project and style documents.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid project: {message}")]
    ValidationError { message: String },

    #[error(transparent)]
    Color(#[from] ColorError),
}

impl ProjectError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError {
            message: msg.into(),
        }
    }

    /// Convert into the shared taxonomy: a missing document becomes an
    /// asset-not-found of `kind`, a malformed one a project error, and
    /// everything else a configuration error.
    pub fn into_reel_error(self, kind: AssetKind) -> ReelError {
        match self {
            ProjectError::IoError { path, source }
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                ReelError::asset_not_found(kind, path)
            }
            err @ ProjectError::ParseError { .. } => ReelError::project(err.to_string()),
            other => ReelError::config(other.to_string()),
        }
    }
}

impl From<ProjectError> for ReelError {
    fn from(err: ProjectError) -> Self {
        err.into_reel_error(AssetKind::Project)
    }
}
