//! Subcommands and the positional inputs they share.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use storyreel_common::config::{CueRenderMode, EngineConfig};
use storyreel_common::error::AssetKind;
use storyreel_project_model::{AssetDirs, ProjectDocument, StyleSheet};

pub mod check;
pub mod plan;
pub mod render;
pub mod validate;

/// Project document, asset directories, style sheet, and trailing still,
/// in that positional order.
#[derive(Args, Debug, Clone)]
pub struct ReelInputs {
    /// Project description (JSON)
    pub project: PathBuf,

    /// Base directory for scene images and the trailing still
    pub image_dir: Option<PathBuf>,

    /// Base directory for narration audio
    pub audio_dir: Option<PathBuf>,

    /// Base directory for background music
    pub bgm_dir: Option<PathBuf>,

    /// Base directory for the output video
    pub output_dir: Option<PathBuf>,

    /// Caption style sheet (JSON)
    pub styles: Option<PathBuf>,

    /// Still image appended after the last scene
    pub trailing_still: Option<String>,
}

impl ReelInputs {
    pub fn asset_dirs(&self) -> AssetDirs {
        AssetDirs {
            image: self.image_dir.clone(),
            audio: self.audio_dir.clone(),
            bgm: self.bgm_dir.clone(),
            output: self.output_dir.clone(),
        }
    }

    /// Load and validate the project and style documents.
    pub fn load_documents(&self) -> anyhow::Result<(ProjectDocument, StyleSheet)> {
        let project = ProjectDocument::load(&self.project)
            .map_err(|e| e.into_reel_error(AssetKind::Project))
            .context("Failed to load project")?;

        let styles_path = self
            .styles
            .as_ref()
            .filter(|path| !path.as_os_str().is_empty())
            .context("No style sheet given; pass it as the sixth positional argument")?;
        let styles = StyleSheet::load(styles_path)
            .map_err(|e| e.into_reel_error(AssetKind::StyleSheet))
            .context("Failed to load style sheet")?;

        Ok((project, styles))
    }

    pub fn trailing_still(&self) -> Option<&str> {
        self.trailing_still
            .as_deref()
            .filter(|still| !still.trim().is_empty())
    }
}

pub fn apply_cue_mode(config: &mut EngineConfig, all_cues: bool) {
    if all_cues {
        config.cue_mode = CueRenderMode::All;
    }
}
