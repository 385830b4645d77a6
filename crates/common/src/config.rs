//! Engine configuration.
//!
//! Everything the engine needs from its surroundings (renderer binaries,
//! font directory, default caption style) is carried in [`EngineConfig`]
//! and handed to the assembler and backend at construction time. Nothing
//! in the engine reads or writes process environment during a run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ReelError, ReelResult};

/// Global engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// External renderer settings.
    pub renderer: RendererConfig,

    /// Directory holding font files. When set, a style font given as a bare
    /// file name is resolved inside it.
    pub font_dir: Option<PathBuf>,

    /// Style id used when a cue references an unknown style.
    pub default_style_id: String,

    /// Which subtitle cues of a scene become text overlays.
    pub cue_mode: CueRenderMode,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// External render backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// ffmpeg executable (name on PATH or absolute path).
    pub ffmpeg_path: PathBuf,

    /// ffprobe executable used for media durations.
    pub ffprobe_path: PathBuf,

    /// Deadline for a single render call. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,

    /// Video encoder.
    pub video_codec: String,

    /// Audio encoder.
    pub audio_codec: String,
}

/// Subtitle rendering policy per scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CueRenderMode {
    /// Only the first cue of each scene is drawn.
    #[default]
    FirstOnly,
    /// Every cue of each scene is drawn over its own time window.
    All,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "storyreel=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            renderer: RendererConfig::default(),
            font_dir: None,
            default_style_id: "caption_white".to_string(),
            cue_mode: CueRenderMode::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            timeout_secs: None,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl EngineConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit path. Missing or malformed files are errors.
    pub fn load_from(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ReelError::config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ReelError::config(format!("Failed to parse config {}: {e}", path.display()))
        })
    }

    /// Resolve a style font reference against the configured font directory.
    ///
    /// Absolute paths and font names containing a path separator are returned
    /// unchanged, as is everything when no font directory is configured.
    pub fn resolve_font(&self, font: &str) -> String {
        match &self.font_dir {
            Some(dir) if !Path::new(font).is_absolute() && !font.contains(['/', '\\']) => {
                dir.join(font).display().to_string()
            }
            _ => font.to_string(),
        }
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("storyreel").join("config.json")
}
