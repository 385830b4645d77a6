//! Resolved composition model handed to render backends.
//!
//! Everything here is fully resolved: absolute times, fitted font sizes,
//! resolved styles and asset paths. Backends never look at the project
//! document or style sheet again.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use storyreel_layout_core::cue_timing::DurationSource;
use storyreel_layout_core::ZoomCurve;
use storyreel_project_model::color::Rgb;
use storyreel_project_model::scene::Position;
use storyreel_project_model::style::{StyleSource, TextStyle};

/// Solid canvas fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundLayer {
    pub color: Rgb,
    pub width: u32,
    pub height: u32,
}

/// Still image scaled to the canvas width, aspect ratio preserved,
/// centered on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageLayer {
    pub path: PathBuf,

    /// Target width in pixels; height follows the image aspect ratio.
    pub width: u32,

    /// Continuous scale animation, if any.
    pub zoom: Option<ZoomCurve>,
}

/// A subtitle cue with every decision made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedCue {
    /// Index of the cue in its scene's subtitle list.
    pub cue_index: usize,

    /// Start within the scene, in seconds.
    pub start_secs: f64,

    /// Display duration in seconds.
    pub duration_secs: f64,

    pub duration_source: DurationSource,

    /// Whether the duration was floor-clamped.
    pub clamped: bool,

    /// Text handed to the renderer, line-merged and padded.
    pub text: String,

    /// Fitted font size in pixels.
    pub font_size: u32,

    /// Width of the caption box in pixels.
    pub box_width: u32,

    pub position: Position,

    /// Id of the style actually applied.
    pub style_id: String,

    pub style_source: StyleSource,

    /// Applied style, with the font reference resolved.
    pub style: TextStyle,
}

impl ResolvedCue {
    /// End within the scene, in seconds.
    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }
}

/// One visual layer of a composition, bottom to top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Layer {
    Background(BackgroundLayer),
    Image(ImageLayer),
    Text(ResolvedCue),
}

/// A resolved span of video: ordered layers plus its audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneComposition {
    /// Index of the source scene, `None` for the trailing still.
    pub scene_index: Option<usize>,

    /// Layers, bottom to top.
    pub layers: Vec<Layer>,

    /// Length of the composition in seconds.
    pub duration_secs: f64,

    /// Narration audio, `None` for silent compositions.
    pub audio: Option<PathBuf>,
}

impl SceneComposition {
    pub fn background(&self) -> Option<&BackgroundLayer> {
        self.layers.iter().find_map(|layer| match layer {
            Layer::Background(bg) => Some(bg),
            _ => None,
        })
    }

    pub fn image(&self) -> Option<&ImageLayer> {
        self.layers.iter().find_map(|layer| match layer {
            Layer::Image(image) => Some(image),
            _ => None,
        })
    }

    pub fn text_overlays(&self) -> impl Iterator<Item = &ResolvedCue> {
        self.layers.iter().filter_map(|layer| match layer {
            Layer::Text(cue) => Some(cue),
            _ => None,
        })
    }
}

/// Narration placed on the project timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioPlacement {
    pub path: PathBuf,
    pub start_secs: f64,
    pub duration_secs: f64,
}

/// Background music bed mixed under the narration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicBed {
    pub path: PathBuf,

    /// Linear gain.
    pub volume: f64,

    /// Exact length the bed is trimmed or padded to.
    pub duration_secs: f64,
}

/// Final audio description of the project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioMix {
    /// Narration tracks, back to back in timeline order.
    pub narration: Vec<AudioPlacement>,

    /// Optional music bed spanning the whole timeline.
    pub music: Option<MusicBed>,

    /// Total mixed length in seconds.
    pub duration_secs: f64,
}

/// A scene that did not make it into the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedScene {
    pub scene_index: usize,
    pub reason: String,
}

/// The terminal artifact of assembly, handed to a render backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectTimeline {
    pub width: u32,
    pub height: u32,
    pub fps: u32,

    /// Scene compositions in playback order.
    pub scenes: Vec<SceneComposition>,

    /// Short silent still appended after the last scene.
    pub trailing_still: Option<SceneComposition>,

    pub audio: AudioMix,

    /// Where the encoded video goes.
    pub output_path: PathBuf,

    /// Scenes dropped during assembly, with the reason.
    #[serde(default)]
    pub skipped: Vec<SkippedScene>,
}

impl ProjectTimeline {
    /// All compositions in playback order, trailing still last.
    pub fn segments(&self) -> impl Iterator<Item = &SceneComposition> {
        self.scenes.iter().chain(self.trailing_still.iter())
    }

    /// Start time of every segment on the project timeline, paired with it.
    pub fn placed_segments(&self) -> Vec<(f64, &SceneComposition)> {
        let mut offset = 0.0;
        self.segments()
            .map(|segment| {
                let start = offset;
                offset += segment.duration_secs;
                (start, segment)
            })
            .collect()
    }

    /// Total length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.segments().map(|segment| segment.duration_secs).sum()
    }

    /// Number of frames at the project frame rate.
    pub fn total_frames(&self) -> u64 {
        (self.duration_secs() * self.fps as f64).ceil() as u64
    }
}
