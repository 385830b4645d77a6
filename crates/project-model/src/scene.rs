//! Scenes and subtitle cues.

use serde::{Deserialize, Deserializer, Serialize};

/// One narration-driven unit of video time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Narration audio. Its length defines the scene duration.
    pub narration: Narration,

    /// Still image shown for the whole scene (relative to the image dir).
    pub image_path: String,

    /// Motion applied to the image. Absent or `null` means none.
    #[serde(default, deserialize_with = "null_as_default")]
    pub animation: Animation,

    /// Subtitle cues in author order, which is also their temporal order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub subtitles: Vec<Cue>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Narration reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narration {
    /// Audio file (relative to the audio dir).
    pub audio_path: String,
}

/// Image animation tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Animation {
    #[default]
    None,
    /// Slow linear push-in over the scene.
    ZoomIn,
}

/// A single timed subtitle entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    /// Style id in the style sheet.
    pub style: String,

    /// Text, with author line breaks.
    pub text: String,

    /// Start within the scene, in seconds.
    pub start_offset: f64,

    /// Explicit display duration in seconds. When absent the cue runs until
    /// the next cue starts, or to the end of the scene.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    /// On-screen anchor.
    pub position: Position,
}

/// On-screen anchor as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position(pub Anchor, pub Anchor);

/// One axis of a [`Position`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Anchor {
    /// Offset in pixels from the top/left canvas edge.
    Pixels(f64),
    Keyword(AnchorKeyword),
}

/// Keyword anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorKeyword {
    Center,
    Left,
    Right,
    Top,
    Bottom,
}

impl Position {
    pub const CENTER: Position = Position(
        Anchor::Keyword(AnchorKeyword::Center),
        Anchor::Keyword(AnchorKeyword::Center),
    );

    pub fn x(&self) -> Anchor {
        self.0
    }

    pub fn y(&self) -> Anchor {
        self.1
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::CENTER
    }
}

impl Cue {
    pub fn new(style: impl Into<String>, text: impl Into<String>, start_offset: f64) -> Self {
        Self {
            style: style.into(),
            text: text.into(),
            start_offset,
            duration: None,
            position: Position::CENTER,
        }
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_defaults() {
        let scene: Scene = serde_json::from_str(
            r#"{"narration": {"audio_path": "001.wav"}, "image_path": "001.png"}"#,
        )
        .unwrap();
        assert_eq!(scene.animation, Animation::None);
        assert!(scene.subtitles.is_empty());
    }

    #[test]
    fn test_null_animation_and_subtitles_mean_none() {
        let scene: Scene = serde_json::from_str(
            r#"{"narration": {"audio_path": "001.wav"}, "image_path": "001.png", "animation": null, "subtitles": null}"#,
        )
        .unwrap();
        assert_eq!(scene.animation, Animation::None);
        assert!(scene.subtitles.is_empty());
    }

    #[test]
    fn test_cue_parses_mixed_position() {
        let cue: Cue = serde_json::from_str(
            r#"{"style": "caption_white", "text": "Hello\nworld", "start_offset": 0.5, "position": ["center", 1400]}"#,
        )
        .unwrap();
        assert_eq!(cue.duration, None);
        assert_eq!(cue.position.x(), Anchor::Keyword(AnchorKeyword::Center));
        assert_eq!(cue.position.y(), Anchor::Pixels(1400.0));
    }

    #[test]
    fn test_animation_tags() {
        let zoom: Animation = serde_json::from_str("\"zoom_in\"").unwrap();
        assert_eq!(zoom, Animation::ZoomIn);
        let none: Animation = serde_json::from_str("\"none\"").unwrap();
        assert_eq!(none, Animation::None);
        assert!(serde_json::from_str::<Animation>("\"spin\"").is_err());
    }

    #[test]
    fn test_position_requires_two_axes() {
        assert!(serde_json::from_str::<Position>(r#"["center"]"#).is_err());
        assert!(serde_json::from_str::<Position>(r#"["middle", 3]"#).is_err());
    }
}
