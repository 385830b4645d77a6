//! Scene compositor: turns one scene into an ordered layer stack.
//!
//! Per scene, in order:
//! 1. Resolve the narration; a missing or unreadable file skips the scene.
//! 2. The narration length becomes the scene duration.
//! 3. Resolve the image; a missing file skips the scene.
//! 4. Image layer: canvas width, aspect preserved, centered, optional zoom.
//! 5. Background layer beneath it when a background color is configured.
//! 6. Caption overlays for the cues selected by [`CueRenderMode`].
//!
//! Skips are reported as [`SceneSkip`] values, never as errors: a bad scene
//! must not stop the project.

use std::path::{Path, PathBuf};

use storyreel_common::config::{CueRenderMode, EngineConfig};
use storyreel_common::error::AssetKind;
use storyreel_layout_core::cue_timing::resolve_cue_timing;
use storyreel_layout_core::text_layout::layout_caption;
use storyreel_layout_core::ZoomCurve;
use storyreel_project_model::assets::AssetDirs;
use storyreel_project_model::color::Rgb;
use storyreel_project_model::scene::{Animation, Cue, Scene};
use storyreel_project_model::style::{StyleSheet, TextStyle};

use crate::media::MediaProbe;
use crate::timeline::{BackgroundLayer, ImageLayer, Layer, ResolvedCue, SceneComposition};

/// Why a scene was dropped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneSkip {
    #[error("narration audio not found: {}", path.display())]
    MissingNarration { path: PathBuf },

    #[error("narration audio unreadable: {}: {reason}", path.display())]
    UnreadableNarration { path: PathBuf, reason: String },

    #[error("image not found: {}", path.display())]
    MissingImage { path: PathBuf },
}

impl SceneSkip {
    /// Kind of the asset that caused the skip.
    pub fn kind(&self) -> AssetKind {
        match self {
            SceneSkip::MissingNarration { .. } | SceneSkip::UnreadableNarration { .. } => {
                AssetKind::Narration
            }
            SceneSkip::MissingImage { .. } => AssetKind::Image,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            SceneSkip::MissingNarration { path }
            | SceneSkip::UnreadableNarration { path, .. }
            | SceneSkip::MissingImage { path } => path,
        }
    }
}

/// Canvas the compositor lays scenes out on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,

    /// Fill beneath the image, `None` for no background layer.
    pub background: Option<Rgb>,
}

/// Builds [`SceneComposition`]s for one project.
pub struct SceneCompositor<'a> {
    canvas: Canvas,
    styles: &'a StyleSheet,
    dirs: &'a AssetDirs,
    config: &'a EngineConfig,
    probe: &'a dyn MediaProbe,
}

impl<'a> SceneCompositor<'a> {
    pub fn new(
        canvas: Canvas,
        styles: &'a StyleSheet,
        dirs: &'a AssetDirs,
        config: &'a EngineConfig,
        probe: &'a dyn MediaProbe,
    ) -> Self {
        Self {
            canvas,
            styles,
            dirs,
            config,
            probe,
        }
    }

    /// Compose scene `index`.
    pub fn compose(&self, index: usize, scene: &Scene) -> Result<SceneComposition, SceneSkip> {
        let audio_path = self.dirs.audio_path(&scene.narration.audio_path);
        if !audio_path.exists() {
            return Err(SceneSkip::MissingNarration { path: audio_path });
        }

        let duration_secs = match self.probe.audio_duration_secs(&audio_path) {
            Ok(secs) if secs > 0.0 => secs,
            Ok(secs) => {
                return Err(SceneSkip::UnreadableNarration {
                    path: audio_path,
                    reason: format!("non-positive duration {secs}s"),
                })
            }
            Err(e) => {
                return Err(SceneSkip::UnreadableNarration {
                    path: audio_path,
                    reason: e.to_string(),
                })
            }
        };

        let image_path = self.dirs.image_path(&scene.image_path);
        if !image_path.exists() {
            return Err(SceneSkip::MissingImage { path: image_path });
        }

        let mut layers = self.base_layers(image_path, duration_secs, scene.animation);

        let rendered_cues = match self.config.cue_mode {
            CueRenderMode::FirstOnly => scene.subtitles.len().min(1),
            CueRenderMode::All => scene.subtitles.len(),
        };
        if rendered_cues < scene.subtitles.len() {
            tracing::debug!(
                scene = index,
                cues = scene.subtitles.len(),
                rendered = rendered_cues,
                "Rendering first cue only"
            );
        }
        layers.extend(
            (0..rendered_cues)
                .filter_map(|cue_index| self.resolve_cue(&scene.subtitles, cue_index, duration_secs))
                .map(Layer::Text),
        );

        tracing::debug!(
            scene = index,
            duration_secs,
            layers = layers.len(),
            "Scene composed"
        );

        Ok(SceneComposition {
            scene_index: Some(index),
            layers,
            duration_secs,
            audio: Some(audio_path),
        })
    }

    /// Compose a silent still: the same background and image rules as a
    /// scene, without animation or captions.
    pub fn compose_still(&self, image_path: PathBuf, duration_secs: f64) -> SceneComposition {
        SceneComposition {
            scene_index: None,
            layers: self.base_layers(image_path, duration_secs, Animation::None),
            duration_secs,
            audio: None,
        }
    }

    fn base_layers(
        &self,
        image_path: PathBuf,
        duration_secs: f64,
        animation: Animation,
    ) -> Vec<Layer> {
        let mut layers = Vec::with_capacity(3);

        if let Some(color) = self.canvas.background {
            layers.push(Layer::Background(BackgroundLayer {
                color,
                width: self.canvas.width,
                height: self.canvas.height,
            }));
        }

        let zoom = match animation {
            Animation::ZoomIn => Some(ZoomCurve::zoom_in(duration_secs)),
            Animation::None => None,
        };
        layers.push(Layer::Image(ImageLayer {
            path: image_path,
            width: self.canvas.width,
            zoom,
        }));

        layers
    }

    fn resolve_cue(
        &self,
        cues: &[Cue],
        cue_index: usize,
        scene_duration_secs: f64,
    ) -> Option<ResolvedCue> {
        let cue = cues.get(cue_index)?;
        let Some(resolved) = self
            .styles
            .resolve(&cue.style, &self.config.default_style_id)
        else {
            tracing::warn!(cue = cue_index, "Style sheet is empty; caption dropped");
            return None;
        };
        if resolved.id != cue.style {
            tracing::warn!(
                requested = %cue.style,
                used = resolved.id,
                source = ?resolved.source,
                "Unknown caption style; using fallback"
            );
        }

        let timing = resolve_cue_timing(cues, cue_index, scene_duration_secs)?;
        let layout = layout_caption(&cue.text, resolved.style.fontsize, self.canvas.width);

        let style = TextStyle {
            font: self.config.resolve_font(&resolved.style.font),
            ..resolved.style.clone()
        };

        Some(ResolvedCue {
            cue_index,
            start_secs: timing.start_secs,
            duration_secs: timing.duration_secs,
            duration_source: timing.source,
            clamped: timing.clamped,
            text: layout.display_text,
            font_size: layout.font_size,
            box_width: layout.target_width,
            position: cue.position,
            style_id: resolved.id.to_string(),
            style_source: resolved.source,
            style,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use storyreel_common::error::{ReelError, ReelResult};
    use storyreel_layout_core::cue_timing::DurationSource;
    use storyreel_project_model::scene::Narration;
    use storyreel_project_model::style::StyleSource;

    struct FixedProbe(HashMap<PathBuf, f64>);

    impl MediaProbe for FixedProbe {
        fn audio_duration_secs(&self, path: &Path) -> ReelResult<f64> {
            self.0
                .get(path)
                .copied()
                .ok_or_else(|| ReelError::render(format!("cannot probe {}", path.display())))
        }
    }

    struct Fixture {
        root: PathBuf,
        dirs: AssetDirs,
        styles: StyleSheet,
        probe: FixedProbe,
    }

    impl Fixture {
        fn new(name: &str, narration_secs: f64) -> Self {
            let root = std::env::temp_dir().join(name);
            let _ = std::fs::remove_dir_all(&root);
            std::fs::create_dir_all(root.join("audio")).unwrap();
            std::fs::create_dir_all(root.join("img")).unwrap();
            std::fs::write(root.join("audio").join("001.wav"), b"").unwrap();
            std::fs::write(root.join("img").join("001.png"), b"").unwrap();

            let dirs = AssetDirs {
                image: Some(root.join("img")),
                audio: Some(root.join("audio")),
                ..AssetDirs::default()
            };
            let styles: StyleSheet = serde_json::from_str(
                r#"{
                    "title_red": {"fontsize": 90, "font": "bold.ttf", "color": "red"},
                    "caption_white": {"fontsize": 70, "font": "regular.ttf", "color": "white"}
                }"#,
            )
            .unwrap();
            let probe = FixedProbe(HashMap::from([(
                root.join("audio").join("001.wav"),
                narration_secs,
            )]));

            Self {
                root,
                dirs,
                styles,
                probe,
            }
        }

        fn compositor<'a>(&'a self, config: &'a EngineConfig) -> SceneCompositor<'a> {
            SceneCompositor::new(
                Canvas {
                    width: 1080,
                    height: 1920,
                    background: Some(Rgb::WHITE),
                },
                &self.styles,
                &self.dirs,
                config,
                &self.probe,
            )
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            std::fs::remove_dir_all(&self.root).ok();
        }
    }

    fn scene(cues: Vec<Cue>) -> Scene {
        Scene {
            narration: Narration {
                audio_path: "001.wav".into(),
            },
            image_path: "001.png".into(),
            animation: Animation::ZoomIn,
            subtitles: cues,
        }
    }

    #[test]
    fn test_layer_order_background_image_text() {
        let fixture = Fixture::new("storyreel_test_compose_order", 10.0);
        let config = EngineConfig::default();
        let composition = fixture
            .compositor(&config)
            .compose(0, &scene(vec![Cue::new("caption_white", "hello", 2.0)]))
            .unwrap();

        assert_eq!(composition.layers.len(), 3);
        assert!(matches!(composition.layers[0], Layer::Background(_)));
        assert!(matches!(composition.layers[1], Layer::Image(_)));
        assert!(matches!(composition.layers[2], Layer::Text(_)));
        assert_eq!(composition.duration_secs, 10.0);
        assert_eq!(composition.scene_index, Some(0));
    }

    #[test]
    fn test_single_cue_runs_to_scene_end() {
        let fixture = Fixture::new("storyreel_test_compose_scenario_a", 10.0);
        let config = EngineConfig::default();
        let composition = fixture
            .compositor(&config)
            .compose(0, &scene(vec![Cue::new("caption_white", "hello", 2.0)]))
            .unwrap();

        let cue = composition.text_overlays().next().unwrap();
        assert!((cue.start_secs - 2.0).abs() < 1e-9);
        assert!((cue.duration_secs - 8.0).abs() < 1e-9);
        assert_eq!(cue.duration_source, DurationSource::UntilSceneEnd);
        assert_eq!(cue.text, "hello\n ");
    }

    #[test]
    fn test_first_only_mode_times_against_next_cue() {
        let fixture = Fixture::new("storyreel_test_compose_scenario_b", 10.0);
        let config = EngineConfig::default();
        let composition = fixture
            .compositor(&config)
            .compose(
                0,
                &scene(vec![
                    Cue::new("caption_white", "one", 1.0),
                    Cue::new("caption_white", "two", 4.0),
                ]),
            )
            .unwrap();

        let overlays: Vec<_> = composition.text_overlays().collect();
        assert_eq!(overlays.len(), 1);
        assert!((overlays[0].duration_secs - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_mode_renders_every_cue() {
        let fixture = Fixture::new("storyreel_test_compose_all", 10.0);
        let config = EngineConfig {
            cue_mode: CueRenderMode::All,
            ..EngineConfig::default()
        };
        let composition = fixture
            .compositor(&config)
            .compose(
                0,
                &scene(vec![
                    Cue::new("caption_white", "one", 1.0),
                    Cue::new("caption_white", "two", 4.0).with_duration(2.5),
                ]),
            )
            .unwrap();

        let overlays: Vec<_> = composition.text_overlays().collect();
        assert_eq!(overlays.len(), 2);
        assert!((overlays[1].duration_secs - 2.5).abs() < 1e-9);
        assert_eq!(overlays[1].duration_source, DurationSource::Explicit);
    }

    #[test]
    fn test_out_of_order_cue_clamps_and_scene_survives() {
        let fixture = Fixture::new("storyreel_test_compose_scenario_d", 10.0);
        let config = EngineConfig::default();
        let composition = fixture
            .compositor(&config)
            .compose(
                0,
                &scene(vec![
                    Cue::new("caption_white", "late", 6.0),
                    Cue::new("caption_white", "early", 3.0),
                ]),
            )
            .unwrap();

        let cue = composition.text_overlays().next().unwrap();
        assert!(cue.clamped);
        assert!((cue.duration_secs - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_style_falls_back_to_default() {
        let fixture = Fixture::new("storyreel_test_compose_scenario_f", 10.0);
        let config = EngineConfig::default();
        let composition = fixture
            .compositor(&config)
            .compose(0, &scene(vec![Cue::new("no_such_style", "hi", 0.0)]))
            .unwrap();

        let cue = composition.text_overlays().next().unwrap();
        assert_eq!(cue.style_id, "caption_white");
        assert_eq!(cue.style_source, StyleSource::ConfiguredDefault);
        assert_eq!(cue.font_size, 70);
    }

    #[test]
    fn test_font_resolved_against_font_dir() {
        let fixture = Fixture::new("storyreel_test_compose_font_dir", 10.0);
        let config = EngineConfig {
            font_dir: Some(PathBuf::from("/opt/fonts")),
            ..EngineConfig::default()
        };
        let composition = fixture
            .compositor(&config)
            .compose(0, &scene(vec![Cue::new("title_red", "hi", 0.0)]))
            .unwrap();

        let cue = composition.text_overlays().next().unwrap();
        assert_eq!(cue.style.font, "/opt/fonts/bold.ttf");
    }

    #[test]
    fn test_zoom_in_attaches_curve_over_scene() {
        let fixture = Fixture::new("storyreel_test_compose_zoom", 6.0);
        let config = EngineConfig::default();
        let composition = fixture
            .compositor(&config)
            .compose(0, &scene(vec![]))
            .unwrap();

        let zoom = composition.image().unwrap().zoom.unwrap();
        assert!((zoom.scale_at(6.0) - 1.1).abs() < 1e-9);
        assert_eq!(composition.image().unwrap().width, 1080);
        assert_eq!(composition.text_overlays().count(), 0);
    }

    #[test]
    fn test_missing_narration_skips() {
        let fixture = Fixture::new("storyreel_test_compose_missing_audio", 10.0);
        let config = EngineConfig::default();
        let mut bad = scene(vec![]);
        bad.narration.audio_path = "missing.wav".into();

        let skip = fixture.compositor(&config).compose(0, &bad).unwrap_err();
        assert!(matches!(skip, SceneSkip::MissingNarration { .. }));
        assert!(skip.path().ends_with("missing.wav"));
    }

    #[test]
    fn test_missing_image_skips() {
        let fixture = Fixture::new("storyreel_test_compose_missing_image", 10.0);
        let config = EngineConfig::default();
        let mut bad = scene(vec![]);
        bad.image_path = "missing.png".into();

        let skip = fixture.compositor(&config).compose(0, &bad).unwrap_err();
        assert!(matches!(skip, SceneSkip::MissingImage { .. }));
        assert_eq!(skip.kind(), AssetKind::Image);
    }

    #[test]
    fn test_zero_length_narration_skips() {
        let fixture = Fixture::new("storyreel_test_compose_zero_audio", 0.0);
        let config = EngineConfig::default();
        let skip = fixture
            .compositor(&config)
            .compose(0, &scene(vec![]))
            .unwrap_err();
        assert!(matches!(skip, SceneSkip::UnreadableNarration { .. }));
    }

    #[test]
    fn test_still_has_no_audio_or_animation() {
        let fixture = Fixture::new("storyreel_test_compose_still", 10.0);
        let config = EngineConfig::default();
        let still = fixture
            .compositor(&config)
            .compose_still(fixture.root.join("img").join("001.png"), 0.5);

        assert_eq!(still.scene_index, None);
        assert!(still.audio.is_none());
        assert_eq!(still.layers.len(), 2);
        assert!(still.image().unwrap().zoom.is_none());
    }
}
