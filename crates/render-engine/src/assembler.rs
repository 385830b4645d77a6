//! Project assembly: scenes to a [`ProjectTimeline`].

use storyreel_common::cancel::StopFlag;
use storyreel_common::config::EngineConfig;
use storyreel_common::error::{AssetKind, ReelError, ReelResult};
use storyreel_project_model::assets::AssetDirs;
use storyreel_project_model::project::ProjectDocument;
use storyreel_project_model::style::StyleSheet;

use crate::compositor::{Canvas, SceneCompositor};
use crate::media::MediaProbe;
use crate::timeline::{AudioMix, AudioPlacement, MusicBed, ProjectTimeline, SkippedScene};

/// Length of the trailing still, in seconds.
pub const TRAILING_STILL_SECS: f64 = 0.5;

/// Everything one assembly run reads.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyRequest<'a> {
    pub project: &'a ProjectDocument,
    pub styles: &'a StyleSheet,
    pub dirs: &'a AssetDirs,

    /// Still image appended after the last scene, resolved against the
    /// image directory.
    pub trailing_still: Option<&'a str>,
}

/// Turns a project document into a [`ProjectTimeline`].
pub struct ProjectAssembler {
    config: EngineConfig,
    probe: Box<dyn MediaProbe>,
}

impl ProjectAssembler {
    pub fn new(config: EngineConfig, probe: Box<dyn MediaProbe>) -> Self {
        Self { config, probe }
    }

    /// Assemble the project.
    ///
    /// Scenes with missing or unreadable assets are skipped and recorded in
    /// [`ProjectTimeline::skipped`]. A missing trailing still or music bed
    /// only drops that feature. Fails with [`ReelError::EmptyAssembly`] when
    /// no scene survives and with [`ReelError::Cancelled`] when `stop` is
    /// raised between scenes.
    pub fn assemble(
        &self,
        request: &AssemblyRequest<'_>,
        stop: &StopFlag,
    ) -> ReelResult<ProjectTimeline> {
        let project = request.project;
        project.validate()?;
        request
            .styles
            .validate()
            .map_err(|e| e.into_reel_error(AssetKind::StyleSheet))?;

        let settings = &project.project_settings;
        let background = settings
            .background_rgb()
            .map_err(|e| ReelError::config(e.to_string()))?;
        let canvas = Canvas {
            width: settings.width,
            height: settings.height,
            background,
        };
        let compositor = SceneCompositor::new(
            canvas,
            request.styles,
            request.dirs,
            &self.config,
            self.probe.as_ref(),
        );

        tracing::info!(
            scenes = project.scenes.len(),
            width = settings.width,
            height = settings.height,
            fps = settings.fps,
            "Assembling project"
        );

        let mut scenes = Vec::with_capacity(project.scenes.len());
        let mut skipped = Vec::new();
        for (index, scene) in project.scenes.iter().enumerate() {
            stop.check()?;
            match compositor.compose(index, scene) {
                Ok(composition) => {
                    tracing::info!(
                        scene = index + 1,
                        duration_secs = composition.duration_secs,
                        "Scene ready"
                    );
                    scenes.push(composition);
                }
                Err(skip) => {
                    tracing::warn!(
                        scene = index + 1,
                        kind = %skip.kind(),
                        path = %skip.path().display(),
                        "Skipping scene: {skip}"
                    );
                    skipped.push(SkippedScene {
                        scene_index: index,
                        reason: skip.to_string(),
                    });
                }
            }
        }
        stop.check()?;

        if scenes.is_empty() {
            return Err(ReelError::EmptyAssembly);
        }

        let trailing_still = request.trailing_still.and_then(|file| {
            let path = request.dirs.image_path(file);
            if path.exists() {
                Some(compositor.compose_still(path, TRAILING_STILL_SECS))
            } else {
                tracing::warn!(
                    kind = %AssetKind::TrailingStill,
                    path = %path.display(),
                    "Optional asset not found; skipping"
                );
                None
            }
        });

        let mut narration = Vec::with_capacity(scenes.len());
        let mut offset = 0.0;
        for scene in &scenes {
            if let Some(path) = &scene.audio {
                narration.push(AudioPlacement {
                    path: path.clone(),
                    start_secs: offset,
                    duration_secs: scene.duration_secs,
                });
            }
            offset += scene.duration_secs;
        }
        let total_secs =
            offset + trailing_still.as_ref().map_or(0.0, |still| still.duration_secs);

        let music = settings.bgm_path.as_deref().and_then(|file| {
            let path = request.dirs.bgm_path(file);
            if path.exists() {
                Some(MusicBed {
                    path,
                    volume: settings.bgm_volume,
                    duration_secs: total_secs,
                })
            } else {
                tracing::warn!(
                    kind = %AssetKind::BackgroundMusic,
                    path = %path.display(),
                    "Optional asset not found; skipping"
                );
                None
            }
        });

        let output_path = request.dirs.output_path(&settings.output_file);
        tracing::info!(
            scenes = scenes.len(),
            skipped = skipped.len(),
            duration_secs = total_secs,
            output = %output_path.display(),
            "Timeline assembled"
        );

        Ok(ProjectTimeline {
            width: settings.width,
            height: settings.height,
            fps: settings.fps,
            scenes,
            trailing_still,
            audio: AudioMix {
                narration,
                music,
                duration_secs: total_secs,
            },
            output_path,
            skipped,
        })
    }
}
