//! Export configuration and job management.

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use storyreel_common::cancel::StopFlag;
use storyreel_common::config::EngineConfig;
use storyreel_common::error::{ReelError, ReelResult};

use crate::filter_graph::build_filter_plan;
use crate::timeline::ProjectTimeline;

/// An export job ready to be rendered.
#[derive(Debug, Clone)]
pub struct ExportJob {
    /// Final output file path.
    pub output_path: PathBuf,

    /// Output frame rate.
    pub fps: u32,

    /// ffmpeg video encoder name.
    pub video_codec: String,

    /// ffmpeg audio encoder name.
    pub audio_codec: String,

    /// Kill the renderer after this many seconds.
    pub timeout_secs: Option<u64>,
}

impl ExportJob {
    pub fn new(timeline: &ProjectTimeline, config: &EngineConfig) -> Self {
        Self {
            output_path: timeline.output_path.clone(),
            fps: timeline.fps,
            video_codec: config.renderer.video_codec.clone(),
            audio_codec: config.renderer.audio_codec.clone(),
            timeout_secs: config.renderer.timeout_secs,
        }
    }

    /// Sibling file the renderer writes into before the final rename.
    pub fn partial_path(&self) -> PathBuf {
        let ext = self
            .output_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mp4");
        self.output_path.with_extension(format!("partial.{ext}"))
    }
}

/// Progress callback for export rendering.
pub type ProgressCallback = Box<dyn Fn(ExportProgress) + Send>;

/// Export progress report.
#[derive(Debug, Clone)]
pub struct ExportProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Frames rendered so far.
    pub frames_rendered: u64,

    /// Total frames to render.
    pub total_frames: u64,

    /// Estimated time remaining in seconds.
    pub eta_secs: f64,

    /// Current stage.
    pub stage: ExportStage,
}

impl ExportProgress {
    fn at_stage(stage: ExportStage, progress: f64, total_frames: u64) -> Self {
        Self {
            progress,
            frames_rendered: (progress * total_frames as f64).round() as u64,
            total_frames,
            eta_secs: 0.0,
            stage,
        }
    }
}

/// Stages of the export process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Preparing,
    Rendering,
    Finalizing,
    Complete,
    Failed,
}

/// Trait for render backends.
pub trait RenderBackend: Send {
    /// Encode `timeline` as described by `job`.
    fn render(
        &mut self,
        timeline: &ProjectTimeline,
        job: &ExportJob,
        stop: &StopFlag,
        progress: Option<ProgressCallback>,
    ) -> ReelResult<()>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Encode an assembled timeline with the configured ffmpeg.
///
/// This is the main entry point for rendering. The output directory is
/// created on demand; the output file only appears once encoding succeeded.
pub async fn export_timeline(
    timeline: ProjectTimeline,
    config: &EngineConfig,
    stop: StopFlag,
    progress: Option<ProgressCallback>,
) -> ReelResult<PathBuf> {
    let job = ExportJob::new(&timeline, config);
    tracing::info!(
        output = %job.output_path.display(),
        scenes = timeline.scenes.len(),
        duration_secs = timeline.duration_secs(),
        "Starting export"
    );

    if let Some(parent) = job.output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    if let Some(cb) = &progress {
        cb(ExportProgress::at_stage(
            ExportStage::Preparing,
            0.0,
            timeline.total_frames(),
        ));
    }

    let mut backend: Box<dyn RenderBackend> =
        Box::new(FfmpegBackend::new(&config.renderer.ffmpeg_path));
    if !backend.is_available() {
        return Err(ReelError::unsupported(format!(
            "No supported render backend found (expected {} to be runnable)",
            config.renderer.ffmpeg_path.display()
        )));
    }

    tracing::info!(backend = backend.name(), "Using render backend");
    let output_path = job.output_path.clone();
    tokio::task::spawn_blocking(move || backend.render(&timeline, &job, &stop, progress))
        .await
        .map_err(|e| ReelError::render(format!("Render task failed: {e}")))??;

    Ok(output_path)
}

/// Renders through one `ffmpeg` invocation with a generated filter graph.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    binary: PathBuf,
}

const WATCHDOG_POLL: Duration = Duration::from_millis(100);
const STALL_WARNING_SECS: u64 = 10;

impl FfmpegBackend {
    pub fn new(binary: impl AsRef<Path>) -> Self {
        Self {
            binary: binary.as_ref().to_path_buf(),
        }
    }

    /// Full ffmpeg argument list for `timeline`, writing to `output`.
    pub fn build_args(timeline: &ProjectTimeline, job: &ExportJob, output: &Path) -> Vec<String> {
        let plan = build_filter_plan(timeline);

        let mut args: Vec<String> = ["-y", "-hide_banner", "-nostats", "-progress", "pipe:1"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        args.extend(plan.to_args());
        args.extend(codec_args(job));
        args.push(output.display().to_string());
        args
    }

    fn run_ffmpeg(
        &self,
        args: &[String],
        total_frames: u64,
        expected_duration_secs: f64,
        timeout_secs: Option<u64>,
        stop: &StopFlag,
        progress: Option<&ProgressCallback>,
    ) -> ReelResult<()> {
        tracing::debug!(args = ?args, "Running ffmpeg");
        let start = Instant::now();
        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ReelError::render(format!("Failed to start ffmpeg: {e}")))?;

        tracing::info!(
            pid = child.id(),
            args_len = args.len(),
            total_frames,
            "ffmpeg process started"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelError::render("Failed to capture ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelError::render("Failed to capture ffmpeg stderr"))?;

        // Drain stderr concurrently to avoid ffmpeg blocking on a full stderr pipe.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut reader = BufReader::new(stderr);
            let mut output = String::new();
            match reader.read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        let child = Arc::new(Mutex::new(child));
        let finished = Arc::new(AtomicBool::new(false));
        let timed_out = Arc::new(AtomicBool::new(false));
        let watchdog = {
            let child = Arc::clone(&child);
            let finished = Arc::clone(&finished);
            let timed_out = Arc::clone(&timed_out);
            let stop = stop.clone();
            let deadline = timeout_secs.map(|secs| start + Duration::from_secs(secs));
            std::thread::spawn(move || {
                while !finished.load(Ordering::SeqCst) {
                    let expired = deadline.is_some_and(|d| Instant::now() >= d);
                    if expired || stop.is_raised() {
                        timed_out.store(expired, Ordering::SeqCst);
                        if let Ok(mut child) = child.lock() {
                            if let Err(err) = child.kill() {
                                tracing::warn!(error = %err, "Failed to kill ffmpeg");
                            }
                        }
                        tracing::warn!(timed_out = expired, "ffmpeg aborted");
                        return;
                    }
                    std::thread::sleep(WATCHDOG_POLL);
                }
            })
        };

        let mut reader = BufReader::new(stdout);
        let mut line = String::new();

        let mut latest_progress = ProgressState::default();
        let mut last_progress_secs = 0.0f64;
        let mut last_progress_wall = Instant::now();
        loop {
            line.clear();
            let bytes = match reader.read_line(&mut line) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed reading ffmpeg progress");
                    break;
                }
            };
            if bytes == 0 {
                break;
            }

            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            latest_progress.update(key, value);
            if key != "progress" {
                continue;
            }

            if latest_progress.out_time_secs > last_progress_secs + 0.001 {
                last_progress_secs = latest_progress.out_time_secs;
                last_progress_wall = Instant::now();
            }
            if let Some(cb) = progress {
                cb(progress_report(
                    &latest_progress,
                    total_frames,
                    expected_duration_secs,
                    start.elapsed().as_secs_f64(),
                ));
            }
            if last_progress_wall.elapsed().as_secs() >= STALL_WARNING_SECS {
                tracing::warn!(
                    out_time_secs = latest_progress.out_time_secs,
                    elapsed_secs = start.elapsed().as_secs_f64(),
                    "No ffmpeg progress advancement for {STALL_WARNING_SECS}s"
                );
                last_progress_wall = Instant::now();
            }
        }

        let status = loop {
            let polled = child
                .lock()
                .map_err(|_| ReelError::render("ffmpeg process handle poisoned"))?
                .try_wait()
                .map_err(|e| ReelError::render(format!("Failed to wait on ffmpeg: {e}")))?;
            if let Some(status) = polled {
                break status;
            }
            std::thread::sleep(WATCHDOG_POLL);
        };
        finished.store(true, Ordering::SeqCst);
        if watchdog.join().is_err() {
            tracing::warn!("ffmpeg watchdog panicked");
        }

        let stderr_output = stderr_task
            .join()
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if timed_out.load(Ordering::SeqCst) {
            return Err(ReelError::Timeout {
                secs: timeout_secs.unwrap_or_default(),
            });
        }
        if stop.is_raised() {
            return Err(ReelError::Cancelled);
        }
        if !status.success() {
            return Err(ReelError::render(format!(
                "ffmpeg export failed (status {}): {}",
                status,
                stderr_output.trim()
            )));
        }

        tracing::info!(
            elapsed_secs = start.elapsed().as_secs_f64(),
            "ffmpeg finished"
        );
        Ok(())
    }
}

impl RenderBackend for FfmpegBackend {
    fn render(
        &mut self,
        timeline: &ProjectTimeline,
        job: &ExportJob,
        stop: &StopFlag,
        progress: Option<ProgressCallback>,
    ) -> ReelResult<()> {
        stop.check()?;
        let total_frames = timeline.total_frames();
        let expected_duration_secs = timeline.duration_secs();
        if expected_duration_secs <= 0.0 {
            return Err(ReelError::render(
                "Export duration resolved to zero seconds",
            ));
        }

        let partial = job.partial_path();
        let args = Self::build_args(timeline, job, &partial);

        let result = self.run_ffmpeg(
            &args,
            total_frames,
            expected_duration_secs,
            job.timeout_secs,
            stop,
            progress.as_ref(),
        );
        if let Err(err) = result {
            discard_partial(&partial);
            if let Some(cb) = &progress {
                cb(ExportProgress::at_stage(ExportStage::Failed, 0.0, total_frames));
            }
            return Err(err);
        }

        if let Some(cb) = &progress {
            cb(ExportProgress::at_stage(
                ExportStage::Finalizing,
                1.0,
                total_frames,
            ));
        }
        if let Err(err) = std::fs::rename(&partial, &job.output_path) {
            discard_partial(&partial);
            return Err(ReelError::render(format!(
                "Failed to move {} into place: {err}",
                partial.display()
            )));
        }

        if let Some(cb) = &progress {
            cb(ExportProgress::at_stage(ExportStage::Complete, 1.0, total_frames));
        }
        tracing::info!(output = %job.output_path.display(), "Export finished");
        Ok(())
    }

    fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

fn discard_partial(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(error = %e, path = %path.display(), "Failed to remove partial output"),
    }
}

fn codec_args(job: &ExportJob) -> Vec<String> {
    vec![
        "-r".to_string(),
        job.fps.max(1).to_string(),
        "-c:v".to_string(),
        job.video_codec.clone(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-c:a".to_string(),
        job.audio_codec.clone(),
        "-movflags".to_string(),
        "+faststart".to_string(),
    ]
}

#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            // Despite the name, ffmpeg reports out_time_ms in microseconds.
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "progress" => {
                self.complete = value == "end";
            }
            _ => {}
        }
    }
}

fn progress_report(
    state: &ProgressState,
    total_frames: u64,
    expected_duration_secs: f64,
    elapsed_secs: f64,
) -> ExportProgress {
    let progress = if expected_duration_secs <= 0.0 {
        0.0
    } else {
        (state.out_time_secs / expected_duration_secs).clamp(0.0, 1.0)
    };

    let frames_rendered = (progress * total_frames as f64).round() as u64;
    let eta_secs = if progress > 0.0 {
        (elapsed_secs / progress) - elapsed_secs
    } else {
        0.0
    }
    .max(0.0);

    ExportProgress {
        progress: if state.complete { 1.0 } else { progress },
        frames_rendered,
        total_frames,
        eta_secs,
        stage: if state.complete {
            ExportStage::Finalizing
        } else {
            ExportStage::Rendering
        },
    }
}
