//! Assemble a project and encode it to video.

use std::io::Write;

use storyreel_common::cancel::StopFlag;
use storyreel_common::config::EngineConfig;
use storyreel_render_engine::subtitles::save_subtitles;
use storyreel_render_engine::{
    export_timeline, AssemblyRequest, ExportProgress, FfprobeProbe, ProjectAssembler,
};

use super::{apply_cue_mode, ReelInputs};

pub async fn run(
    inputs: ReelInputs,
    mut config: EngineConfig,
    all_cues: bool,
    timeout: Option<u64>,
    srt: bool,
) -> anyhow::Result<()> {
    println!("Rendering project: {}", inputs.project.display());

    apply_cue_mode(&mut config, all_cues);
    if timeout.is_some() {
        config.renderer.timeout_secs = timeout;
    }

    let (project, styles) = inputs.load_documents()?;
    let dirs = inputs.asset_dirs();

    let stop = StopFlag::new();
    let interrupt = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping");
            interrupt.raise();
        }
    });

    let probe = FfprobeProbe::new(&config.renderer.ffprobe_path);
    let assembler = ProjectAssembler::new(config.clone(), Box::new(probe));
    let timeline = assembler.assemble(
        &AssemblyRequest {
            project: &project,
            styles: &styles,
            dirs: &dirs,
            trailing_still: inputs.trailing_still(),
        },
        &stop,
    )?;

    println!(
        "  Scenes: {} rendered, {} skipped",
        timeline.scenes.len(),
        timeline.skipped.len()
    );
    for skipped in &timeline.skipped {
        println!("    - scene {}: {}", skipped.scene_index + 1, skipped.reason);
    }
    println!("  Duration: {:.2}s", timeline.duration_secs());
    println!("  Output: {}", timeline.output_path.display());

    if srt {
        let srt_path = timeline.output_path.with_extension("srt");
        save_subtitles(&timeline, &srt_path)?;
        println!("  Captions: {}", srt_path.display());
    }

    let progress_cb: Box<dyn Fn(ExportProgress) + Send> = Box::new(|p| {
        print!(
            "\r  Progress: {:.1}% ({}/{} frames, ETA: {:.0}s)  ",
            p.progress * 100.0,
            p.frames_rendered,
            p.total_frames,
            p.eta_secs,
        );
        let _ = std::io::stdout().flush();
    });

    match export_timeline(timeline, &config, stop, Some(progress_cb)).await {
        Ok(output_path) => {
            println!("\nExport complete: {}", output_path.display());
            Ok(())
        }
        Err(e) => {
            println!();
            Err(anyhow::anyhow!("Export failed: {e}"))
        }
    }
}
