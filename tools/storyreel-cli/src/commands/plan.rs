//! Resolve a project into its timeline without encoding.

use std::path::PathBuf;

use anyhow::Context;
use storyreel_common::cancel::StopFlag;
use storyreel_common::config::EngineConfig;
use storyreel_render_engine::{AssemblyRequest, FfprobeProbe, ProjectAssembler};

use super::{apply_cue_mode, ReelInputs};

pub fn run(
    inputs: ReelInputs,
    mut config: EngineConfig,
    all_cues: bool,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    apply_cue_mode(&mut config, all_cues);

    let (project, styles) = inputs.load_documents()?;
    let dirs = inputs.asset_dirs();
    let probe = FfprobeProbe::new(&config.renderer.ffprobe_path);
    let assembler = ProjectAssembler::new(config, Box::new(probe));

    let timeline = assembler.assemble(
        &AssemblyRequest {
            project: &project,
            styles: &styles,
            dirs: &dirs,
            trailing_still: inputs.trailing_still(),
        },
        &StopFlag::new(),
    )?;

    let json = serde_json::to_string_pretty(&timeline)?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "Wrote timeline ({} scenes, {:.2}s) to {}",
                timeline.scenes.len(),
                timeline.duration_secs(),
                path.display()
            );
        }
        None => println!("{json}"),
    }

    Ok(())
}
