//! Validate project and style documents and the assets they reference.

use storyreel_common::config::{CueRenderMode, EngineConfig};

use super::ReelInputs;

pub fn run(inputs: ReelInputs, config: EngineConfig) -> anyhow::Result<()> {
    println!("Validating project: {}", inputs.project.display());

    let (project, styles) = inputs.load_documents()?;
    let dirs = inputs.asset_dirs();
    let settings = &project.project_settings;

    println!(
        "  Canvas: {}x{} @ {}fps",
        settings.width, settings.height, settings.fps
    );
    match settings.background_rgb()? {
        Some(color) => println!("  Background: {color}"),
        None => println!("  Background: none"),
    }
    println!("  Scenes: {}", project.scenes.len());
    println!(
        "  Styles: {} ({})",
        styles.len(),
        styles.ids().collect::<Vec<_>>().join(", ")
    );
    println!("  Output: {}", dirs.output_path(&settings.output_file).display());

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut incomplete_scenes = 0usize;

    for (index, scene) in project.scenes.iter().enumerate() {
        let n = index + 1;
        let audio = dirs.audio_path(&scene.narration.audio_path);
        let image = dirs.image_path(&scene.image_path);
        if !audio.exists() {
            errors.push(format!("scene {n}: narration not found: {}", audio.display()));
        }
        if !image.exists() {
            errors.push(format!("scene {n}: image not found: {}", image.display()));
        }
        if !audio.exists() || !image.exists() {
            incomplete_scenes += 1;
        }
        for cue in &scene.subtitles {
            if styles.get(&cue.style).is_none() {
                if let Some(resolved) = styles.resolve(&cue.style, &config.default_style_id) {
                    warnings.push(format!(
                        "scene {n}: unknown style '{}', falls back to '{}'",
                        cue.style, resolved.id
                    ));
                }
            }
        }
        if scene.subtitles.len() > 1 && config.cue_mode == CueRenderMode::FirstOnly {
            warnings.push(format!(
                "scene {n}: {} cues, only the first is rendered",
                scene.subtitles.len()
            ));
        }
    }

    if let Some(file) = &settings.bgm_path {
        let bgm = dirs.bgm_path(file);
        if !bgm.exists() {
            warnings.push(format!("background music not found: {}", bgm.display()));
        }
    }
    if let Some(still) = inputs.trailing_still() {
        let path = dirs.image_path(still);
        if !path.exists() {
            warnings.push(format!("trailing still not found: {}", path.display()));
        }
    }

    if !warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &warnings {
            println!("  - {warning}");
        }
    }

    if errors.is_empty() {
        println!("\nProject is valid.");
    } else {
        println!("\nValidation issues (affected scenes will be skipped):");
        for error in &errors {
            println!("  - {error}");
        }
        if incomplete_scenes == project.scenes.len() {
            anyhow::bail!("No scene has all of its assets; nothing would be rendered");
        }
        println!(
            "\n{} issue(s) found. Project may not be fully usable.",
            errors.len()
        );
    }

    Ok(())
}
