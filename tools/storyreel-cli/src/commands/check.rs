//! Check renderer availability.

use storyreel_common::config::EngineConfig;
use storyreel_render_engine::{FfmpegBackend, FfprobeProbe, RenderBackend};

pub fn run(config: EngineConfig) -> anyhow::Result<()> {
    println!("Storyreel System Check");
    println!("{}", "=".repeat(50));

    let renderer = &config.renderer;
    let ffmpeg_ok = FfmpegBackend::new(&renderer.ffmpeg_path).is_available();
    if ffmpeg_ok {
        println!("[OK] ffmpeg: {}", renderer.ffmpeg_path.display());
    } else {
        println!("[MISSING] ffmpeg: {}", renderer.ffmpeg_path.display());
    }

    let ffprobe_ok = FfprobeProbe::new(&renderer.ffprobe_path).is_available();
    if ffprobe_ok {
        println!("[OK] ffprobe: {}", renderer.ffprobe_path.display());
    } else {
        println!("[MISSING] ffprobe: {}", renderer.ffprobe_path.display());
    }

    println!(
        "     Codecs: {} / {}",
        renderer.video_codec, renderer.audio_codec
    );
    match renderer.timeout_secs {
        Some(secs) => println!("     Render timeout: {secs}s"),
        None => println!("     Render timeout: none"),
    }

    match &config.font_dir {
        Some(dir) if dir.is_dir() => println!("[OK] Font directory: {}", dir.display()),
        Some(dir) => println!("[WARN] Font directory not found: {}", dir.display()),
        None => println!("[OK] Fonts: resolved by fontconfig"),
    }
    println!("     Default caption style: {}", config.default_style_id);
    println!("     Cue mode: {:?}", config.cue_mode);

    println!();
    if ffmpeg_ok && ffprobe_ok {
        println!("All required tools are available. Storyreel is ready.");
        Ok(())
    } else {
        anyhow::bail!("Required tools are missing. Install ffmpeg or set renderer paths in the config.")
    }
}
