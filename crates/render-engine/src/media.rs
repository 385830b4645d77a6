//! Media probing.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{anyhow, Context};
use storyreel_common::error::ReelResult;

/// Reads media properties the engine needs from asset files.
pub trait MediaProbe: Send + Sync {
    /// Length of an audio file in seconds.
    fn audio_duration_secs(&self, path: &Path) -> ReelResult<f64>;
}

/// [`MediaProbe`] backed by an `ffprobe` executable.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    binary: PathBuf,
}

impl FfprobeProbe {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Whether the configured binary can be executed.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl MediaProbe for FfprobeProbe {
    fn audio_duration_secs(&self, path: &Path) -> ReelResult<f64> {
        let output = Command::new(&self.binary)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to run {}", self.binary.display()))?;

        if !output.status.success() {
            return Err(anyhow!(
                "ffprobe failed on {} ({}): {}",
                path.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )
            .into());
        }

        let duration = parse_duration(&String::from_utf8_lossy(&output.stdout))
            .with_context(|| format!("Unreadable duration for {}", path.display()))?;
        Ok(duration)
    }
}

fn parse_duration(raw: &str) -> anyhow::Result<f64> {
    let line = raw
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| anyhow!("ffprobe printed no duration"))?;
    let secs: f64 = line
        .parse()
        .with_context(|| format!("not a number: {line:?}"))?;
    if !secs.is_finite() {
        return Err(anyhow!("non-finite duration {secs}"));
    }
    Ok(secs)
}
