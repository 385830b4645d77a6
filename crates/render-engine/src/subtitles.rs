//! Caption sidecars in SRT and VTT formats.

use std::path::Path;

use storyreel_common::error::ReelResult;

use crate::timeline::ProjectTimeline;

/// One caption on the project timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEntry {
    pub start_secs: f64,
    pub end_secs: f64,
    pub text: String,
}

/// Every rendered caption at project-absolute times, in playback order.
///
/// Captions are clipped to their scene, matching the trimmed video segment;
/// a caption starting at or after its scene end is dropped. Descender
/// padding and blank lines are dropped from the text.
pub fn collect_entries(timeline: &ProjectTimeline) -> Vec<SubtitleEntry> {
    timeline
        .placed_segments()
        .into_iter()
        .flat_map(|(offset, segment)| {
            let scene_end = segment.duration_secs;
            segment
                .text_overlays()
                .filter(move |cue| cue.start_secs < scene_end)
                .map(move |cue| SubtitleEntry {
                    start_secs: offset + cue.start_secs,
                    end_secs: offset + cue.end_secs().min(scene_end),
                    text: cue
                        .text
                        .lines()
                        .map(str::trim_end)
                        .filter(|line| !line.trim().is_empty())
                        .collect::<Vec<_>>()
                        .join("\n"),
                })
        })
        .filter(|entry| !entry.text.is_empty())
        .collect()
}

/// Generate SRT content for the captions of `timeline`.
pub fn generate_srt(timeline: &ProjectTimeline) -> String {
    let mut output = String::new();

    for (i, entry) in collect_entries(timeline).iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_time(entry.start_secs),
            format_srt_time(entry.end_secs),
        ));
        output.push_str(&entry.text);
        output.push_str("\n\n");
    }

    output
}

/// Generate WebVTT content for the captions of `timeline`.
pub fn generate_vtt(timeline: &ProjectTimeline) -> String {
    let mut output = String::from("WEBVTT\n\n");

    for entry in collect_entries(timeline) {
        output.push_str(&format!(
            "{} --> {}\n",
            format_vtt_time(entry.start_secs),
            format_vtt_time(entry.end_secs),
        ));
        output.push_str(&entry.text);
        output.push_str("\n\n");
    }

    output
}

fn split_millis(secs: f64) -> (u64, u64, u64, u64) {
    let total_ms = (secs.max(0.0) * 1000.0).round() as u64;
    (
        total_ms / 3_600_000,
        (total_ms % 3_600_000) / 60_000,
        (total_ms % 60_000) / 1000,
        total_ms % 1000,
    )
}

/// Format seconds as SRT timestamp: HH:MM:SS,mmm
pub fn format_srt_time(secs: f64) -> String {
    let (hours, minutes, seconds, millis) = split_millis(secs);
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Format seconds as VTT timestamp: HH:MM:SS.mmm
pub fn format_vtt_time(secs: f64) -> String {
    let (hours, minutes, seconds, millis) = split_millis(secs);
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

/// Save captions to `path`; `.vtt` selects WebVTT, anything else SRT.
pub fn save_subtitles(timeline: &ProjectTimeline, path: &Path) -> ReelResult<()> {
    let content = match path.extension().and_then(|e| e.to_str()) {
        Some("vtt") => generate_vtt(timeline),
        _ => generate_srt(timeline),
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, content)?;
    tracing::info!(path = %path.display(), "Wrote caption sidecar");
    Ok(())
}
