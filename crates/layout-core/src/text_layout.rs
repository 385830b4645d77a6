//! Caption text layout: line merging and font-size fitting.
//!
//! # Algorithm
//!
//! 1. **Merge** short author lines greedily, left to right: the current
//!    line absorbs the next one while their combined length stays within a
//!    character threshold. Only the immediate next line is considered, so
//!    the result is locally greedy, not globally optimal.
//! 2. **Fit** the font size to the target width from the longest merged
//!    line, with a safety margin for variable glyph widths. The size only
//!    ever shrinks below the style's declared size, never grows.
//! 3. **Pad** with a trailing blank line so descenders on the last line are
//!    not clipped by the renderer.
//!
//! Lengths are counted in Unicode scalar values, not bytes.

use serde::{Deserialize, Serialize};

/// Lines whose merged length stays within this many characters are joined.
pub const MERGE_THRESHOLD_CHARS: usize = 10;

/// Captions may span this fraction of the canvas width.
pub const TARGET_WIDTH_RATIO: f64 = 0.9;

/// Headroom for glyphs wider than the average.
pub const GLYPH_SAFETY_MARGIN: f64 = 0.95;

/// Appended to every caption so the last line keeps its descenders.
pub const DESCENDER_PAD: &str = "\n ";

/// A caption laid out for one canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionLayout {
    /// Text after line merging, without padding.
    pub merged_text: String,

    /// Text handed to the renderer (merged text plus descender pad).
    pub display_text: String,

    /// Fitted font size in pixels.
    pub font_size: u32,

    /// Width the caption was fitted against, in pixels.
    pub target_width: u32,
}

/// Merge consecutive short lines of `text`.
///
/// Guarantees: the output never has more lines than the input, and the
/// concatenation of all characters is unchanged (only line-break positions
/// move). Empty and single-line input is returned unchanged.
pub fn merge_short_lines(text: &str, threshold: usize) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut lines = text.split('\n');
    let Some(first) = lines.next() else {
        return String::new();
    };

    let mut merged: Vec<String> = Vec::new();
    let mut buffer = first.to_string();
    let mut buffer_len = first.chars().count();

    for next_line in lines {
        let next_len = next_line.chars().count();
        if buffer_len + next_len <= threshold {
            buffer.push_str(next_line);
            buffer_len += next_len;
        } else {
            merged.push(std::mem::take(&mut buffer));
            buffer.push_str(next_line);
            buffer_len = next_len;
        }
    }
    merged.push(buffer);

    merged.join("\n")
}

/// Largest font size, at most `base_size`, at which the longest line of
/// `text` fits in `target_width` pixels.
///
/// Returns `base_size` for empty text. The result is never below 1; with a
/// `base_size` of at least 1 it always lies in `[1, base_size]`.
pub fn optimize_font_size(text: &str, base_size: u32, target_width: u32) -> u32 {
    if text.is_empty() {
        return base_size;
    }

    let max_chars = text
        .split('\n')
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);

    if max_chars == 0 {
        return base_size;
    }

    let per_char = target_width as f64 / max_chars as f64;
    let candidate = (per_char * GLYPH_SAFETY_MARGIN) as u32;

    base_size.min(candidate).max(1)
}

/// Caption width for a canvas: [`TARGET_WIDTH_RATIO`] of it, truncated.
pub fn caption_target_width(canvas_width: u32) -> u32 {
    (canvas_width as f64 * TARGET_WIDTH_RATIO) as u32
}

/// Run the full caption pipeline for one cue's text.
pub fn layout_caption(text: &str, base_size: u32, canvas_width: u32) -> CaptionLayout {
    let target_width = caption_target_width(canvas_width);
    let merged_text = merge_short_lines(text, MERGE_THRESHOLD_CHARS);
    let font_size = optimize_font_size(&merged_text, base_size, target_width);
    let display_text = format!("{merged_text}{DESCENDER_PAD}");

    tracing::trace!(
        lines = merged_text.lines().count(),
        font_size,
        target_width,
        "Caption laid out"
    );

    CaptionLayout {
        merged_text,
        display_text,
        font_size,
        target_width,
    }
}
