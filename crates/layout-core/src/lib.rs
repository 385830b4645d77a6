//! Storyreel Layout Core
//!
//! Decides where and when captions appear:
//! - **Text layout:** Greedy short-line merging and font-size fitting
//! - **Cue timing:** Absolute start and duration from partial author hints
//! - **Animation:** Zoom curves evaluated over a scene
//!
//! This crate is pure computation: no I/O, no media access.
//! All inputs are data; all outputs are data.

pub mod animation;
pub mod cue_timing;
pub mod text_layout;

pub use animation::ZoomCurve;
pub use cue_timing::{resolve_all, resolve_cue_timing, CueTiming, DurationSource};
pub use text_layout::{layout_caption, merge_short_lines, optimize_font_size, CaptionLayout};
