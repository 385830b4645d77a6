//! Storyreel Render Engine
//!
//! Resolves a project document into a fully timed composition and encodes
//! it into a vertical short video.
//!
//! # Pipeline Architecture
//!
//! ```text
//! project.json ──┐
//! styles.json ───┤
//!                ├── SceneCompositor (per scene: probe, layout, cue timing)
//! audio/, img/ ──┘         │
//!                          ├── ProjectAssembler (concat, trailing still, music bed)
//! bgm/ ────────────────────┘         │
//!                                    ▼
//!                             ProjectTimeline ──── subtitles (.srt sidecar)
//!                                    │
//!                                    ▼
//!                      FfmpegBackend (filter graph, H.264/AAC)
//!                                    │
//!                                    ▼
//!                            output_shorts.mp4
//! ```

pub mod assembler;
pub mod compositor;
pub mod export;
pub mod filter_graph;
pub mod media;
pub mod subtitles;
pub mod timeline;

pub use assembler::{AssemblyRequest, ProjectAssembler, TRAILING_STILL_SECS};
pub use compositor::{Canvas, SceneCompositor, SceneSkip};
pub use export::*;
pub use media::{FfprobeProbe, MediaProbe};
pub use timeline::*;
