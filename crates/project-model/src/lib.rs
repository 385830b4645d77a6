//! Storyreel Project Model
//!
//! Defines the data contracts for Storyreel projects:
//! - **Project:** Canvas settings, output target, music bed, ordered scenes
//! - **Scene:** Narration audio, still image, animation, subtitle cues
//! - **Style sheet:** Caption styles keyed by id, in declaration order
//! - **Color:** Canonical RGB colors normalized once at load time
//!
//! The model carries no behavior beyond loading and validation. Timing and
//! layout decisions live in `storyreel-layout-core`.

pub mod assets;
pub mod color;
pub mod project;
pub mod scene;
pub mod style;

pub use assets::*;
pub use color::*;
pub use project::*;
pub use scene::*;
pub use style::*;
