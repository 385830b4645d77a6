//! Storyreel Common Utilities
//!
//! Shared infrastructure for all Storyreel crates:
//! - Error types and result aliases
//! - Engine configuration (renderer paths, fonts, default style)
//! - Cooperative cancellation flag
//! - Tracing/logging initialization

pub mod cancel;
pub mod config;
pub mod error;
pub mod logging;

pub use cancel::*;
pub use config::*;
pub use error::*;
