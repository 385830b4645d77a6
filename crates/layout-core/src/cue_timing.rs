//! Cue timing inference.
//!
//! Authors give every cue a start offset and, optionally, a duration. The
//! missing durations are inferred from the cue order:
//!
//! 1. An explicit duration is used verbatim.
//! 2. Otherwise a cue lasts until the next cue starts.
//! 3. The last cue lasts until the end of the scene.
//!
//! A negative result (out-of-order or past-the-end start offsets) is
//! replaced by [`MIN_CUE_DURATION_SECS`] so the scene still renders. Cue
//! order is an input contract; the clamp keeps bad data renderable, it does
//! not make it correct.

use serde::{Deserialize, Serialize};
use storyreel_project_model::scene::Cue;

/// Floor substituted for negative cue durations.
pub const MIN_CUE_DURATION_SECS: f64 = 0.1;

/// How a cue's duration was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationSource {
    /// Declared on the cue.
    Explicit,
    /// Gap until the next cue's start.
    UntilNextCue,
    /// Remainder of the scene.
    UntilSceneEnd,
}

/// Resolved timing of one cue, relative to the start of its scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CueTiming {
    /// Start within the scene, in seconds.
    pub start_secs: f64,

    /// Display duration in seconds.
    pub duration_secs: f64,

    /// Which rule produced the duration.
    pub source: DurationSource,

    /// Whether the computed duration was negative and replaced by the floor.
    pub clamped: bool,
}

impl CueTiming {
    /// End within the scene, in seconds.
    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }
}

/// Resolve the timing of `cues[index]` in a scene lasting
/// `scene_duration_secs`. Returns `None` when `index` is out of range.
pub fn resolve_cue_timing(
    cues: &[Cue],
    index: usize,
    scene_duration_secs: f64,
) -> Option<CueTiming> {
    let cue = cues.get(index)?;
    let start_secs = cue.start_offset;

    let (raw_duration, source) = match (cue.duration, cues.get(index + 1)) {
        (Some(explicit), _) => (explicit, DurationSource::Explicit),
        (None, Some(next)) => (next.start_offset - start_secs, DurationSource::UntilNextCue),
        (None, None) => (scene_duration_secs - start_secs, DurationSource::UntilSceneEnd),
    };

    let clamped = raw_duration < 0.0;
    if clamped {
        tracing::warn!(
            cue = index,
            start_secs,
            computed_secs = raw_duration,
            "Negative cue duration; clamping to {MIN_CUE_DURATION_SECS}s"
        );
    }

    Some(CueTiming {
        start_secs,
        duration_secs: if clamped {
            MIN_CUE_DURATION_SECS
        } else {
            raw_duration
        },
        source,
        clamped,
    })
}

/// Resolve every cue of a scene, in order.
pub fn resolve_all(cues: &[Cue], scene_duration_secs: f64) -> Vec<CueTiming> {
    (0..cues.len())
        .filter_map(|index| resolve_cue_timing(cues, index, scene_duration_secs))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cue(start: f64) -> Cue {
        Cue::new("caption_white", "text", start)
    }

    #[test]
    fn test_last_cue_runs_to_scene_end() {
        let cues = vec![cue(2.0)];
        let timing = resolve_cue_timing(&cues, 0, 10.0).unwrap();
        assert!((timing.duration_secs - 8.0).abs() < 1e-9);
        assert_eq!(timing.source, DurationSource::UntilSceneEnd);
        assert!(!timing.clamped);
    }

    #[test]
    fn test_cue_runs_until_next_cue() {
        let cues = vec![cue(1.0), cue(4.0)];
        let timings = resolve_all(&cues, 10.0);
        assert!((timings[0].duration_secs - 3.0).abs() < 1e-9);
        assert_eq!(timings[0].source, DurationSource::UntilNextCue);
        assert!((timings[1].duration_secs - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_explicit_duration_wins() {
        let cues = vec![cue(1.0).with_duration(2.5), cue(1.5)];
        let timing = resolve_cue_timing(&cues, 0, 10.0).unwrap();
        assert!((timing.duration_secs - 2.5).abs() < 1e-9);
        assert_eq!(timing.source, DurationSource::Explicit);
    }

    #[test]
    fn test_out_of_order_cues_clamp() {
        let cues = vec![cue(5.0), cue(3.0)];
        let timing = resolve_cue_timing(&cues, 0, 10.0).unwrap();
        assert!((timing.duration_secs - MIN_CUE_DURATION_SECS).abs() < 1e-9);
        assert!(timing.clamped);
    }

    #[test]
    fn test_start_past_scene_end_clamps() {
        let cues = vec![cue(12.0)];
        let timing = resolve_cue_timing(&cues, 0, 10.0).unwrap();
        assert!(timing.clamped);
        assert!((timing.start_secs - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_duration_is_not_clamped() {
        let cues = vec![cue(2.0), cue(2.0)];
        let timing = resolve_cue_timing(&cues, 0, 10.0).unwrap();
        assert_eq!(timing.duration_secs, 0.0);
        assert!(!timing.clamped);
    }

    #[test]
    fn test_out_of_range_index() {
        assert!(resolve_cue_timing(&[], 0, 10.0).is_none());
        assert!(resolve_all(&[], 10.0).is_empty());
    }

    #[test]
    fn test_end_secs() {
        let cues = vec![cue(1.0), cue(4.0)];
        let timing = resolve_cue_timing(&cues, 0, 10.0).unwrap();
        assert!((timing.end_secs() - 4.0).abs() < 1e-9);
    }
}
