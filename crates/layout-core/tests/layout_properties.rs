use proptest::prelude::*;

use storyreel_layout_core::cue_timing::{resolve_all, MIN_CUE_DURATION_SECS};
use storyreel_layout_core::text_layout::{merge_short_lines, optimize_font_size};
use storyreel_project_model::scene::Cue;

fn caption_text() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-zあ-ん ]{0,14}", 0..8).prop_map(|lines| lines.join("\n"))
}

/// Non-decreasing start offsets strictly inside a scene of the returned length.
fn well_formed_cues() -> impl Strategy<Value = (Vec<Cue>, f64)> {
    (1.0f64..120.0, prop::collection::vec(0.0f64..1.0, 0..10)).prop_map(|(scene, fractions)| {
        let mut starts: Vec<f64> = fractions.iter().map(|f| f * scene * 0.999).collect();
        starts.sort_by(f64::total_cmp);
        let cues = starts
            .into_iter()
            .map(|start| Cue::new("caption_white", "line", start))
            .collect();
        (cues, scene)
    })
}

proptest! {
    #[test]
    fn merge_never_adds_lines(text in caption_text(), threshold in 0usize..30) {
        let merged = merge_short_lines(&text, threshold);
        prop_assert!(merged.split('\n').count() <= text.split('\n').count());
    }

    #[test]
    fn merge_preserves_characters(text in caption_text(), threshold in 0usize..30) {
        let merged = merge_short_lines(&text, threshold);
        prop_assert_eq!(merged.replace('\n', ""), text.replace('\n', ""));
    }

    #[test]
    fn font_size_stays_within_bounds(
        text in caption_text(),
        base_size in 1u32..400,
        target_width in 0u32..4000,
    ) {
        let size = optimize_font_size(&text, base_size, target_width);
        prop_assert!(size >= 1);
        prop_assert!(size <= base_size);
    }

    #[test]
    fn well_formed_cues_resolve_inside_scene((cues, scene) in well_formed_cues()) {
        let timings = resolve_all(&cues, scene);
        prop_assert_eq!(timings.len(), cues.len());
        for timing in &timings {
            prop_assert!(timing.duration_secs >= 0.0);
            prop_assert!(!timing.clamped);
            prop_assert!(timing.start_secs >= 0.0);
            prop_assert!(timing.end_secs() <= scene + 1e-9);
        }
    }

    #[test]
    fn arbitrary_cues_never_go_negative(
        starts in prop::collection::vec(0.0f64..50.0, 0..10),
        scene in 0.1f64..50.0,
    ) {
        let cues: Vec<Cue> = starts
            .into_iter()
            .map(|start| Cue::new("caption_white", "line", start))
            .collect();
        for timing in resolve_all(&cues, scene) {
            prop_assert!(timing.duration_secs >= 0.0);
            if timing.clamped {
                prop_assert_eq!(timing.duration_secs, MIN_CUE_DURATION_SECS);
            }
        }
    }

    #[test]
    fn resolution_is_deterministic((cues, scene) in well_formed_cues()) {
        prop_assert_eq!(resolve_all(&cues, scene), resolve_all(&cues, scene));
    }
}
