//! ffmpeg input and filter graph construction for a [`ProjectTimeline`].
//!
//! Each segment becomes one video chain and one audio chain:
//!
//! ```text
//! color (bg) ─────────────┐
//!                         ├── overlay (centered) ── drawtext… ── trim ──> [vN]
//! image ── scale / zoom ──┘
//! narration | anullsrc ── aformat ── apad ── atrim ───────────────────> [aN]
//! ```
//!
//! The segment pairs are concatenated, and the music bed is mixed under the
//! concatenated narration when present.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use storyreel_project_model::color::Rgb;
use storyreel_project_model::scene::{Anchor, AnchorKeyword};

use crate::timeline::{ProjectTimeline, ResolvedCue, SceneComposition};

const AUDIO_SAMPLE_RATE: u32 = 44_100;
const AUDIO_FORMAT: &str = "aformat=sample_fmts=fltp:channel_layouts=stereo";
const CAPTION_BOX_BORDER_PX: u32 = 10;

/// Output pad labels of the final graph.
pub const VIDEO_OUT: &str = "vout";
pub const AUDIO_OUT: &str = "aout";

/// One ffmpeg input.
#[derive(Debug, Clone, PartialEq)]
pub enum InputSpec {
    /// Still image repeated for `duration_secs`.
    LoopedImage { path: PathBuf, duration_secs: f64 },
    /// Any decodable audio file.
    Audio { path: PathBuf },
    /// Generated silence lasting `duration_secs`.
    Silence { duration_secs: f64 },
}

impl InputSpec {
    /// Command-line arguments declaring this input.
    pub fn to_args(&self) -> Vec<String> {
        match self {
            InputSpec::LoopedImage {
                path,
                duration_secs,
            } => vec![
                "-loop".to_string(),
                "1".to_string(),
                "-t".to_string(),
                secs(*duration_secs),
                "-i".to_string(),
                path_arg(path),
            ],
            InputSpec::Audio { path } => vec!["-i".to_string(), path_arg(path)],
            InputSpec::Silence { duration_secs } => vec![
                "-f".to_string(),
                "lavfi".to_string(),
                "-t".to_string(),
                secs(*duration_secs),
                "-i".to_string(),
                format!("anullsrc=channel_layout=stereo:sample_rate={AUDIO_SAMPLE_RATE}"),
            ],
        }
    }
}

/// Inputs plus the `-filter_complex` graph wiring them together.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterPlan {
    pub inputs: Vec<InputSpec>,
    pub graph: String,
}

impl FilterPlan {
    /// Input, graph, and stream mapping arguments, in that order.
    pub fn to_args(&self) -> Vec<String> {
        let mut args: Vec<String> = self.inputs.iter().flat_map(InputSpec::to_args).collect();
        args.extend([
            "-filter_complex".to_string(),
            self.graph.clone(),
            "-map".to_string(),
            format!("[{VIDEO_OUT}]"),
            "-map".to_string(),
            format!("[{AUDIO_OUT}]"),
        ]);
        args
    }
}

/// Build the inputs and filter graph rendering `timeline`.
pub fn build_filter_plan(timeline: &ProjectTimeline) -> FilterPlan {
    let mut inputs = Vec::new();
    let mut chains = Vec::new();
    let mut concat_pads = String::new();
    let mut segment_count = 0usize;

    for (index, segment) in timeline.segments().enumerate() {
        let image_input = segment.image().map(|image| {
            inputs.push(InputSpec::LoopedImage {
                path: image.path.clone(),
                duration_secs: segment.duration_secs,
            });
            inputs.len() - 1
        });

        inputs.push(match &segment.audio {
            Some(path) => InputSpec::Audio { path: path.clone() },
            None => InputSpec::Silence {
                duration_secs: segment.duration_secs,
            },
        });
        let audio_input = inputs.len() - 1;

        chains.push(video_chain(timeline, segment, index, image_input));
        chains.push(audio_chain(segment.duration_secs, index, audio_input));
        let _ = write!(concat_pads, "[v{index}][a{index}]");
        segment_count += 1;
    }

    let music_input = timeline.audio.music.as_ref().map(|music| {
        inputs.push(InputSpec::Audio {
            path: music.path.clone(),
        });
        (inputs.len() - 1, music.volume, music.duration_secs)
    });

    let concat_audio = if music_input.is_some() {
        "narration"
    } else {
        AUDIO_OUT
    };
    chains.push(format!(
        "{concat_pads}concat=n={segment_count}:v=1:a=1[{VIDEO_OUT}][{concat_audio}]"
    ));

    if let Some((input, volume, duration_secs)) = music_input {
        chains.push(format!(
            "[{input}:a]volume={volume:.3},aresample={AUDIO_SAMPLE_RATE},{AUDIO_FORMAT},apad,atrim=0:{end},asetpts=PTS-STARTPTS[music]",
            end = secs(duration_secs),
        ));
        chains.push(format!(
            "[narration][music]amix=inputs=2:duration=first:normalize=0[{AUDIO_OUT}]"
        ));
    }

    FilterPlan {
        inputs,
        graph: chains.join(";"),
    }
}

fn video_chain(
    timeline: &ProjectTimeline,
    segment: &SceneComposition,
    index: usize,
    image_input: Option<usize>,
) -> String {
    let duration = secs(segment.duration_secs);
    let (color, width, height) = match segment.background() {
        Some(bg) => (bg.color, bg.width, bg.height),
        None => (Rgb::BLACK, timeline.width, timeline.height),
    };

    let mut chain = format!(
        "color=c={}:s={width}x{height}:r={fps}:d={duration}[bg{index}];",
        color.to_ffmpeg(),
        fps = timeline.fps,
    );

    match (segment.image(), image_input) {
        (Some(image), Some(input)) => {
            let scale = match image.zoom {
                Some(zoom) => format!(
                    "scale=w='trunc({w}*({s0:.6}+{rate:.6}*t)/2)*2':h=-2:eval=frame",
                    w = image.width,
                    s0 = zoom.start_scale,
                    rate = zoom.rate_per_sec(),
                ),
                None => format!("scale={}:-2", image.width),
            };
            let _ = write!(
                chain,
                "[{input}:v]{scale},format=rgba[img{index}];\
                 [bg{index}][img{index}]overlay=x=(W-w)/2:y=(H-h)/2:eval=frame:shortest=1"
            );
        }
        _ => {
            let _ = write!(chain, "[bg{index}]null");
        }
    }

    for cue in segment.text_overlays() {
        chain.push(',');
        chain.push_str(&drawtext(cue));
    }

    let _ = write!(
        chain,
        ",fps={fps},trim=duration={duration},setpts=PTS-STARTPTS,format=yuv420p[v{index}]",
        fps = timeline.fps,
    );
    chain
}

fn audio_chain(duration_secs: f64, index: usize, input: usize) -> String {
    format!(
        "[{input}:a]aresample={AUDIO_SAMPLE_RATE},{AUDIO_FORMAT},apad,atrim=0:{end},asetpts=PTS-STARTPTS[a{index}]",
        end = secs(duration_secs),
    )
}

/// A `drawtext` filter rendering one caption inside its display window.
pub fn drawtext(cue: &ResolvedCue) -> String {
    let style = &cue.style;
    let font_key = if is_font_file(&style.font) {
        "fontfile"
    } else {
        "font"
    };

    let mut options = vec![
        format!("text={}", escape_value(&cue.text)),
        "expansion=none".to_string(),
        format!("{font_key}={}", escape_value(&style.font)),
        format!("fontsize={}", cue.font_size),
        format!("fontcolor={}", color_value(&style.color)),
        format!("x={}", escape_value(&anchor_expr(cue.position.x(), Axis::X))),
        format!("y={}", escape_value(&anchor_expr(cue.position.y(), Axis::Y))),
    ];

    if let Some(bg) = &style.bg_color {
        options.push("box=1".to_string());
        options.push(format!("boxcolor={}", color_value(bg)));
        options.push(format!("boxborderw={CAPTION_BOX_BORDER_PX}"));
    }

    if style.stroke_width > 0.0 {
        if let Some(stroke) = &style.stroke_color {
            options.push(format!("borderw={}", style.stroke_width.round() as u32));
            options.push(format!("bordercolor={}", color_value(stroke)));
        }
    }

    options.push(format!(
        "enable={}",
        escape_value(&format!(
            "gte(t,{})*lt(t,{})",
            secs(cue.start_secs),
            secs(cue.end_secs())
        ))
    ));

    format!("drawtext={}", options.join(":"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

/// drawtext position expression for one anchor.
fn anchor_expr(anchor: Anchor, axis: Axis) -> String {
    let (extent, text_extent) = match axis {
        Axis::X => ("w", "text_w"),
        Axis::Y => ("h", "text_h"),
    };
    match anchor {
        Anchor::Pixels(px) => format!("{px:.0}"),
        Anchor::Keyword(AnchorKeyword::Center) => format!("({extent}-{text_extent})/2"),
        Anchor::Keyword(AnchorKeyword::Left | AnchorKeyword::Top) => "0".to_string(),
        Anchor::Keyword(AnchorKeyword::Right | AnchorKeyword::Bottom) => {
            format!("{extent}-{text_extent}")
        }
    }
}

fn color_value(raw: &str) -> String {
    match Rgb::parse_str(raw) {
        Ok(rgb) => rgb.to_ffmpeg(),
        Err(_) => escape_value(raw.trim()),
    }
}

fn is_font_file(font: &str) -> bool {
    let path = Path::new(font);
    font.contains(['/', '\\'])
        || path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "ttf" | "ttc" | "otf"))
            .unwrap_or(false)
}

/// Escape a filter option value for use inside a filter graph.
///
/// Two levels: option values escape `\ ' :`, then the graph escapes
/// `\ ' [ ] , ;`.
pub fn escape_value(raw: &str) -> String {
    escape_chars(&escape_chars(raw, &['\\', '\'', ':']), &['\\', '\'', '[', ']', ',', ';'])
}

fn escape_chars(raw: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn secs(value: f64) -> String {
    format!("{value:.3}")
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use storyreel_layout_core::cue_timing::DurationSource;
    use storyreel_layout_core::ZoomCurve;
    use storyreel_project_model::scene::Position;
    use storyreel_project_model::style::{StyleSource, TextStyle};

    use crate::timeline::{
        AudioMix, BackgroundLayer, ImageLayer, Layer, MusicBed, ResolvedCue,
    };

    fn cue(text: &str, start: f64, duration: f64) -> ResolvedCue {
        ResolvedCue {
            cue_index: 0,
            start_secs: start,
            duration_secs: duration,
            duration_source: DurationSource::UntilSceneEnd,
            clamped: false,
            text: text.to_string(),
            font_size: 64,
            box_width: 972,
            position: Position::CENTER,
            style_id: "caption_white".to_string(),
            style_source: StyleSource::Exact,
            style: TextStyle {
                fontsize: 70,
                font: "/fonts/meiryo.ttc".to_string(),
                color: "white".to_string(),
                bg_color: Some("#000000".to_string()),
                stroke_color: Some("red".to_string()),
                stroke_width: 3.0,
            },
        }
    }

    fn segment(audio: Option<&str>, zoom: Option<ZoomCurve>, duration: f64) -> SceneComposition {
        SceneComposition {
            scene_index: audio.map(|_| 0),
            layers: vec![
                Layer::Background(BackgroundLayer {
                    color: Rgb::WHITE,
                    width: 1080,
                    height: 1920,
                }),
                Layer::Image(ImageLayer {
                    path: PathBuf::from("/img/001.png"),
                    width: 1080,
                    zoom,
                }),
                Layer::Text(cue("hello\n ", 2.0, 8.0)),
            ],
            duration_secs: duration,
            audio: audio.map(PathBuf::from),
        }
    }

    fn timeline(music: bool) -> ProjectTimeline {
        let scene = segment(Some("/audio/001.wav"), Some(ZoomCurve::zoom_in(10.0)), 10.0);
        let mut still = segment(None, None, 0.5);
        still.layers.truncate(2);
        ProjectTimeline {
            width: 1080,
            height: 1920,
            fps: 30,
            scenes: vec![scene],
            trailing_still: Some(still),
            audio: AudioMix {
                narration: Vec::new(),
                music: music.then(|| MusicBed {
                    path: PathBuf::from("/bgm/theme.mp3"),
                    volume: 0.2,
                    duration_secs: 10.5,
                }),
                duration_secs: 10.5,
            },
            output_path: PathBuf::from("/out/output_shorts.mp4"),
            skipped: Vec::new(),
        }
    }

    #[test]
    fn test_escape_value_two_levels() {
        assert_eq!(
            escape_value("this is a 'string': may contain one, or more, special characters"),
            r"this is a \\\'string\\\'\\: may contain one\, or more\, special characters"
        );
        assert_eq!(escape_value("[x];y"), r"\[x\]\;y");
    }

    #[test]
    fn test_anchor_expressions() {
        assert_eq!(
            anchor_expr(Anchor::Keyword(AnchorKeyword::Center), Axis::X),
            "(w-text_w)/2"
        );
        assert_eq!(anchor_expr(Anchor::Keyword(AnchorKeyword::Top), Axis::Y), "0");
        assert_eq!(
            anchor_expr(Anchor::Keyword(AnchorKeyword::Bottom), Axis::Y),
            "h-text_h"
        );
        assert_eq!(anchor_expr(Anchor::Pixels(120.0), Axis::X), "120");
    }

    #[test]
    fn test_drawtext_window_and_style() {
        let filter = drawtext(&cue("hi", 2.0, 3.0));
        assert!(filter.starts_with("drawtext=text=hi:expansion=none:"));
        assert!(filter.contains("fontfile=/fonts/meiryo.ttc"));
        assert!(filter.contains("fontsize=64"));
        assert!(filter.contains("fontcolor=0xFFFFFF"));
        assert!(filter.contains("boxcolor=0x000000"));
        assert!(filter.contains("borderw=3:bordercolor=0xFF0000"));
        assert!(filter.ends_with(r"enable=gte(t\,2.000)*lt(t\,5.000)"));
    }

    #[test]
    fn test_back_to_back_cues_do_not_share_a_frame() {
        let first = drawtext(&cue("one", 1.0, 3.0));
        let second = drawtext(&cue("two", 4.0, 2.0));
        assert!(first.ends_with(r"lt(t\,4.000)"));
        assert!(second.contains(r"enable=gte(t\,4.000)"));
        assert!(!first.contains("between"));
    }

    #[test]
    fn test_drawtext_named_font_uses_fontconfig() {
        let mut c = cue("hi", 0.0, 1.0);
        c.style.font = "Noto Sans CJK JP".to_string();
        c.style.bg_color = None;
        c.style.stroke_width = 0.0;
        let filter = drawtext(&c);
        assert!(filter.contains("font=Noto Sans CJK JP"));
        assert!(!filter.contains("box=1"));
        assert!(!filter.contains("borderw"));
    }

    #[test]
    fn test_plan_inputs_per_segment() {
        let plan = build_filter_plan(&timeline(false));
        assert_eq!(
            plan.inputs,
            vec![
                InputSpec::LoopedImage {
                    path: PathBuf::from("/img/001.png"),
                    duration_secs: 10.0,
                },
                InputSpec::Audio {
                    path: PathBuf::from("/audio/001.wav"),
                },
                InputSpec::LoopedImage {
                    path: PathBuf::from("/img/001.png"),
                    duration_secs: 0.5,
                },
                InputSpec::Silence { duration_secs: 0.5 },
            ]
        );
    }

    #[test]
    fn test_plan_graph_without_music() {
        let plan = build_filter_plan(&timeline(false));
        assert!(plan
            .graph
            .contains("color=c=0xFFFFFF:s=1080x1920:r=30:d=10.000[bg0]"));
        assert!(plan.graph.contains("eval=frame"));
        assert!(plan.graph.contains("[2:v]scale=1080:-2"));
        assert!(plan.graph.contains("[3:a]aresample=44100"));
        assert!(plan
            .graph
            .ends_with("[v0][a0][v1][a1]concat=n=2:v=1:a=1[vout][aout]"));
    }

    #[test]
    fn test_plan_graph_mixes_music() {
        let plan = build_filter_plan(&timeline(true));
        assert_eq!(plan.inputs.len(), 5);
        assert!(plan.graph.contains("concat=n=2:v=1:a=1[vout][narration]"));
        assert!(plan.graph.contains("[4:a]volume=0.200"));
        assert!(plan.graph.contains("atrim=0:10.500"));
        assert!(plan
            .graph
            .ends_with("[narration][music]amix=inputs=2:duration=first:normalize=0[aout]"));
    }

    #[test]
    fn test_plan_args_map_outputs() {
        let args = build_filter_plan(&timeline(false)).to_args();
        let map_at = args.iter().position(|a| a == "-map").unwrap();
        assert_eq!(args[map_at + 1], "[vout]");
        assert_eq!(args[map_at + 3], "[aout]");
        assert_eq!(&args[..2], &["-loop".to_string(), "1".to_string()]);
    }
}
