//! Caption style sheet.
//!
//! A style sheet maps style ids to text styles and preserves declaration
//! order, so "the first declared style" is well defined.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::project::ProjectError;

/// Visual parameters for one caption style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Maximum font size in pixels. Layout only ever shrinks from here.
    pub fontsize: u32,

    /// Font name or font file.
    pub font: String,

    /// Text color, passed through to the renderer.
    pub color: String,

    /// Optional box fill drawn behind the text.
    #[serde(default)]
    pub bg_color: Option<String>,

    /// Optional outline color.
    #[serde(default)]
    pub stroke_color: Option<String>,

    /// Outline width in pixels.
    #[serde(default)]
    pub stroke_width: f64,
}

/// Which tier of style lookup produced a style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleSource {
    /// The cue's style id was found.
    Exact,
    /// The cue's style id was unknown; the configured default id was used.
    ConfiguredDefault,
    /// Neither id was known; the first declared style was used.
    FirstDeclared,
}

/// Result of resolving a style id against a sheet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedStyle<'a> {
    /// Id of the style actually used.
    pub id: &'a str,
    pub style: &'a TextStyle,
    pub source: StyleSource,
}

/// Mapping from style id to [`TextStyle`], in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleSheet {
    entries: IndexMap<String, TextStyle>,
}

impl StyleSheet {
    /// Build a sheet from `(id, style)` pairs, keeping their order.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, TextStyle)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Load and validate a style sheet document.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ProjectError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let sheet: StyleSheet =
            serde_json::from_str(&json).map_err(|e| ProjectError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;
        sheet.validate()?;
        Ok(sheet)
    }

    /// Check the sheet invariants: non-empty, sane sizes and strokes.
    pub fn validate(&self) -> Result<(), ProjectError> {
        if self.entries.is_empty() {
            return Err(ProjectError::validation(
                "style sheet must declare at least one style",
            ));
        }
        for (id, style) in &self.entries {
            if style.fontsize == 0 {
                return Err(ProjectError::validation(format!(
                    "style '{id}': fontsize must be at least 1"
                )));
            }
            if !style.stroke_width.is_finite() || style.stroke_width < 0.0 {
                return Err(ProjectError::validation(format!(
                    "style '{id}': stroke_width must be a non-negative number"
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&TextStyle> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Resolve `id`: exact match, else `default_id`, else the first declared
    /// entry. Returns `None` only for an empty sheet.
    pub fn resolve<'a>(&'a self, id: &str, default_id: &str) -> Option<ResolvedStyle<'a>> {
        if let Some((key, style)) = self.entries.get_key_value(id) {
            return Some(ResolvedStyle {
                id: key,
                style,
                source: StyleSource::Exact,
            });
        }
        if let Some((key, style)) = self.entries.get_key_value(default_id) {
            return Some(ResolvedStyle {
                id: key,
                style,
                source: StyleSource::ConfiguredDefault,
            });
        }
        self.entries.first().map(|(key, style)| ResolvedStyle {
            id: key,
            style,
            source: StyleSource::FirstDeclared,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = r##"{
        "title_red": {"fontsize": 90, "font": "meiryob.ttc", "color": "red", "stroke_color": "white", "stroke_width": 4},
        "caption_white": {"fontsize": 70, "font": "meiryo.ttc", "color": "white", "bg_color": "#000000"}
    }"##;

    fn sheet() -> StyleSheet {
        serde_json::from_str(SHEET).unwrap()
    }

    #[test]
    fn test_declaration_order_is_preserved() {
        let sheet = sheet();
        let ids: Vec<&str> = sheet.ids().collect();
        assert_eq!(ids, vec!["title_red", "caption_white"]);
    }

    #[test]
    fn test_optional_fields_default() {
        let sheet = sheet();
        let caption = sheet.get("caption_white").unwrap();
        assert_eq!(caption.bg_color.as_deref(), Some("#000000"));
        assert!(caption.stroke_color.is_none());
        assert_eq!(caption.stroke_width, 0.0);
    }

    #[test]
    fn test_resolve_exact() {
        let sheet = sheet();
        let resolved = sheet.resolve("title_red", "caption_white").unwrap();
        assert_eq!(resolved.id, "title_red");
        assert_eq!(resolved.source, StyleSource::Exact);
    }

    #[test]
    fn test_resolve_unknown_falls_back_to_configured_default() {
        let sheet = sheet();
        let resolved = sheet.resolve("missing", "caption_white").unwrap();
        assert_eq!(resolved.id, "caption_white");
        assert_eq!(resolved.source, StyleSource::ConfiguredDefault);
        assert_eq!(resolved.style.fontsize, 70);
    }

    #[test]
    fn test_resolve_unknown_default_falls_back_to_first_declared() {
        let sheet = sheet();
        let resolved = sheet.resolve("missing", "also_missing").unwrap();
        assert_eq!(resolved.id, "title_red");
        assert_eq!(resolved.source, StyleSource::FirstDeclared);
    }

    #[test]
    fn test_empty_sheet_is_invalid() {
        let sheet: StyleSheet = serde_json::from_str("{}").unwrap();
        assert!(sheet.resolve("any", "any").is_none());
        assert!(matches!(
            sheet.validate(),
            Err(ProjectError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_zero_fontsize_is_invalid() {
        let sheet: StyleSheet =
            serde_json::from_str(r#"{"s": {"fontsize": 0, "font": "f", "color": "white"}}"#)
                .unwrap();
        assert!(sheet.validate().is_err());
    }

    #[test]
    fn test_load_from_disk() {
        let dir = std::env::temp_dir().join("storyreel_test_style_load");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("styles.json");
        std::fs::write(&path, SHEET).unwrap();

        let sheet = StyleSheet::load(&path).unwrap();
        assert_eq!(sheet.len(), 2);

        std::fs::remove_dir_all(&dir).ok();
    }
}
