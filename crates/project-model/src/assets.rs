//! Asset base directories and path resolution.

use std::path::{Path, PathBuf};

/// Base directories that relative asset paths are resolved against.
///
/// A `None` directory leaves relative paths relative to the working
/// directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetDirs {
    pub image: Option<PathBuf>,
    pub audio: Option<PathBuf>,
    pub bgm: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

impl AssetDirs {
    pub fn image_path(&self, file: &str) -> PathBuf {
        resolve_path(file, self.image.as_deref())
    }

    pub fn audio_path(&self, file: &str) -> PathBuf {
        resolve_path(file, self.audio.as_deref())
    }

    pub fn bgm_path(&self, file: &str) -> PathBuf {
        resolve_path(file, self.bgm.as_deref())
    }

    pub fn output_path(&self, file: &str) -> PathBuf {
        resolve_path(file, self.output.as_deref())
    }
}

/// Join `file` onto `base` unless `file` is absolute or `base` is absent.
pub fn resolve_path(file: impl AsRef<Path>, base: Option<&Path>) -> PathBuf {
    let file = file.as_ref();
    match base {
        Some(base) if !file.is_absolute() && !base.as_os_str().is_empty() => base.join(file),
        _ => file.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_paths_join_base() {
        let dirs = AssetDirs {
            image: Some(PathBuf::from("assets/img")),
            audio: Some(PathBuf::from("assets/voice")),
            ..AssetDirs::default()
        };
        assert_eq!(dirs.image_path("001.png"), PathBuf::from("assets/img/001.png"));
        assert_eq!(dirs.audio_path("001.wav"), PathBuf::from("assets/voice/001.wav"));
        assert_eq!(dirs.bgm_path("bgm.mp3"), PathBuf::from("bgm.mp3"));
    }

    #[test]
    fn test_absolute_paths_pass_through() {
        let dirs = AssetDirs {
            output: Some(PathBuf::from("out")),
            ..AssetDirs::default()
        };
        assert_eq!(
            dirs.output_path("/tmp/final.mp4"),
            PathBuf::from("/tmp/final.mp4")
        );
    }

    #[test]
    fn test_empty_base_is_ignored() {
        assert_eq!(
            resolve_path("a.png", Some(Path::new(""))),
            PathBuf::from("a.png")
        );
    }
}
