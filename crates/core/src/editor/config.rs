//! Configuration for the editor module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the FFmpeg-based editor.
///
/// Visual parameters (trim offset, overlay positions, caption) are
/// configuration, not hard-coded behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Path to ffprobe binary.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    /// Duration removed from the end of the source media, in seconds.
    #[serde(default = "default_trim_secs")]
    pub trim_secs: f64,

    /// Watermark image overlaid at two fixed positions.
    #[serde(default = "default_watermark_path")]
    pub watermark_path: PathBuf,

    /// Font used to render the caption.
    #[serde(default = "default_font_path")]
    pub font_path: PathBuf,

    /// Caption string rendered with a drop shadow.
    #[serde(default = "default_caption_text")]
    pub caption_text: String,

    /// Caption font size in points.
    #[serde(default = "default_caption_size")]
    pub caption_size: u32,

    /// Horizontal margin of the left watermark, in pixels.
    #[serde(default = "default_overlay_margin")]
    pub overlay_margin: u32,

    /// Vertical offset of the right watermark below center, in pixels.
    #[serde(default = "default_overlay_v_offset")]
    pub overlay_v_offset: u32,

    /// Timeout for a single edit job in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info,
    /// verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub ffmpeg_log_level: String,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_trim_secs() -> f64 {
    4.5
}

fn default_watermark_path() -> PathBuf {
    PathBuf::from("assets/watermark.png")
}

fn default_font_path() -> PathBuf {
    PathBuf::from("assets/caption.ttf")
}

fn default_caption_text() -> String {
    "Follow for daily clips".to_string()
}

fn default_caption_size() -> u32 {
    48
}

fn default_overlay_margin() -> u32 {
    40
}

fn default_overlay_v_offset() -> u32 {
    120
}

fn default_timeout() -> u64 {
    1800 // 30 minutes
}

fn default_log_level() -> String {
    "warning".to_string()
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            trim_secs: default_trim_secs(),
            watermark_path: default_watermark_path(),
            font_path: default_font_path(),
            caption_text: default_caption_text(),
            caption_size: default_caption_size(),
            overlay_margin: default_overlay_margin(),
            overlay_v_offset: default_overlay_v_offset(),
            timeout_secs: default_timeout(),
            ffmpeg_log_level: default_log_level(),
        }
    }
}

impl EditorConfig {
    /// Creates a new config with custom ffmpeg/ffprobe paths.
    pub fn with_paths(ffmpeg_path: PathBuf, ffprobe_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
            ..Default::default()
        }
    }

    /// Sets the trim offset in seconds.
    pub fn with_trim_secs(mut self, trim_secs: f64) -> Self {
        self.trim_secs = trim_secs;
        self
    }

    /// Sets the watermark and font asset paths.
    pub fn with_assets(mut self, watermark_path: PathBuf, font_path: PathBuf) -> Self {
        self.watermark_path = watermark_path;
        self.font_path = font_path;
        self
    }

    /// Sets the caption text.
    pub fn with_caption(mut self, caption_text: impl Into<String>) -> Self {
        self.caption_text = caption_text.into();
        self
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert_eq!(config.ffprobe_path, PathBuf::from("ffprobe"));
        assert!((config.trim_secs - 4.5).abs() < f64::EPSILON);
        assert_eq!(config.timeout_secs, 1800);
    }

    #[test]
    fn test_config_builder() {
        let config = EditorConfig::with_paths(
            PathBuf::from("/usr/local/bin/ffmpeg"),
            PathBuf::from("/usr/local/bin/ffprobe"),
        )
        .with_trim_secs(2.0)
        .with_caption("hello")
        .with_timeout(60);

        assert_eq!(config.ffmpeg_path, PathBuf::from("/usr/local/bin/ffmpeg"));
        assert!((config.trim_secs - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.caption_text, "hello");
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_config_serialization() {
        let config = EditorConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: EditorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.caption_text, config.caption_text);
    }
}
