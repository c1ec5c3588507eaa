//! FFmpeg-based editor implementation.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::config::EditorConfig;
use super::error::EditorError;
use super::traits::Editor;
use super::types::{EditJob, EditResult, MediaInfo};

/// FFmpeg-based editor implementation.
pub struct FfmpegEditor {
    config: EditorConfig,
}

impl FfmpegEditor {
    /// Creates a new FFmpeg editor with the given configuration.
    pub fn new(config: EditorConfig) -> Self {
        Self { config }
    }

    /// Creates an editor with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(EditorConfig::default())
    }

    /// Escapes a string for use inside a drawtext filter argument.
    fn escape_drawtext(text: &str) -> String {
        let mut escaped = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '\\' => escaped.push_str("\\\\"),
                '\'' => escaped.push_str("\\'"),
                ':' => escaped.push_str("\\:"),
                '%' => escaped.push_str("\\%"),
                _ => escaped.push(c),
            }
        }
        escaped
    }

    /// Builds the overlay + caption filter graph.
    ///
    /// The watermark (input 1) is split and composited twice: once at
    /// the left edge vertically centered, once right of center with a
    /// vertical offset. The caption is drawn centered near the bottom
    /// with a drop shadow.
    fn build_filter_graph(&self) -> String {
        let margin = self.config.overlay_margin;
        let v_offset = self.config.overlay_v_offset;
        let caption = Self::escape_drawtext(&self.config.caption_text);
        let font = self.config.font_path.to_string_lossy();

        format!(
            "[1:v]split=2[wm_left][wm_right];\
             [0:v][wm_left]overlay=x={margin}:y=(H-h)/2[left_marked];\
             [left_marked][wm_right]overlay=x=W/2+{margin}:y=(H-h)/2+{v_offset}[marked];\
             [marked]drawtext=fontfile='{font}':text='{caption}':\
fontsize={size}:fontcolor=white:shadowcolor=black:shadowx=2:shadowy=2:\
x=(w-text_w)/2:y=h-text_h-{margin}[vout]",
            margin = margin,
            v_offset = v_offset,
            font = font,
            caption = caption,
            size = self.config.caption_size,
        )
    }

    /// Builds ffmpeg arguments for one edit job.
    fn build_edit_args(&self, job: &EditJob, target_duration_secs: f64) -> Vec<String> {
        vec![
            "-y".to_string(), // Overwrite output
            "-i".to_string(),
            job.input_path.to_string_lossy().to_string(),
            "-i".to_string(),
            self.config.watermark_path.to_string_lossy().to_string(),
            "-filter_complex".to_string(),
            self.build_filter_graph(),
            "-map".to_string(),
            "[vout]".to_string(),
            "-map".to_string(),
            "0:a?".to_string(),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            "veryfast".to_string(),
            "-crf".to_string(),
            "23".to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            // Truncates audio and video consistently.
            "-t".to_string(),
            format!("{:.3}", target_duration_secs),
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            job.output_path.to_string_lossy().to_string(),
        ]
    }

    /// Parses ffprobe JSON output into MediaInfo.
    fn parse_probe_output(path: &Path, output: &str) -> Result<MediaInfo, EditorError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: ProbeFormat,
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            format_name: String,
            duration: Option<String>,
            size: Option<String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: String,
            codec_name: Option<String>,
            width: Option<u32>,
            height: Option<u32>,
        }

        let probe: ProbeOutput =
            serde_json::from_str(output).map_err(|e| EditorError::ParseError {
                reason: format!("Failed to parse ffprobe output: {}", e),
            })?;

        let duration_secs = probe
            .format
            .duration
            .as_ref()
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0);

        let size_bytes = probe
            .format
            .size
            .as_ref()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);

        let video_stream = probe.streams.iter().find(|s| s.codec_type == "video");
        let audio_stream = probe.streams.iter().find(|s| s.codec_type == "audio");

        let format_name = probe
            .format
            .format_name
            .split(',')
            .next()
            .unwrap_or("unknown");

        Ok(MediaInfo {
            path: path.to_path_buf(),
            size_bytes,
            duration_secs,
            format: format_name.to_string(),
            video_codec: video_stream.and_then(|s| s.codec_name.clone()),
            video_width: video_stream.and_then(|s| s.width),
            video_height: video_stream.and_then(|s| s.height),
            audio_codec: audio_stream.and_then(|s| s.codec_name.clone()),
        })
    }

    /// Checks that both static assets exist. Runs before any
    /// transcoding work begins.
    fn check_assets(&self) -> Result<(), EditorError> {
        for path in [&self.config.watermark_path, &self.config.font_path] {
            if !path.exists() {
                return Err(EditorError::MissingAsset { path: path.clone() });
            }
        }
        Ok(())
    }

    /// Computes the output duration, rejecting inputs that would be
    /// trimmed to nothing.
    fn target_duration(&self, info: &MediaInfo) -> Result<f64, EditorError> {
        if info.duration_secs <= 0.0 {
            return Err(EditorError::unsupported(
                "duration could not be determined",
            ));
        }
        let target = info.duration_secs - self.config.trim_secs;
        if target <= 0.0 {
            return Err(EditorError::InputTooShort {
                duration_secs: info.duration_secs,
                trim_secs: self.config.trim_secs,
            });
        }
        Ok(target)
    }

    async fn run_ffmpeg(&self, args: &[String]) -> Result<(), EditorError> {
        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EditorError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    EditorError::Io(e)
                }
            })?;

        let mut stderr = child.stderr.take();
        let timeout_duration = Duration::from_secs(self.config.timeout_secs);

        let result = timeout(timeout_duration, async {
            let mut stderr_output = String::new();
            if let Some(ref mut pipe) = stderr {
                let _ = pipe.read_to_string(&mut stderr_output).await;
            }
            let status = child.wait().await?;
            Ok::<(std::process::ExitStatus, String), std::io::Error>((status, stderr_output))
        })
        .await;

        match result {
            Ok(Ok((status, stderr_output))) => {
                if !status.success() {
                    return Err(EditorError::edit_failed(
                        format!("FFmpeg exited with code: {:?}", status.code()),
                        if stderr_output.is_empty() {
                            None
                        } else {
                            Some(stderr_output)
                        },
                    ));
                }
                Ok(())
            }
            Ok(Err(e)) => Err(EditorError::Io(e)),
            Err(_) => {
                // Kill the process on timeout
                let _ = child.kill().await;
                Err(EditorError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                })
            }
        }
    }
}

#[async_trait]
impl Editor for FfmpegEditor {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, EditorError> {
        if !path.exists() {
            return Err(EditorError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let output = Command::new(&self.config.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EditorError::FfprobeNotFound {
                        path: self.config.ffprobe_path.clone(),
                    }
                } else {
                    EditorError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(EditorError::unsupported(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_probe_output(path, &stdout)
    }

    async fn edit(&self, job: EditJob) -> Result<EditResult, EditorError> {
        let start = Instant::now();

        if !job.input_path.exists() {
            return Err(EditorError::InputNotFound {
                path: job.input_path.clone(),
            });
        }

        let info = self
            .probe(&job.input_path)
            .await
            .map_err(|e| match e {
                e @ (EditorError::FfprobeNotFound { .. } | EditorError::Io(_)) => e,
                other => EditorError::unsupported(other.to_string()),
            })?;

        let target_duration_secs = self.target_duration(&info)?;

        // Asset check must precede any transcoding work.
        self.check_assets()?;

        if let Some(parent) = job.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        debug!(
            item_id = %job.item_id,
            duration = info.duration_secs,
            target = target_duration_secs,
            "Editing clip"
        );

        let args = self.build_edit_args(&job, target_duration_secs);
        self.run_ffmpeg(&args).await?;

        // Verify output exists and is non-empty
        let output_meta = tokio::fs::metadata(&job.output_path)
            .await
            .map_err(|_| EditorError::edit_failed("Output file not created", None))?;
        if output_meta.len() == 0 {
            return Err(EditorError::edit_failed("Output file is empty", None));
        }

        Ok(EditResult {
            item_id: job.item_id,
            output_path: job.output_path,
            output_size_bytes: output_meta.len(),
            target_duration_secs,
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn validate(&self) -> Result<(), EditorError> {
        // Check ffmpeg exists
        let ffmpeg_result = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .output()
            .await;

        if let Err(e) = ffmpeg_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(EditorError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                });
            }
            return Err(EditorError::Io(e));
        }

        // Check ffprobe exists
        let ffprobe_result = Command::new(&self.config.ffprobe_path)
            .arg("-version")
            .output()
            .await;

        if let Err(e) = ffprobe_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(EditorError::FfprobeNotFound {
                    path: self.config.ffprobe_path.clone(),
                });
            }
            return Err(EditorError::Io(e));
        }

        self.check_assets()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn editor_with_trim(trim_secs: f64) -> FfmpegEditor {
        FfmpegEditor::new(EditorConfig::default().with_trim_secs(trim_secs))
    }

    fn info_with_duration(duration_secs: f64) -> MediaInfo {
        MediaInfo {
            path: PathBuf::from("/clip.mp4"),
            size_bytes: 1024,
            duration_secs,
            format: "mp4".to_string(),
            video_codec: Some("h264".to_string()),
            video_width: Some(1920),
            video_height: Some(1080),
            audio_codec: Some("aac".to_string()),
        }
    }

    #[test]
    fn test_target_duration_trims_end() {
        // 30 second clip with the default 4.5 second trim offset.
        let editor = editor_with_trim(4.5);
        let target = editor.target_duration(&info_with_duration(30.0)).unwrap();
        assert!((target - 25.5).abs() < 0.001);
    }

    #[test]
    fn test_target_duration_rejects_short_input() {
        let editor = editor_with_trim(4.5);
        let result = editor.target_duration(&info_with_duration(3.0));
        assert!(matches!(result, Err(EditorError::InputTooShort { .. })));

        // Exactly the trim offset is rejected too.
        let result = editor.target_duration(&info_with_duration(4.5));
        assert!(matches!(result, Err(EditorError::InputTooShort { .. })));
    }

    #[test]
    fn test_target_duration_rejects_unknown_duration() {
        let editor = editor_with_trim(4.5);
        let result = editor.target_duration(&info_with_duration(0.0));
        assert!(matches!(result, Err(EditorError::UnsupportedMedia { .. })));
    }

    #[test]
    fn test_build_edit_args() {
        let editor = editor_with_trim(4.5);
        let job = EditJob {
            item_id: "item-1".to_string(),
            input_path: PathBuf::from("/in.mp4"),
            output_path: PathBuf::from("/out.mp4"),
        };

        let args = editor.build_edit_args(&job, 25.5);

        assert!(args.contains(&"-filter_complex".to_string()));
        assert!(args.contains(&"-t".to_string()));
        assert!(args.contains(&"25.500".to_string()));
        assert!(args.contains(&"0:a?".to_string()));
        assert_eq!(args.last().unwrap(), "/out.mp4");
    }

    #[test]
    fn test_filter_graph_has_two_overlays_and_caption() {
        let editor = FfmpegEditor::new(
            EditorConfig::default().with_caption("Follow me: 100% real"),
        );
        let graph = editor.build_filter_graph();

        assert_eq!(graph.matches("overlay=").count(), 2);
        assert!(graph.contains("split=2"));
        assert!(graph.contains("drawtext="));
        assert!(graph.contains("shadowcolor=black"));
        // Left watermark is vertically centered; the right one sits
        // right of center, offset down.
        assert!(graph.contains("overlay=x=40:y=(H-h)/2"));
        assert!(graph.contains("overlay=x=W/2+40:y=(H-h)/2+120"));
        // drawtext special characters are escaped.
        assert!(graph.contains("Follow me\\: 100\\% real"));
    }

    #[test]
    fn test_escape_drawtext() {
        assert_eq!(
            FfmpegEditor::escape_drawtext("it's 50%: a\\b"),
            "it\\'s 50\\%\\: a\\\\b"
        );
    }

    #[test]
    fn test_parse_probe_output() {
        let json = r#"{
            "format": {
                "filename": "clip.mp4",
                "format_name": "mov,mp4,m4a,3gp,3g2,mj2",
                "duration": "30.02",
                "size": "12000000"
            },
            "streams": [
                {
                    "codec_type": "video",
                    "codec_name": "h264",
                    "width": 1920,
                    "height": 1080
                },
                {
                    "codec_type": "audio",
                    "codec_name": "aac"
                }
            ]
        }"#;

        let info = FfmpegEditor::parse_probe_output(Path::new("clip.mp4"), json).unwrap();
        assert_eq!(info.format, "mov");
        assert!((info.duration_secs - 30.02).abs() < 0.001);
        assert_eq!(info.size_bytes, 12000000);
        assert_eq!(info.video_codec, Some("h264".to_string()));
        assert_eq!(info.video_width, Some(1920));
        assert_eq!(info.audio_codec, Some("aac".to_string()));
    }

    #[test]
    fn test_parse_probe_output_without_duration() {
        let json = r#"{
            "format": {
                "filename": "weird.bin",
                "format_name": "bin"
            },
            "streams": []
        }"#;

        let info = FfmpegEditor::parse_probe_output(Path::new("weird.bin"), json).unwrap();
        assert_eq!(info.duration_secs, 0.0);

        let editor = editor_with_trim(4.5);
        assert!(matches!(
            editor.target_duration(&info),
            Err(EditorError::UnsupportedMedia { .. })
        ));
    }

    #[tokio::test]
    async fn test_edit_missing_asset_fails_before_transcode() {
        let temp = tempfile::tempdir().unwrap();
        let input = temp.path().join("in.mp4");
        std::fs::write(&input, b"not really a video").unwrap();

        // Probe will fail on the fake input before the asset check, so
        // point the editor at a real file to exercise the asset path.
        let editor = FfmpegEditor::new(
            EditorConfig::default()
                .with_assets(temp.path().join("missing.png"), temp.path().join("f.ttf")),
        );
        let err = editor.check_assets().unwrap_err();
        assert!(matches!(err, EditorError::MissingAsset { .. }));
    }
}
