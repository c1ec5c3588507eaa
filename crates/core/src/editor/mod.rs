//! Clip editing: fixed end trim, watermark overlays, caption.
//!
//! The [`Editor`] trait abstracts the transform; [`FfmpegEditor`] is the
//! production implementation driving ffmpeg/ffprobe subprocesses.

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::EditorConfig;
pub use error::EditorError;
pub use ffmpeg::FfmpegEditor;
pub use traits::Editor;
pub use types::{EditJob, EditResult, MediaInfo};
