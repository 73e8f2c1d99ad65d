mod args;
mod engine;
mod filename;
mod scanner;
mod slot;

#[cfg(all(test, unix))]
mod engine_tests;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

pub use args::*;
pub use engine::*;
pub use filename::*;
pub use scanner::*;
pub use slot::*;

pub const DEFAULT_YTDLP_PATH: &str = "yt-dlp";
pub const DEFAULT_FFMPEG_PATH: &str = "ffmpeg";

/// Locations of the external binaries, fixed for the lifetime of an engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub ytdlp_path: PathBuf,
    pub ffmpeg_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: PathBuf::from(DEFAULT_YTDLP_PATH),
            ffmpeg_path: PathBuf::from(DEFAULT_FFMPEG_PATH),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Mp3,
    Mp4,
    Best,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Mp4 | OutputFormat::Best => "mp4",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Mp4 => "mp4",
            OutputFormat::Best => "best",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unsupported output format: {0}")]
pub struct UnknownFormat(String);

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mp3" => Ok(OutputFormat::Mp3),
            "mp4" => Ok(OutputFormat::Mp4),
            "best" => Ok(OutputFormat::Best),
            other => Err(UnknownFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadOptions {
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    /// Passed to the converter untouched.
    pub quality: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadJob {
    pub track_key: String,
    pub artist: String,
    pub title: String,
    pub source_url: String,
    pub options: DownloadOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    Downloading,
    Completed,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadEvent {
    pub track_key: String,
    pub percent: f32,
    pub status: DownloadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
}

impl DownloadEvent {
    pub fn downloading(track_key: &str, percent: f32) -> Self {
        Self {
            track_key: track_key.to_string(),
            percent,
            status: DownloadStatus::Downloading,
            error: None,
            output_path: None,
        }
    }

    pub fn completed(track_key: &str, output_path: PathBuf) -> Self {
        Self {
            track_key: track_key.to_string(),
            percent: 100.0,
            status: DownloadStatus::Completed,
            error: None,
            output_path: Some(output_path),
        }
    }

    pub fn error(track_key: &str, error: String) -> Self {
        Self {
            track_key: track_key.to_string(),
            percent: 0.0,
            status: DownloadStatus::Error,
            error: Some(error),
            output_path: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("Another download is already running")]
    EngineBusy,
    #[error("Unable to create output directory: {0}")]
    CreateOutputDir(#[source] std::io::Error),
    #[error("Unable to start yt-dlp: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("Unable to read yt-dlp output: {0}")]
    Io(#[from] std::io::Error),
    #[error("yt-dlp exited with code {0}")]
    ExitCode(i32),
    #[error("yt-dlp was terminated by a signal")]
    Terminated,
}
