use crate::{DownloadJob, EngineConfig, OutputFormat, DEFAULT_FFMPEG_PATH};
use std::path::Path;

const DEFAULT_AUDIO_QUALITY: &str = "0";
const MP4_FORMAT_SELECTOR: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best";

/// Builds the yt-dlp command line for a single job.
pub fn build_args(job: &DownloadJob, base_name: &str, config: &EngineConfig) -> Vec<String> {
    let output_template = job
        .options
        .output_dir
        .join(format!("{}.%(ext)s", base_name));

    let mut args = vec![
        job.source_url.clone(),
        "-o".to_string(),
        output_template.to_string_lossy().to_string(),
        "--no-playlist".to_string(),
        "--progress".to_string(),
        "--newline".to_string(),
    ];

    match job.options.format {
        OutputFormat::Mp3 => {
            let quality = match job.options.quality.as_str() {
                "" => DEFAULT_AUDIO_QUALITY,
                quality => quality,
            };
            args.extend([
                "-x".to_string(),
                "--audio-format".to_string(),
                "mp3".to_string(),
                "--audio-quality".to_string(),
                quality.to_string(),
                "--embed-thumbnail".to_string(),
                "--add-metadata".to_string(),
            ]);
        }
        OutputFormat::Mp4 => {
            args.extend([
                "-f".to_string(),
                MP4_FORMAT_SELECTOR.to_string(),
                "--merge-output-format".to_string(),
                "mp4".to_string(),
            ]);
        }
        OutputFormat::Best => {
            args.extend(["-f".to_string(), "best".to_string()]);
        }
    }

    if config.ffmpeg_path != Path::new(DEFAULT_FFMPEG_PATH) {
        args.push("--ffmpeg-location".to_string());
        args.push(config.ffmpeg_path.to_string_lossy().to_string());
    }

    args
}
