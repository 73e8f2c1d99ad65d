use download_engine::{
    DownloadOptions, EngineConfig, OutputFormat, DEFAULT_FFMPEG_PATH, DEFAULT_YTDLP_PATH,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

fn default_bind_address() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30u64
}

fn default_catalog_api_url() -> String {
    catalog_providers::DEEZER_API_BASE.to_string()
}

fn default_ytdlp_path() -> PathBuf {
    PathBuf::from(DEFAULT_YTDLP_PATH)
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from(DEFAULT_FFMPEG_PATH)
}

fn default_search_delay_ms() -> u64 {
    500u64
}

fn default_settings_directory() -> String {
    "data/settings".to_string()
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_download_format() -> String {
    "mp3".to_string()
}

fn default_download_quality() -> String {
    "0".to_string()
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct Config {
    #[serde(default = "default_bind_address")]
    pub(crate) bind_address: String,
    #[serde(default = "default_shutdown_timeout")]
    pub(crate) shutdown_timeout: u64,
    #[serde(default = "default_catalog_api_url")]
    pub(crate) catalog_api_url: String,
    #[serde(default = "default_ytdlp_path")]
    pub(crate) ytdlp_path: PathBuf,
    #[serde(default = "default_ffmpeg_path")]
    pub(crate) ffmpeg_path: PathBuf,
    #[serde(default = "default_search_delay_ms")]
    pub(crate) search_delay_ms: u64,
    #[serde(default = "default_settings_directory")]
    pub(crate) settings_directory: String,
    #[serde(default = "default_output_directory")]
    pub(crate) output_directory: PathBuf,
    #[serde(default = "default_download_format")]
    pub(crate) download_format: String,
    #[serde(default = "default_download_quality")]
    pub(crate) download_quality: String,
}

impl Config {
    pub(crate) fn from_env() -> Self {
        match envy::from_env::<Self>() {
            Ok(config) => config,
            Err(error) => panic!("Invalid environment variable: {:#?}", error),
        }
    }

    pub(crate) fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            ytdlp_path: self.ytdlp_path.clone(),
            ffmpeg_path: self.ffmpeg_path.clone(),
        }
    }

    pub(crate) fn search_delay(&self) -> Duration {
        Duration::from_millis(self.search_delay_ms)
    }

    pub(crate) fn default_download_options(&self) -> DownloadOptions {
        let format = match self.download_format.parse::<OutputFormat>() {
            Ok(format) => format,
            Err(error) => {
                warn!(?error, "Falling back to mp3 output");
                OutputFormat::Mp3
            }
        };

        DownloadOptions {
            output_dir: self.output_directory.clone(),
            format,
            quality: self.download_quality.clone(),
        }
    }
}
