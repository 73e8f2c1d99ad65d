use download_engine::{DownloadOptions, OutputFormat};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs::create_dir_all;
use tokio::io::AsyncWriteExt;
use tracing::warn;

pub(crate) const OUTPUT_DIR_KEY: &str = "output_dir";
pub(crate) const FORMAT_KEY: &str = "format";
pub(crate) const QUALITY_KEY: &str = "quality";

#[derive(Debug, thiserror::Error)]
pub(crate) enum SettingsError {
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Key/value settings persisted as one file per key.
pub(crate) struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub(crate) fn create(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub(crate) async fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        let path = self.key_path(key)?;

        match tokio::fs::read_to_string(path).await {
            Ok(value) => Ok(Some(value)),
            Err(error) if matches!(error.kind(), std::io::ErrorKind::NotFound) => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    pub(crate) async fn get_all(&self) -> Result<HashMap<String, String>, SettingsError> {
        let mut map = HashMap::new();

        let mut dir_reader = match tokio::fs::read_dir(&self.path).await {
            Ok(reader) => reader,
            Err(_) => return Ok(HashMap::new()),
        };

        while let Some(entry) = dir_reader.next_entry().await? {
            let key = entry.file_name().to_str().unwrap_or_default().to_string();
            if !is_valid_key(&key) {
                continue;
            }
            let value = tokio::fs::read_to_string(entry.path()).await?;
            map.insert(key, value);
        }

        Ok(map)
    }

    pub(crate) async fn save(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        let path = self.key_path(key)?;

        create_dir_all(&self.path).await?;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .await?;

        file.write_all(value.as_bytes()).await?;

        Ok(())
    }

    pub(crate) async fn delete(&self, key: &str) -> Result<(), SettingsError> {
        let path = self.key_path(key)?;

        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(error) if matches!(error.kind(), std::io::ErrorKind::NotFound) => Ok(()),
            Err(error) => Err(error.into()),
        }
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, SettingsError> {
        if !is_valid_key(key) {
            return Err(SettingsError::InvalidKey(key.to_string()));
        }

        Ok(self.path.join(key))
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Layers stored settings over the configured defaults. Unparsable formats
/// keep the default.
pub(crate) fn apply_overrides(
    defaults: DownloadOptions,
    settings: &HashMap<String, String>,
) -> DownloadOptions {
    let mut options = defaults;

    if let Some(output_dir) = settings.get(OUTPUT_DIR_KEY) {
        options.output_dir = PathBuf::from(output_dir.trim());
    }

    if let Some(format) = settings.get(FORMAT_KEY) {
        match format.parse::<OutputFormat>() {
            Ok(format) => options.format = format,
            Err(error) => warn!(?error, "Stored format ignored"),
        }
    }

    if let Some(quality) = settings.get(QUALITY_KEY) {
        options.quality = quality.trim().to_string();
    }

    options
}
