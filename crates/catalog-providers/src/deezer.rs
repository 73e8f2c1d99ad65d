mod parser;

use crate::{CatalogApi, CatalogError, CatalogTrack, CollectionInfo, PlaylistId};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

pub use parser::ParseError;

pub const DEEZER_API_BASE: &str = "https://api.deezer.com";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

pub struct DeezerClient {
    client: Client,
    api_base: String,
}

impl DeezerClient {
    pub fn create(api_base: &str) -> Self {
        Self::with_timeout(api_base, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(api_base: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP Client");

        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    async fn get_text(&self, url: String, query: Option<&PageQuery>) -> Result<String, CatalogError> {
        let mut request = self.client.get(&url);
        if let Some(query) = query {
            request = request.query(query);
        }

        let raw_json = request.send().await?.error_for_status()?.text().await?;

        Ok(raw_json)
    }
}

impl Default for DeezerClient {
    fn default() -> Self {
        Self::create(DEEZER_API_BASE)
    }
}

#[derive(Serialize)]
struct PageQuery {
    limit: usize,
    index: usize,
}

#[async_trait]
impl CatalogApi for DeezerClient {
    async fn fetch_collection_info(
        &self,
        playlist_id: &PlaylistId,
    ) -> Result<CollectionInfo, CatalogError> {
        debug!(%playlist_id, "Fetching playlist metadata...");

        let raw_json = self
            .get_text(format!("{}/playlist/{}", self.api_base, playlist_id), None)
            .await?;

        Ok(parser::parse_collection_info(&raw_json)?)
    }

    async fn fetch_tracks_page(
        &self,
        playlist_id: &PlaylistId,
        index: usize,
        limit: usize,
    ) -> Result<Vec<CatalogTrack>, CatalogError> {
        debug!(%playlist_id, index, limit, "Fetching playlist tracks page...");

        let raw_json = self
            .get_text(
                format!("{}/playlist/{}/tracks", self.api_base, playlist_id),
                Some(&PageQuery { limit, index }),
            )
            .await?;

        Ok(parser::parse_tracks_page(&raw_json)?)
    }
}
