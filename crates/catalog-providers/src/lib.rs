mod deezer;
mod resolver;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ops::Deref;

pub use deezer::*;
pub use resolver::*;

#[derive(Eq, PartialEq, Clone, Hash, Debug, Serialize, Deserialize)]
pub struct PlaylistId(pub(crate) u64);

impl Into<PlaylistId> for u64 {
    fn into(self) -> PlaylistId {
        PlaylistId(self)
    }
}

impl Deref for PlaylistId {
    type Target = u64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Eq, PartialEq, Clone, Hash, Debug, Serialize, Deserialize)]
pub struct TrackId(pub(crate) u64);

impl Into<TrackId> for u64 {
    fn into(self) -> TrackId {
        TrackId(self)
    }
}

impl Deref for TrackId {
    type Target = u64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct CatalogTrack {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration_seconds: u32,
}

/// Aggregate playlist metadata as returned by the base metadata endpoint.
#[derive(Debug, PartialEq, Clone)]
pub struct CollectionInfo {
    pub id: PlaylistId,
    pub title: String,
    pub description: String,
    pub expected_track_count: usize,
    pub cover_url: String,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct CatalogCollection {
    pub id: PlaylistId,
    pub title: String,
    pub description: String,
    pub expected_track_count: usize,
    pub cover_url: String,
    pub tracks: Vec<CatalogTrack>,
}

impl CatalogCollection {
    pub fn from_info(info: CollectionInfo, tracks: Vec<CatalogTrack>) -> Self {
        Self {
            id: info.id,
            title: info.title,
            description: info.description,
            expected_track_count: info.expected_track_count,
            cover_url: info.cover_url,
            tracks,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Playlist reference is not recognized: {0}")]
    NotFound(String),
    #[error("Catalog API error: {0}")]
    Upstream(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(error: reqwest::Error) -> Self {
        CatalogError::Upstream(error.to_string())
    }
}

/// Upstream catalog endpoints consumed by [`CatalogResolver`].
#[async_trait]
pub trait CatalogApi {
    async fn fetch_collection_info(
        &self,
        playlist_id: &PlaylistId,
    ) -> Result<CollectionInfo, CatalogError>;

    async fn fetch_tracks_page(
        &self,
        playlist_id: &PlaylistId,
        index: usize,
        limit: usize,
    ) -> Result<Vec<CatalogTrack>, CatalogError>;
}
