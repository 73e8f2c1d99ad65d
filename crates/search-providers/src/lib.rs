mod resolver;
mod youtube;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ops::Deref;

pub use resolver::*;
pub use youtube::*;

#[derive(Debug, PartialEq, Clone)]
pub struct SearchResult {
    pub video_id: VideoId,
    pub title: String,
    pub channel: String,
    pub duration: String,
}

pub type SearchResults = Vec<SearchResult>;

#[derive(Eq, PartialEq, Clone, Hash, Debug, Serialize, Deserialize)]
pub struct VideoId(pub(crate) String);

impl Into<VideoId> for &str {
    fn into(self) -> VideoId {
        VideoId(self.to_string())
    }
}

impl Deref for VideoId {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A playable substitute for a catalog track.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub video_id: VideoId,
    pub title: String,
    pub channel: String,
    pub duration_label: String,
    pub source_url: String,
}

impl From<SearchResult> for MatchCandidate {
    fn from(result: SearchResult) -> Self {
        let source_url = watch_url(&result.video_id);

        Self {
            video_id: result.video_id,
            title: result.title,
            channel: result.channel,
            duration_label: result.duration,
            source_url,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SearchProviderError {
    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),
    #[error(transparent)]
    ParseError(#[from] ParseError),
}

/// Query string in, ordered video-typed results out.
#[async_trait]
pub trait VideoSearchProvider {
    async fn search_videos(&self, query: &str) -> Result<SearchResults, SearchProviderError>;
}
