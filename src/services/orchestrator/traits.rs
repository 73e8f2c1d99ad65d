use super::types::TrackState;
use async_trait::async_trait;
use catalog_providers::TrackId;
use download_engine::{DownloadError, DownloadEvent, DownloadJob};
use search_providers::MatchCandidate;
use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedSender;

#[async_trait]
pub(crate) trait TrackMatcher {
    async fn find_match(&self, title: &str, artist: &str) -> Option<MatchCandidate>;
}

#[async_trait]
pub(crate) trait MediaDownloader {
    /// Runs one job to completion. Every event for the job goes through
    /// `events`, including the terminal one.
    async fn download(
        &self,
        job: &DownloadJob,
        events: &UnboundedSender<DownloadEvent>,
    ) -> Result<PathBuf, DownloadError>;

    fn cancel(&self) -> bool;
}

pub(crate) trait Presenter {
    fn track_updated(&self, track_id: &TrackId, state: &TrackState);
    fn download_event(&self, event: &DownloadEvent);
}
