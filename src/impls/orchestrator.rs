use crate::services::orchestrator::{MediaDownloader, TrackMatcher};
use async_trait::async_trait;
use download_engine::{DownloadEngine, DownloadError, DownloadEvent, DownloadJob};
use search_providers::{MatchCandidate, MatchResolver};
use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedSender;

#[async_trait]
impl TrackMatcher for MatchResolver {
    async fn find_match(&self, title: &str, artist: &str) -> Option<MatchCandidate> {
        MatchResolver::find_match(self, title, artist).await
    }
}

#[async_trait]
impl MediaDownloader for DownloadEngine {
    async fn download(
        &self,
        job: &DownloadJob,
        events: &UnboundedSender<DownloadEvent>,
    ) -> Result<PathBuf, DownloadError> {
        self.run(job, events).await
    }

    fn cancel(&self) -> bool {
        DownloadEngine::cancel(self)
    }
}
