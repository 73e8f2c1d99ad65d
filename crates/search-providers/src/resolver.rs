use crate::{MatchCandidate, SearchResults, VideoSearchProvider};
use async_lock::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Minimal pause between two successive lookups against the search provider.
pub const MIN_LOOKUP_DELAY: Duration = Duration::from_millis(500);

pub fn primary_query(title: &str, artist: &str) -> String {
    format!("{} - {} official audio", artist, title)
}

pub fn fallback_query(title: &str, artist: &str) -> String {
    format!("{} {}", artist, title)
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackQuery {
    pub title: String,
    pub artist: String,
}

pub struct MatchResolver {
    provider: Arc<dyn VideoSearchProvider + Send + Sync>,
    delay: Duration,
    last_lookup: Mutex<Option<Instant>>,
}

impl MatchResolver {
    pub fn new(provider: Arc<dyn VideoSearchProvider + Send + Sync>) -> Self {
        Self::with_delay(provider, MIN_LOOKUP_DELAY)
    }

    /// Delays shorter than [`MIN_LOOKUP_DELAY`] are raised to it.
    pub fn with_delay(provider: Arc<dyn VideoSearchProvider + Send + Sync>, delay: Duration) -> Self {
        Self {
            provider,
            delay: delay.max(MIN_LOOKUP_DELAY),
            last_lookup: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Finds the best playable candidate for a track. Search failures are
    /// logged and reported as no match.
    pub async fn find_match(&self, title: &str, artist: &str) -> Option<MatchCandidate> {
        // Held for the whole lookup so concurrent callers queue up behind it.
        let mut last_lookup = self.last_lookup.lock().await;

        if let Some(at) = *last_lookup {
            tokio::time::sleep_until(at + self.delay).await;
        }

        let result = self.lookup(title, artist).await;
        last_lookup.replace(Instant::now());

        match result {
            Some(candidate) => {
                debug!(title, artist, video_id = %candidate.video_id, "Match found");
                Some(candidate)
            }
            None => {
                info!(title, artist, "No match found");
                None
            }
        }
    }

    pub async fn match_all(&self, tracks: &[TrackQuery]) -> Vec<Option<MatchCandidate>> {
        let mut matches = Vec::with_capacity(tracks.len());

        for track in tracks {
            matches.push(self.find_match(&track.title, &track.artist).await);
        }

        matches
    }

    async fn lookup(&self, title: &str, artist: &str) -> Option<MatchCandidate> {
        let results = match self.search(&primary_query(title, artist)).await? {
            results if results.is_empty() => self.search(&fallback_query(title, artist)).await?,
            results => results,
        };

        results.into_iter().next().map(MatchCandidate::from)
    }

    async fn search(&self, query: &str) -> Option<SearchResults> {
        match self.provider.search_videos(query).await {
            Ok(results) => Some(results),
            Err(error) => {
                warn!(?error, query, "Video search failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SearchProviderError, SearchResult, VideoId};
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    fn make_result(video_id: &str, title: &str) -> SearchResult {
        SearchResult {
            video_id: VideoId(video_id.into()),
            title: title.into(),
            channel: "Robert Miles".into(),
            duration: "3:48".into(),
        }
    }

    struct VideoSearchProviderMock {
        queries: StdMutex<Vec<String>>,
    }

    impl VideoSearchProviderMock {
        fn new() -> Self {
            Self {
                queries: StdMutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl VideoSearchProvider for VideoSearchProviderMock {
        async fn search_videos(&self, query: &str) -> Result<SearchResults, SearchProviderError> {
            self.queries.lock().unwrap().push(query.to_string());

            match query {
                "Robert Miles - Children official audio" => Ok(vec![
                    make_result("v1", "Robert Miles - Children (Official Audio)"),
                    make_result("v2", "Robert Miles - Children (Dream Version)"),
                ]),
                "Robert Miles - Fable official audio" => Ok(vec![]),
                "Robert Miles Fable" => Ok(vec![make_result("v3", "Fable")]),
                "Robert Miles - One and One official audio" => Ok(vec![]),
                "Robert Miles One and One" => Ok(vec![]),
                "Robert Miles - Paths official audio" => Ok(vec![]),
                _ => Err(SearchProviderError::ParseError(
                    crate::ParseError::MissingContents,
                )),
            }
        }
    }

    #[actix_rt::test]
    async fn should_pick_first_primary_result() {
        let provider = Arc::new(VideoSearchProviderMock::new());
        let resolver = MatchResolver::new(Arc::clone(&provider) as Arc<dyn VideoSearchProvider + Send + Sync>);

        let candidate = resolver.find_match("Children", "Robert Miles").await.unwrap();

        assert_eq!(candidate.video_id, VideoId("v1".into()));
        assert_eq!(candidate.source_url, "https://www.youtube.com/watch?v=v1");
        assert_eq!(
            *provider.queries.lock().unwrap(),
            vec!["Robert Miles - Children official audio".to_string()]
        );
    }

    #[actix_rt::test]
    async fn should_fall_back_to_simple_query_when_primary_is_empty() {
        let provider = Arc::new(VideoSearchProviderMock::new());
        let resolver = MatchResolver::new(Arc::clone(&provider) as Arc<dyn VideoSearchProvider + Send + Sync>);

        let candidate = resolver.find_match("Fable", "Robert Miles").await.unwrap();

        assert_eq!(candidate.video_id, VideoId("v3".into()));
        assert_eq!(
            *provider.queries.lock().unwrap(),
            vec![
                "Robert Miles - Fable official audio".to_string(),
                "Robert Miles Fable".to_string()
            ]
        );
    }

    #[actix_rt::test]
    async fn should_return_none_when_both_queries_are_empty() {
        let resolver = MatchResolver::new(Arc::new(VideoSearchProviderMock::new()));

        assert_eq!(resolver.find_match("One and One", "Robert Miles").await, None);
    }

    #[actix_rt::test]
    async fn should_return_none_when_primary_query_fails() {
        let resolver = MatchResolver::new(Arc::new(VideoSearchProviderMock::new()));

        assert_eq!(resolver.find_match("Unknown", "Nobody").await, None);
    }

    #[actix_rt::test]
    async fn should_return_none_when_fallback_query_fails() {
        let resolver = MatchResolver::new(Arc::new(VideoSearchProviderMock::new()));

        assert_eq!(resolver.find_match("Paths", "Robert Miles").await, None);
    }

    #[test]
    fn should_not_accept_delay_below_minimum() {
        let resolver = MatchResolver::with_delay(
            Arc::new(VideoSearchProviderMock::new()),
            Duration::from_millis(10),
        );

        assert_eq!(resolver.delay(), MIN_LOOKUP_DELAY);
    }

    #[actix_rt::test]
    async fn should_throttle_sequential_lookups() {
        let resolver = MatchResolver::new(Arc::new(VideoSearchProviderMock::new()));
        let tracks = vec![
            TrackQuery {
                title: "Children".into(),
                artist: "Robert Miles".into(),
            },
            TrackQuery {
                title: "Fable".into(),
                artist: "Robert Miles".into(),
            },
            TrackQuery {
                title: "One and One".into(),
                artist: "Robert Miles".into(),
            },
        ];

        let started = Instant::now();
        let matches = resolver.match_all(&tracks).await;
        let elapsed = started.elapsed();

        assert!(elapsed >= MIN_LOOKUP_DELAY * 2, "elapsed {:?}", elapsed);
        assert_eq!(matches.len(), 3);
        assert!(matches[0].is_some());
        assert!(matches[1].is_some());
        assert!(matches[2].is_none());
    }
}
