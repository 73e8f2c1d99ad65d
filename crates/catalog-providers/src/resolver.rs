use crate::{CatalogApi, CatalogCollection, CatalogError, CatalogTrack, PlaylistId};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

pub const TRACKS_PAGE_SIZE: usize = 100;

static PLAYLIST_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"deezer\.com/(?:\w+/)?playlist/(\d+)").expect("valid regex"));
static BARE_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)$").expect("valid regex"));

/// Extracts a numeric playlist ID from a playlist URL or a bare numeric string.
pub fn extract_playlist_id(reference: &str) -> Option<PlaylistId> {
    let reference = reference.trim();

    [&*PLAYLIST_URL_RE, &*BARE_ID_RE]
        .iter()
        .find_map(|re| re.captures(reference))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .map(PlaylistId)
}

pub fn page_count(expected_track_count: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);

    let remainder = usize::from(expected_track_count % page_size != 0);

    (expected_track_count / page_size + remainder).max(1)
}

pub struct CatalogResolver {
    api: Arc<dyn CatalogApi + Send + Sync>,
    page_size: usize,
}

impl CatalogResolver {
    pub fn new(api: Arc<dyn CatalogApi + Send + Sync>) -> Self {
        Self {
            api,
            page_size: TRACKS_PAGE_SIZE,
        }
    }

    pub async fn resolve(&self, reference: &str) -> Result<CatalogCollection, CatalogError> {
        let playlist_id = extract_playlist_id(reference)
            .ok_or_else(|| CatalogError::NotFound(reference.to_string()))?;

        info!(%playlist_id, "Resolving playlist");

        let info = self.api.fetch_collection_info(&playlist_id).await?;
        let tracks = self
            .fetch_all_tracks(&playlist_id, info.expected_track_count)
            .await?;

        if tracks.len() != info.expected_track_count {
            warn!(
                %playlist_id,
                expected = info.expected_track_count,
                fetched = tracks.len(),
                "Fetched track count differs from the announced one"
            );
        }

        info!(%playlist_id, title = %info.title, tracks = tracks.len(), "Playlist resolved");

        Ok(CatalogCollection::from_info(info, tracks))
    }

    /// Requests every page at once, addressed by offset, and stitches the
    /// results back together in page order.
    async fn fetch_all_tracks(
        &self,
        playlist_id: &PlaylistId,
        expected_track_count: usize,
    ) -> Result<Vec<CatalogTrack>, CatalogError> {
        let pages = page_count(expected_track_count, self.page_size);

        debug!(%playlist_id, pages, "Fetching playlist tracks...");

        let mut requests = JoinSet::new();
        for page_index in 0..pages {
            let api = Arc::clone(&self.api);
            let playlist_id = playlist_id.clone();
            let limit = self.page_size;

            requests.spawn(async move {
                let result = api
                    .fetch_tracks_page(&playlist_id, page_index * limit, limit)
                    .await;
                (page_index, result)
            });
        }

        let mut pages_by_index: Vec<Option<Vec<CatalogTrack>>> = (0..pages).map(|_| None).collect();

        // Dropping the set on the first error aborts the remaining requests.
        while let Some(joined) = requests.join_next().await {
            let (page_index, result) = joined
                .map_err(|error| CatalogError::Upstream(format!("Page request failed: {}", error)))?;

            pages_by_index[page_index] = Some(result?);
        }

        Ok(pages_by_index.into_iter().flatten().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CollectionInfo, TrackId};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    fn make_track(id: u64) -> CatalogTrack {
        CatalogTrack {
            id: TrackId(id),
            title: format!("Track {}", id),
            artist: "Robert Miles".into(),
            album: "Dreamland".into(),
            duration_seconds: 200,
        }
    }

    struct CatalogApiMock {
        total_tracks: usize,
        requested_offsets: Mutex<Vec<usize>>,
        failing_offset: Option<usize>,
    }

    impl CatalogApiMock {
        fn new(total_tracks: usize) -> Self {
            Self {
                total_tracks,
                requested_offsets: Mutex::new(vec![]),
                failing_offset: None,
            }
        }
    }

    #[async_trait]
    impl CatalogApi for CatalogApiMock {
        async fn fetch_collection_info(
            &self,
            playlist_id: &PlaylistId,
        ) -> Result<CollectionInfo, CatalogError> {
            match **playlist_id {
                908622995 => Ok(CollectionInfo {
                    id: playlist_id.clone(),
                    title: "Dreamland".into(),
                    description: "".into(),
                    expected_track_count: self.total_tracks,
                    cover_url: "".into(),
                }),
                _ => Err(CatalogError::Upstream("no data".into())),
            }
        }

        async fn fetch_tracks_page(
            &self,
            _playlist_id: &PlaylistId,
            index: usize,
            limit: usize,
        ) -> Result<Vec<CatalogTrack>, CatalogError> {
            self.requested_offsets.lock().unwrap().push(index);

            // Later pages settle first.
            let delay = 30u64.saturating_sub((index / limit) as u64 * 10);
            tokio::time::sleep(Duration::from_millis(delay)).await;

            if self.failing_offset == Some(index) {
                return Err(CatalogError::Upstream("page failed".into()));
            }

            let end = (index + limit).min(self.total_tracks);
            Ok((index..end).map(|n| make_track(n as u64)).collect())
        }
    }

    #[test]
    fn should_extract_id_from_playlist_urls() {
        assert_eq!(
            extract_playlist_id("https://www.deezer.com/playlist/908622995"),
            Some(PlaylistId(908622995))
        );
        assert_eq!(
            extract_playlist_id("https://www.deezer.com/fr/playlist/1479458365?utm_source=share"),
            Some(PlaylistId(1479458365))
        );
        assert_eq!(
            extract_playlist_id("deezer.com/en/playlist/53362031"),
            Some(PlaylistId(53362031))
        );
    }

    #[test]
    fn should_extract_id_from_bare_numeric_reference() {
        assert_eq!(extract_playlist_id("908622995"), Some(PlaylistId(908622995)));
        assert_eq!(extract_playlist_id("  908622995\n"), Some(PlaylistId(908622995)));
    }

    #[test]
    fn should_not_extract_id_from_anything_else() {
        assert_eq!(extract_playlist_id(""), None);
        assert_eq!(extract_playlist_id("playlist"), None);
        assert_eq!(extract_playlist_id("12ab34"), None);
        assert_eq!(extract_playlist_id("https://www.deezer.com/album/302127"), None);
        assert_eq!(
            extract_playlist_id("https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M"),
            None
        );
        assert_eq!(extract_playlist_id("99999999999999999999999"), None);
    }

    #[test]
    fn should_compute_page_count() {
        assert_eq!(page_count(0, 100), 1);
        assert_eq!(page_count(1, 100), 1);
        assert_eq!(page_count(100, 100), 1);
        assert_eq!(page_count(101, 100), 2);
        assert_eq!(page_count(250, 100), 3);
        assert_eq!(page_count(usize::MAX, 100), usize::MAX / 100 + 1);
    }

    #[actix_rt::test]
    async fn should_fetch_pages_concurrently_and_merge_them_in_page_order() {
        let api = Arc::new(CatalogApiMock::new(250));
        let resolver = CatalogResolver::new(Arc::clone(&api) as Arc<dyn CatalogApi + Send + Sync>);

        let collection = resolver
            .resolve("https://www.deezer.com/playlist/908622995")
            .await
            .unwrap();

        let mut offsets = api.requested_offsets.lock().unwrap().clone();
        offsets.sort();
        assert_eq!(offsets, vec![0, 100, 200]);

        assert_eq!(collection.tracks.len(), 250);
        let ids = collection
            .tracks
            .iter()
            .map(|track| *track.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, (0..250).collect::<Vec<u64>>());
    }

    #[actix_rt::test]
    async fn should_request_single_page_for_empty_playlist() {
        let api = Arc::new(CatalogApiMock::new(0));
        let resolver = CatalogResolver::new(Arc::clone(&api) as Arc<dyn CatalogApi + Send + Sync>);

        let collection = resolver.resolve("908622995").await.unwrap();

        assert_eq!(*api.requested_offsets.lock().unwrap(), vec![0]);
        assert!(collection.tracks.is_empty());
    }

    #[actix_rt::test]
    async fn should_fail_whole_resolve_when_one_page_fails() {
        let api = Arc::new(CatalogApiMock {
            failing_offset: Some(100),
            ..CatalogApiMock::new(250)
        });
        let resolver = CatalogResolver::new(api);

        let result = resolver.resolve("908622995").await;

        assert!(matches!(result, Err(CatalogError::Upstream(_))));
    }

    #[actix_rt::test]
    async fn should_fail_with_not_found_for_unrecognized_reference() {
        let resolver = CatalogResolver::new(Arc::new(CatalogApiMock::new(10)));

        let result = resolver.resolve("not a playlist").await;

        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }

    #[actix_rt::test]
    async fn should_surface_upstream_errors_from_metadata_call() {
        let resolver = CatalogResolver::new(Arc::new(CatalogApiMock::new(10)));

        let result = resolver.resolve("1").await;

        assert!(matches!(result, Err(CatalogError::Upstream(message)) if message == "no data"));
    }
}
