use super::traits::{MediaDownloader, Presenter, TrackMatcher};
use super::types::{PlaylistSnapshot, ProgressSummary, TrackEntry, TrackState, TrackStateError};
use async_lock::{Mutex as AsyncMutex, MutexGuardArc};
use catalog_providers::{CatalogCollection, CatalogTrack, TrackId};
use download_engine::{DownloadEvent, DownloadJob, DownloadOptions, DownloadStatus};
use futures_lite::future::zip;
use search_providers::MatchCandidate;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub(crate) enum OrchestratorError {
    #[error("Another phase is already running")]
    PhaseInProgress,
    #[error("No playlist is loaded")]
    NoPlaylist,
    #[error("Unknown track: {0}")]
    UnknownTrack(TrackId),
    #[error(transparent)]
    InvalidTransition(#[from] TrackStateError),
}

/// Exclusive right to run a phase. Held for the whole phase.
pub(crate) struct PhaseGuard(#[allow(dead_code)] MutexGuardArc<()>);

struct Session {
    collection: CatalogCollection,
    entries: Vec<TrackEntry>,
}

pub(crate) struct Orchestrator {
    matcher: Arc<dyn TrackMatcher + Send + Sync>,
    downloader: Arc<dyn MediaDownloader + Send + Sync>,
    presenter: Arc<dyn Presenter + Send + Sync>,
    session: Mutex<Option<Session>>,
    options: Mutex<DownloadOptions>,
    phase_lock: Arc<AsyncMutex<()>>,
}

impl Orchestrator {
    pub(crate) fn new(
        matcher: Arc<dyn TrackMatcher + Send + Sync>,
        downloader: Arc<dyn MediaDownloader + Send + Sync>,
        presenter: Arc<dyn Presenter + Send + Sync>,
        options: DownloadOptions,
    ) -> Self {
        Self {
            matcher,
            downloader,
            presenter,
            session: Mutex::new(None),
            options: Mutex::new(options),
            phase_lock: Arc::new(AsyncMutex::new(())),
        }
    }

    pub(crate) fn begin_phase(&self) -> Result<PhaseGuard, OrchestratorError> {
        self.phase_lock
            .try_lock_arc()
            .map(PhaseGuard)
            .ok_or(OrchestratorError::PhaseInProgress)
    }

    pub(crate) fn is_phase_running(&self) -> bool {
        self.phase_lock.try_lock().is_none()
    }

    pub(crate) fn has_playlist(&self) -> bool {
        self.lock_session().is_some()
    }

    /// Replaces the current session. All tracks start pending and selected.
    pub(crate) fn load(&self, collection: CatalogCollection) -> Result<(), OrchestratorError> {
        let _guard = self.begin_phase()?;

        let entries = collection
            .tracks
            .iter()
            .cloned()
            .map(TrackEntry::new)
            .collect::<Vec<_>>();

        info!(
            playlist_id = %collection.id,
            tracks = entries.len(),
            "Playlist loaded"
        );

        self.lock_session()
            .replace(Session { collection, entries });

        Ok(())
    }

    pub(crate) fn set_selection(
        &self,
        track_id: &TrackId,
        selected: bool,
    ) -> Result<(), OrchestratorError> {
        let mut session = self.lock_session();
        let session = session.as_mut().ok_or(OrchestratorError::NoPlaylist)?;

        let mut matched = false;
        for entry in session
            .entries
            .iter_mut()
            .filter(|entry| &entry.track.id == track_id)
        {
            entry.selected = selected;
            matched = true;
        }

        if !matched {
            return Err(OrchestratorError::UnknownTrack(track_id.clone()));
        }

        Ok(())
    }

    pub(crate) fn select_all(&self, selected: bool) -> Result<(), OrchestratorError> {
        let mut session = self.lock_session();
        let session = session.as_mut().ok_or(OrchestratorError::NoPlaylist)?;

        for entry in session.entries.iter_mut() {
            entry.selected = selected;
        }

        Ok(())
    }

    pub(crate) fn download_options(&self) -> DownloadOptions {
        self.options
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub(crate) fn set_download_options(&self, options: DownloadOptions) {
        *self.options.lock().unwrap_or_else(|e| e.into_inner()) = options;
    }

    pub(crate) fn snapshot(&self) -> Result<PlaylistSnapshot, OrchestratorError> {
        let session = self.lock_session();
        let session = session.as_ref().ok_or(OrchestratorError::NoPlaylist)?;

        Ok(PlaylistSnapshot {
            id: session.collection.id.clone(),
            title: session.collection.title.clone(),
            description: session.collection.description.clone(),
            expected_track_count: session.collection.expected_track_count,
            cover_url: session.collection.cover_url.clone(),
            tracks: session.entries.clone(),
            progress: ProgressSummary::from_entries(&session.entries),
        })
    }

    pub(crate) fn progress_summary(&self) -> Result<ProgressSummary, OrchestratorError> {
        let session = self.lock_session();
        let session = session.as_ref().ok_or(OrchestratorError::NoPlaylist)?;

        Ok(ProgressSummary::from_entries(&session.entries))
    }

    pub(crate) fn cancel_current(&self) -> bool {
        self.downloader.cancel()
    }

    /// Looks up a candidate for every selected pending track, one at a time.
    pub(crate) async fn run_search_phase(&self, _guard: PhaseGuard) -> Result<(), OrchestratorError> {
        let tracks = self.collect_tracks(|entry| entry.selected && entry.state == TrackState::Pending)?;

        info!(tracks = tracks.len(), "Search phase started");

        for (index, track) in tracks {
            self.transition(index, &track.id, TrackState::Searching)?;

            let next = match self.matcher.find_match(&track.title, &track.artist).await {
                Some(candidate) => TrackState::Found(candidate),
                None => TrackState::NotFound,
            };

            self.transition(index, &track.id, next)?;
        }

        info!("Search phase finished");

        Ok(())
    }

    /// Downloads every selected track with a candidate. A failed download
    /// marks its track and moves on to the next one.
    pub(crate) async fn run_download_phase(&self, _guard: PhaseGuard) -> Result<(), OrchestratorError> {
        let tracks = self.collect_candidates()?;
        let options = self.download_options();

        info!(tracks = tracks.len(), "Download phase started");

        for (index, track, candidate) in tracks {
            self.transition(index, &track.id, TrackState::Downloading(0.0))?;

            let job = DownloadJob {
                track_key: track.id.to_string(),
                artist: track.artist.clone(),
                title: track.title.clone(),
                source_url: candidate.source_url.clone(),
                options: options.clone(),
            };

            let (tx, rx) = unbounded_channel();
            let (result, _) = zip(
                async {
                    let tx = tx;
                    self.downloader.download(&job, &tx).await
                },
                self.relay_events(index, &track.id, rx),
            )
            .await;

            let next = match result {
                Ok(path) => TrackState::Completed(path),
                Err(error) => {
                    warn!(track_id = %track.id, ?error, "Track download failed");
                    TrackState::Error(error.to_string())
                }
            };

            self.transition(index, &track.id, next)?;
        }

        info!("Download phase finished");

        Ok(())
    }

    async fn relay_events(
        &self,
        index: usize,
        track_id: &TrackId,
        mut rx: UnboundedReceiver<DownloadEvent>,
    ) {
        while let Some(event) = rx.recv().await {
            self.presenter.download_event(&event);

            if event.status == DownloadStatus::Downloading {
                let next = TrackState::Downloading(event.percent);
                if let Err(error) = self.transition(index, track_id, next) {
                    debug!(%track_id, ?error, "Progress event ignored");
                }
            }
        }
    }

    /// Entries are addressed by position, since a playlist may list the same track twice.
    fn transition(
        &self,
        index: usize,
        track_id: &TrackId,
        next: TrackState,
    ) -> Result<(), OrchestratorError> {
        let state = {
            let mut session = self.lock_session();
            let session = session.as_mut().ok_or(OrchestratorError::NoPlaylist)?;

            let entry = session
                .entries
                .get_mut(index)
                .filter(|entry| &entry.track.id == track_id)
                .ok_or_else(|| OrchestratorError::UnknownTrack(track_id.clone()))?;

            entry.state = entry.state.transition(next)?;
            entry.state.clone()
        };

        if state.is_terminal() {
            info!(%track_id, state = state.name(), "Track settled");
        } else if !matches!(state, TrackState::Downloading(_)) {
            debug!(%track_id, state = state.name(), "Track state changed");
        }

        self.presenter.track_updated(track_id, &state);

        Ok(())
    }

    fn collect_tracks(
        &self,
        predicate: impl Fn(&TrackEntry) -> bool,
    ) -> Result<Vec<(usize, CatalogTrack)>, OrchestratorError> {
        let session = self.lock_session();
        let session = session.as_ref().ok_or(OrchestratorError::NoPlaylist)?;

        Ok(session
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| predicate(entry))
            .map(|(index, entry)| (index, entry.track.clone()))
            .collect())
    }

    fn collect_candidates(
        &self,
    ) -> Result<Vec<(usize, CatalogTrack, MatchCandidate)>, OrchestratorError> {
        let session = self.lock_session();
        let session = session.as_ref().ok_or(OrchestratorError::NoPlaylist)?;

        Ok(session
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.selected)
            .filter_map(|(index, entry)| match &entry.state {
                TrackState::Found(candidate) => {
                    Some((index, entry.track.clone(), candidate.clone()))
                }
                _ => None,
            })
            .collect())
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }
}
