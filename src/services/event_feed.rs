use crate::services::orchestrator::{Presenter, TrackState};
use catalog_providers::TrackId;
use download_engine::DownloadEvent;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::debug;

pub(crate) const DEFAULT_FEED_CAPACITY: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum FeedPayload {
    TrackState { track_id: TrackId, state: TrackState },
    Download(DownloadEvent),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct FeedEntry {
    pub(crate) seq: u64,
    #[serde(flatten)]
    pub(crate) payload: FeedPayload,
}

#[derive(Default)]
struct FeedState {
    last_seq: u64,
    entries: VecDeque<FeedEntry>,
}

/// Bounded, sequence-numbered log of everything the orchestrator reports.
/// Clients poll it with the last sequence number they have seen.
pub(crate) struct EventFeed {
    capacity: usize,
    state: Mutex<FeedState>,
}

impl EventFeed {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(FeedState::default()),
        }
    }

    pub(crate) fn push(&self, payload: FeedPayload) -> u64 {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        state.last_seq += 1;
        let seq = state.last_seq;
        state.entries.push_back(FeedEntry { seq, payload });

        while state.entries.len() > self.capacity {
            state.entries.pop_front();
        }

        seq
    }

    pub(crate) fn since(&self, seq: u64) -> Vec<FeedEntry> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        state
            .entries
            .iter()
            .filter(|entry| entry.seq > seq)
            .cloned()
            .collect()
    }

    pub(crate) fn last_seq(&self) -> u64 {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).last_seq
    }
}

impl Default for EventFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

impl Presenter for EventFeed {
    fn track_updated(&self, track_id: &TrackId, state: &TrackState) {
        self.push(FeedPayload::TrackState {
            track_id: track_id.clone(),
            state: state.clone(),
        });
    }

    fn download_event(&self, event: &DownloadEvent) {
        debug!(
            track_key = %event.track_key,
            percent = event.percent,
            status = ?event.status,
            "Download event"
        );
        self.push(FeedPayload::Download(event.clone()));
    }
}
