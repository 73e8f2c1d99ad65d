use catalog_providers::{CatalogTrack, PlaylistId};
use search_providers::MatchCandidate;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub(crate) enum TrackState {
    Pending,
    Searching,
    Found(MatchCandidate),
    NotFound,
    Downloading(f32),
    Completed(PathBuf),
    Error(String),
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid track state transition: {from} -> {to}")]
pub(crate) struct TrackStateError {
    pub(crate) from: &'static str,
    pub(crate) to: &'static str,
}

impl TrackState {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            TrackState::Pending => "pending",
            TrackState::Searching => "searching",
            TrackState::Found(_) => "found",
            TrackState::NotFound => "not_found",
            TrackState::Downloading(_) => "downloading",
            TrackState::Completed(_) => "completed",
            TrackState::Error(_) => "error",
        }
    }

    pub(crate) fn is_terminal(&self) -> bool {
        matches!(self, TrackState::Completed(_) | TrackState::Error(_))
    }

    pub(crate) fn can_transition_to(&self, next: &TrackState) -> bool {
        use TrackState::*;

        matches!(
            (self, next),
            (Pending, Searching)
                | (Searching, Found(_))
                | (Searching, NotFound)
                | (Found(_), Downloading(_))
                | (Downloading(_), Downloading(_))
                | (Downloading(_), Completed(_))
                | (Downloading(_), Error(_))
        )
    }

    pub(crate) fn transition(&self, next: TrackState) -> Result<TrackState, TrackStateError> {
        if !self.can_transition_to(&next) {
            return Err(TrackStateError {
                from: self.name(),
                to: next.name(),
            });
        }

        Ok(next)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct TrackEntry {
    pub(crate) track: CatalogTrack,
    pub(crate) selected: bool,
    pub(crate) state: TrackState,
}

impl TrackEntry {
    pub(crate) fn new(track: CatalogTrack) -> Self {
        Self {
            track,
            selected: true,
            state: TrackState::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub(crate) struct ProgressSummary {
    pub(crate) completed: usize,
    pub(crate) total: usize,
    pub(crate) percent: u32,
}

impl ProgressSummary {
    /// Counts selected tracks that are found, downloading or completed.
    pub(crate) fn from_entries(entries: &[TrackEntry]) -> Self {
        let (completed, total) = entries
            .iter()
            .filter(|entry| entry.selected)
            .fold((0, 0), |(completed, total), entry| match entry.state {
                TrackState::Completed(_) => (completed + 1, total + 1),
                TrackState::Found(_) | TrackState::Downloading(_) => (completed, total + 1),
                _ => (completed, total),
            });

        let percent = match total {
            0 => 0,
            total => ((completed as f64 / total as f64) * 100.0).round() as u32,
        };

        Self {
            completed,
            total,
            percent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct PlaylistSnapshot {
    pub(crate) id: PlaylistId,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) expected_track_count: usize,
    pub(crate) cover_url: String,
    pub(crate) tracks: Vec<TrackEntry>,
    pub(crate) progress: ProgressSummary,
}
