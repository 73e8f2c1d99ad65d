use crate::{CatalogError, CatalogTrack, CollectionInfo, PlaylistId, TrackId};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Malformed catalog response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{kind}: {message}")]
    InBand { kind: String, message: String },
}

impl From<ParseError> for CatalogError {
    fn from(error: ParseError) -> Self {
        match error {
            ParseError::InBand { message, .. } => CatalogError::Upstream(message),
            other => CatalogError::Upstream(other.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct RawApiError {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct RawPlaylist {
    id: u64,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    nb_tracks: usize,
    #[serde(default)]
    picture_medium: Option<String>,
}

#[derive(Deserialize)]
struct RawNamed {
    #[serde(alias = "title")]
    name: String,
}

#[derive(Deserialize)]
struct RawTrack {
    id: u64,
    title: String,
    #[serde(default)]
    duration: u32,
    artist: RawNamed,
    album: RawNamed,
}

#[derive(Deserialize)]
struct RawTracksPage {
    #[serde(default)]
    data: Vec<RawTrack>,
}

// The API answers HTTP 200 with an `error` object for missing or private playlists.
fn reject_in_band_error(value: &Value) -> Result<(), ParseError> {
    match value.get("error") {
        Some(error) => {
            let RawApiError { kind, message } = serde_json::from_value(error.clone())?;
            Err(ParseError::InBand { kind, message })
        }
        None => Ok(()),
    }
}

pub(crate) fn parse_collection_info(raw_json: &str) -> Result<CollectionInfo, ParseError> {
    let value: Value = serde_json::from_str(raw_json)?;
    reject_in_band_error(&value)?;

    let playlist: RawPlaylist = serde_json::from_value(value)?;

    Ok(CollectionInfo {
        id: PlaylistId(playlist.id),
        title: playlist.title,
        description: playlist.description.unwrap_or_default(),
        expected_track_count: playlist.nb_tracks,
        cover_url: playlist.picture_medium.unwrap_or_default(),
    })
}

pub(crate) fn parse_tracks_page(raw_json: &str) -> Result<Vec<CatalogTrack>, ParseError> {
    let value: Value = serde_json::from_str(raw_json)?;
    reject_in_band_error(&value)?;

    let page: RawTracksPage = serde_json::from_value(value)?;

    Ok(page
        .data
        .into_iter()
        .map(|track| CatalogTrack {
            id: TrackId(track.id),
            title: track.title,
            artist: track.artist.name,
            album: track.album.name,
            duration_seconds: track.duration,
        })
        .collect())
}
