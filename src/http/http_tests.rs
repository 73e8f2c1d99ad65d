use super::{delete_setting, get_setting, select_all_tracks, select_track, update_setting};
use crate::config::Config;
use crate::services::orchestrator::{
    MediaDownloader, Orchestrator, Presenter, TrackMatcher, TrackState,
};
use crate::storage::settings::SettingsStore;
use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use actix_web::web::{Data, Json, Path};
use actix_web::HttpResponse;
use async_trait::async_trait;
use catalog_providers::{CatalogCollection, CatalogTrack, TrackId};
use download_engine::{DownloadError, DownloadEvent, DownloadJob, OutputFormat};
use search_providers::MatchCandidate;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

struct IdleMatcher;

#[async_trait]
impl TrackMatcher for IdleMatcher {
    async fn find_match(&self, _title: &str, _artist: &str) -> Option<MatchCandidate> {
        None
    }
}

struct IdleDownloader;

#[async_trait]
impl MediaDownloader for IdleDownloader {
    async fn download(
        &self,
        _job: &DownloadJob,
        _events: &UnboundedSender<DownloadEvent>,
    ) -> Result<PathBuf, DownloadError> {
        Err(DownloadError::ExitCode(1))
    }

    fn cancel(&self) -> bool {
        false
    }
}

struct SilentPresenter;

impl Presenter for SilentPresenter {
    fn track_updated(&self, _track_id: &TrackId, _state: &TrackState) {}
    fn download_event(&self, _event: &DownloadEvent) {}
}

fn config() -> Config {
    envy::from_iter::<_, Config>(Vec::<(String, String)>::new()).unwrap()
}

fn make_orchestrator() -> Arc<Orchestrator> {
    Arc::new(Orchestrator::new(
        Arc::new(IdleMatcher),
        Arc::new(IdleDownloader),
        Arc::new(SilentPresenter),
        config().default_download_options(),
    ))
}

fn track(id: u64, title: &str) -> CatalogTrack {
    CatalogTrack {
        id: id.into(),
        title: title.into(),
        artist: "Daft Punk".into(),
        album: "Discovery".into(),
        duration_seconds: 240,
    }
}

fn collection() -> CatalogCollection {
    CatalogCollection {
        id: 908622995u64.into(),
        title: "Discovery".into(),
        description: "".into(),
        expected_track_count: 2,
        cover_url: "".into(),
        tracks: vec![track(1, "One More Time"), track(2, "Digital Love")],
    }
}

async fn body_json(response: HttpResponse) -> Value {
    let bytes = to_bytes(response.into_body()).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn selection_flags(body: &Value) -> Vec<bool> {
    body["tracks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["selected"].as_bool().unwrap())
        .collect()
}

#[actix_rt::test]
async fn should_read_and_delete_single_setting() {
    let dir = tempfile::tempdir().unwrap();
    let store = Data::new(Arc::new(SettingsStore::create(dir.path())));
    let orchestrator = Data::new(make_orchestrator());
    let config = Data::new(Arc::new(config()));

    let response = update_setting(
        store.clone(),
        orchestrator.clone(),
        config.clone(),
        Path::from("format".to_string()),
        Json(serde_json::from_value(json!({ "value": "mp4" })).unwrap()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(orchestrator.download_options().format, OutputFormat::Mp4);

    let response = get_setting(store.clone(), Path::from("format".to_string())).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "value": "mp4" }));

    let response = delete_setting(
        store.clone(),
        orchestrator.clone(),
        config.clone(),
        Path::from("format".to_string()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(orchestrator.download_options().format, OutputFormat::Mp3);

    let response = get_setting(store.clone(), Path::from("format".to_string())).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn should_reject_invalid_setting_key() {
    let dir = tempfile::tempdir().unwrap();
    let store = Data::new(Arc::new(SettingsStore::create(dir.path())));

    let response = get_setting(store, Path::from("../secret".to_string())).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn should_return_snapshot_from_both_selection_endpoints() {
    let orchestrator = Data::new(make_orchestrator());
    orchestrator.load(collection()).unwrap();

    let response = select_track(
        orchestrator.clone(),
        Path::from(2u64),
        Json(serde_json::from_value(json!({ "selected": false })).unwrap()),
    )
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(selection_flags(&body_json(response).await), vec![true, false]);

    let response = select_all_tracks(
        orchestrator.clone(),
        Json(serde_json::from_value(json!({ "selected": false })).unwrap()),
    )
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(selection_flags(&body_json(response).await), vec![false, false]);
}
