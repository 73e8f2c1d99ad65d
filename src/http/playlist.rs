use super::error_response;
use crate::services::orchestrator::{Orchestrator, OrchestratorError};
use actix_web::http::StatusCode;
use actix_web::web::{Data, Json, Path};
use actix_web::HttpResponse;
use catalog_providers::{CatalogError, CatalogResolver};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

#[derive(Deserialize)]
pub(crate) struct LoadPlaylistRequest {
    reference: String,
}

#[derive(Deserialize)]
pub(crate) struct SelectionRequest {
    selected: bool,
}

pub(crate) async fn load_playlist(
    resolver: Data<Arc<CatalogResolver>>,
    orchestrator: Data<Arc<Orchestrator>>,
    request: Json<LoadPlaylistRequest>,
) -> Result<HttpResponse, OrchestratorError> {
    if orchestrator.is_phase_running() {
        return Err(OrchestratorError::PhaseInProgress);
    }

    let collection = match resolver.resolve(&request.reference).await {
        Ok(collection) => collection,
        Err(error) => {
            warn!(reference = %request.reference, ?error, "Unable to resolve playlist");
            let status = match error {
                CatalogError::NotFound(_) => StatusCode::BAD_REQUEST,
                CatalogError::Upstream(_) => StatusCode::BAD_GATEWAY,
            };
            return Ok(error_response(status, error));
        }
    };

    orchestrator.load(collection)?;

    Ok(HttpResponse::Ok().json(orchestrator.snapshot()?))
}

pub(crate) async fn get_playlist(
    orchestrator: Data<Arc<Orchestrator>>,
) -> Result<HttpResponse, OrchestratorError> {
    Ok(HttpResponse::Ok().json(orchestrator.snapshot()?))
}

pub(crate) async fn get_progress(
    orchestrator: Data<Arc<Orchestrator>>,
) -> Result<HttpResponse, OrchestratorError> {
    Ok(HttpResponse::Ok().json(orchestrator.progress_summary()?))
}

pub(crate) async fn select_all_tracks(
    orchestrator: Data<Arc<Orchestrator>>,
    request: Json<SelectionRequest>,
) -> Result<HttpResponse, OrchestratorError> {
    orchestrator.select_all(request.selected)?;

    Ok(HttpResponse::Ok().json(orchestrator.snapshot()?))
}

pub(crate) async fn select_track(
    orchestrator: Data<Arc<Orchestrator>>,
    track_id: Path<u64>,
    request: Json<SelectionRequest>,
) -> Result<HttpResponse, OrchestratorError> {
    orchestrator.set_selection(&track_id.into_inner().into(), request.selected)?;

    Ok(HttpResponse::Ok().json(orchestrator.snapshot()?))
}
