use crate::services::orchestrator::{Orchestrator, OrchestratorError};
use actix_web::web::Data;
use actix_web::HttpResponse;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

pub(crate) async fn start_search(
    orchestrator: Data<Arc<Orchestrator>>,
) -> Result<HttpResponse, OrchestratorError> {
    if !orchestrator.has_playlist() {
        return Err(OrchestratorError::NoPlaylist);
    }

    let guard = orchestrator.begin_phase()?;
    let orchestrator = orchestrator.get_ref().clone();

    actix_rt::spawn(async move {
        if let Err(error) = orchestrator.run_search_phase(guard).await {
            error!(?error, "Search phase failed");
        }
    });

    Ok(HttpResponse::Accepted().finish())
}

pub(crate) async fn start_download(
    orchestrator: Data<Arc<Orchestrator>>,
) -> Result<HttpResponse, OrchestratorError> {
    if !orchestrator.has_playlist() {
        return Err(OrchestratorError::NoPlaylist);
    }

    let guard = orchestrator.begin_phase()?;
    let orchestrator = orchestrator.get_ref().clone();

    actix_rt::spawn(async move {
        if let Err(error) = orchestrator.run_download_phase(guard).await {
            error!(?error, "Download phase failed");
        }
    });

    Ok(HttpResponse::Accepted().finish())
}

pub(crate) async fn cancel_download(orchestrator: Data<Arc<Orchestrator>>) -> HttpResponse {
    let cancelled = orchestrator.cancel_current();

    HttpResponse::Ok().json(json!({ "cancelled": cancelled }))
}
