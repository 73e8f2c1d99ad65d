mod events;
mod health;
mod phases;
mod playlist;
mod settings;

#[cfg(test)]
mod http_tests;

use crate::services::orchestrator::OrchestratorError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

pub(crate) use events::get_events;
pub(crate) use health::health_check;
pub(crate) use phases::{cancel_download, start_download, start_search};
pub(crate) use playlist::{
    get_playlist, get_progress, load_playlist, select_all_tracks, select_track,
};
pub(crate) use settings::{delete_setting, get_setting, get_settings, update_setting};

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

pub(crate) fn error_response(status: StatusCode, message: impl ToString) -> HttpResponse {
    HttpResponse::build(status).json(ErrorBody {
        error: message.to_string(),
    })
}

impl ResponseError for OrchestratorError {
    fn status_code(&self) -> StatusCode {
        match self {
            OrchestratorError::PhaseInProgress => StatusCode::CONFLICT,
            OrchestratorError::NoPlaylist | OrchestratorError::UnknownTrack(_) => {
                StatusCode::NOT_FOUND
            }
            OrchestratorError::InvalidTransition(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        error_response(self.status_code(), self)
    }
}
