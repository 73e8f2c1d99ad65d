use super::error_response;
use crate::config::Config;
use crate::services::orchestrator::Orchestrator;
use crate::storage::settings::{
    apply_overrides, SettingsError, SettingsStore, FORMAT_KEY, OUTPUT_DIR_KEY, QUALITY_KEY,
};
use actix_web::http::StatusCode;
use actix_web::web::{Data, Json, Path};
use actix_web::HttpResponse;
use download_engine::OutputFormat;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Deserialize)]
pub(crate) struct UpdateSettingRequest {
    value: String,
}

#[derive(Serialize)]
struct SettingResponse {
    value: String,
}

fn settings_error_response(error: SettingsError) -> HttpResponse {
    match error {
        SettingsError::InvalidKey(_) => error_response(StatusCode::BAD_REQUEST, error),
        SettingsError::Io(_) => {
            error!(?error, "Settings storage failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, error)
        }
    }
}

pub(crate) async fn get_settings(store: Data<Arc<SettingsStore>>) -> HttpResponse {
    match store.get_all().await {
        Ok(settings) => HttpResponse::Ok().json(settings),
        Err(error) => settings_error_response(error),
    }
}

pub(crate) async fn update_setting(
    store: Data<Arc<SettingsStore>>,
    orchestrator: Data<Arc<Orchestrator>>,
    config: Data<Arc<Config>>,
    key: Path<String>,
    request: Json<UpdateSettingRequest>,
) -> HttpResponse {
    let key = key.into_inner();

    if key == FORMAT_KEY {
        if let Err(error) = request.value.parse::<OutputFormat>() {
            return error_response(StatusCode::BAD_REQUEST, error);
        }
    }

    if let Err(error) = store.save(&key, &request.value).await {
        return settings_error_response(error);
    }

    info!(%key, "Setting updated");

    if let Err(error) = refresh_download_options(&store, &orchestrator, &config, &key).await {
        return settings_error_response(error);
    }

    HttpResponse::NoContent().finish()
}

pub(crate) async fn get_setting(store: Data<Arc<SettingsStore>>, key: Path<String>) -> HttpResponse {
    let key = key.into_inner();

    match store.get(&key).await {
        Ok(Some(value)) => HttpResponse::Ok().json(SettingResponse { value }),
        Ok(None) => error_response(StatusCode::NOT_FOUND, format!("Setting not found: {}", key)),
        Err(error) => settings_error_response(error),
    }
}

pub(crate) async fn delete_setting(
    store: Data<Arc<SettingsStore>>,
    orchestrator: Data<Arc<Orchestrator>>,
    config: Data<Arc<Config>>,
    key: Path<String>,
) -> HttpResponse {
    let key = key.into_inner();

    if let Err(error) = store.delete(&key).await {
        return settings_error_response(error);
    }

    info!(%key, "Setting removed");

    if let Err(error) = refresh_download_options(&store, &orchestrator, &config, &key).await {
        return settings_error_response(error);
    }

    HttpResponse::NoContent().finish()
}

/// Recomputes the active download options when `key` is one of the overrides.
async fn refresh_download_options(
    store: &SettingsStore,
    orchestrator: &Orchestrator,
    config: &Config,
    key: &str,
) -> Result<(), SettingsError> {
    if [OUTPUT_DIR_KEY, FORMAT_KEY, QUALITY_KEY].contains(&key) {
        let settings = store.get_all().await?;
        orchestrator.set_download_options(apply_overrides(
            config.default_download_options(),
            &settings,
        ));
    }

    Ok(())
}
