use crate::config::Config;
use crate::services::orchestrator::Orchestrator;
use crate::services::EventFeed;
use crate::storage::settings::{apply_overrides, SettingsStore};
use actix_rt::signal::unix;
use actix_web::web::Data;
use actix_web::{web, App, HttpServer};
use catalog_providers::{CatalogResolver, DeezerClient};
use download_engine::DownloadEngine;
use futures_lite::FutureExt;
use search_providers::{MatchResolver, YouTubeClient};
use std::sync::Arc;
use tracing::{error, info, warn};

mod config;
mod http;
mod impls;
mod services;
mod storage;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[actix_rt::main]
async fn main() -> std::io::Result<()> {
    let mut terminate = unix::signal(unix::SignalKind::terminate())?;
    let mut interrupt = unix::signal(unix::SignalKind::interrupt())?;

    dotenv::dotenv().ok();
    env_logger::init();

    let config = Arc::from(Config::from_env());

    info!(version = VERSION, "Starting application...");

    let settings_store = Arc::new(SettingsStore::create(config.settings_directory.clone()));
    let download_options = match settings_store.get_all().await {
        Ok(settings) => apply_overrides(config.default_download_options(), &settings),
        Err(error) => {
            warn!(?error, "Unable to read stored settings");
            config.default_download_options()
        }
    };

    let catalog_resolver = Arc::new(CatalogResolver::new(Arc::new(DeezerClient::create(
        &config.catalog_api_url,
    ))));
    let match_resolver = Arc::new(MatchResolver::with_delay(
        Arc::new(YouTubeClient::create()),
        config.search_delay(),
    ));
    let download_engine = Arc::new(DownloadEngine::new(config.engine_config()));
    let event_feed = Arc::new(EventFeed::default());

    let binaries = download_engine.check_binaries().await;
    if !binaries.ytdlp || !binaries.ffmpeg {
        warn!(
            ytdlp = binaries.ytdlp,
            ffmpeg = binaries.ffmpeg,
            "Some required binaries are not available"
        );
    }

    let orchestrator = Arc::new(Orchestrator::new(
        match_resolver,
        download_engine.clone(),
        event_feed.clone(),
        download_options,
    ));

    let shutdown_orchestrator = Arc::clone(&orchestrator);
    let shutdown_timeout = config.shutdown_timeout;
    let bind_address = config.bind_address.clone();

    let server = HttpServer::new({
        move || {
            App::new()
                .app_data(Data::new(Arc::clone(&config)))
                .app_data(Data::new(Arc::clone(&catalog_resolver)))
                .app_data(Data::new(Arc::clone(&orchestrator)))
                .app_data(Data::new(Arc::clone(&download_engine)))
                .app_data(Data::new(Arc::clone(&event_feed)))
                .app_data(Data::new(Arc::clone(&settings_store)))
                .service(
                    web::resource("/playlist")
                        .route(web::post().to(http::load_playlist))
                        .route(web::get().to(http::get_playlist)),
                )
                .service(web::resource("/playlist/progress").route(web::get().to(http::get_progress)))
                .service(
                    web::resource("/playlist/selection")
                        .route(web::put().to(http::select_all_tracks)),
                )
                .service(
                    web::resource("/playlist/tracks/{track_id}/selection")
                        .route(web::put().to(http::select_track)),
                )
                .service(web::resource("/playlist/search").route(web::post().to(http::start_search)))
                .service(
                    web::resource("/playlist/download").route(web::post().to(http::start_download)),
                )
                .service(web::resource("/download/cancel").route(web::post().to(http::cancel_download)))
                .service(web::resource("/events").route(web::get().to(http::get_events)))
                .service(web::resource("/settings").route(web::get().to(http::get_settings)))
                .service(
                    web::resource("/settings/{key}")
                        .route(web::get().to(http::get_setting))
                        .route(web::put().to(http::update_setting))
                        .route(web::delete().to(http::delete_setting)),
                )
                .service(web::resource("/health").route(web::get().to(http::health_check)))
        }
    })
    .shutdown_timeout(shutdown_timeout)
    .bind(bind_address)?
    .run();

    let server_handle = server.handle();

    actix_rt::spawn({
        async move {
            if let Err(error) = server.await {
                error!(?error, "Error on http server");
            }
        }
    });

    info!("Application started");

    interrupt.recv().or(terminate.recv()).await;

    info!("Received shutdown signal. Shutting down gracefully...");

    if shutdown_orchestrator.cancel_current() {
        info!("Running download cancelled");
    }
    server_handle.stop(true).await;

    Ok(())
}
