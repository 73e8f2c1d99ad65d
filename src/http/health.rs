use actix_web::web::Data;
use actix_web::{HttpResponse, Responder};
use download_engine::DownloadEngine;
use std::sync::Arc;
use tracing::warn;

pub(crate) async fn health_check(engine: Data<Arc<DownloadEngine>>) -> impl Responder {
    let status = engine.check_binaries().await;

    if status.ytdlp && status.ffmpeg {
        HttpResponse::Ok().json(status)
    } else {
        warn!(ytdlp = status.ytdlp, ffmpeg = status.ffmpeg, "Required binaries are missing");
        HttpResponse::ServiceUnavailable().json(status)
    }
}
