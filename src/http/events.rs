use crate::services::EventFeed;
use actix_web::web::{Data, Query};
use actix_web::{HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Deserialize)]
pub(crate) struct EventsQuery {
    #[serde(default)]
    since: u64,
}

pub(crate) async fn get_events(
    feed: Data<Arc<EventFeed>>,
    query: Query<EventsQuery>,
) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "events": feed.since(query.since),
        "last_seq": feed.last_seq(),
    }))
}
