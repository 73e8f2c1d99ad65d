mod event_feed;
pub(crate) use event_feed::*;

pub(crate) mod orchestrator;
