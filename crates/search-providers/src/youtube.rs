mod parser;

use crate::{SearchProviderError, SearchResults, VideoSearchProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

pub use parser::ParseError;

const YOUTUBE_HOST: &str = "https://www.youtube.com";
const INNERTUBE_CLIENT_NAME: &str = "WEB";
const INNERTUBE_CLIENT_VERSION: &str = "2.20240726.00.00";
// Search filter restricting results to videos.
const VIDEO_TYPE_FILTER: &str = "EgIQAQ%3D%3D";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

pub fn watch_url(video_id: &str) -> String {
    format!("{}/watch?v={}", YOUTUBE_HOST, video_id)
}

pub struct YouTubeClient {
    client: Client,
    host: String,
}

impl YouTubeClient {
    pub fn create() -> Self {
        Self::with_host(YOUTUBE_HOST, REQUEST_TIMEOUT)
    }

    pub fn with_host(host: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP Client");

        Self {
            client,
            host: host.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for YouTubeClient {
    fn default() -> Self {
        Self::create()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InnertubeClient {
    client_name: &'static str,
    client_version: &'static str,
    hl: &'static str,
    gl: &'static str,
}

#[derive(Serialize)]
struct InnertubeContext {
    client: InnertubeClient,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    context: InnertubeContext,
    query: &'a str,
    params: &'static str,
}

#[async_trait]
impl VideoSearchProvider for YouTubeClient {
    async fn search_videos(&self, query: &str) -> Result<SearchResults, SearchProviderError> {
        debug!(query, "Searching videos...");

        let request = SearchRequest {
            context: InnertubeContext {
                client: InnertubeClient {
                    client_name: INNERTUBE_CLIENT_NAME,
                    client_version: INNERTUBE_CLIENT_VERSION,
                    hl: "en",
                    gl: "US",
                },
            },
            query,
            params: VIDEO_TYPE_FILTER,
        };

        let raw_json = self
            .client
            .post(format!("{}/youtubei/v1/search", self.host))
            .query(&[("prettyPrint", "false")])
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(parser::parse_search_results(&raw_json)?)
    }
}
