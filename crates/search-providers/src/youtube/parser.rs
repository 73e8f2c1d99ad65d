use crate::{SearchResult, SearchResults, VideoId};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Malformed search response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Search response has no contents")]
    MissingContents,
}

fn text_of(value: Option<&Value>) -> String {
    let value = match value {
        Some(value) => value,
        None => return String::new(),
    };

    if let Some(text) = value.get("simpleText").and_then(Value::as_str) {
        return text.to_string();
    }

    value
        .get("runs")
        .and_then(Value::as_array)
        .map(|runs| {
            runs.iter()
                .filter_map(|run| run.get("text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default()
}

fn parse_video_renderer(renderer: &Value) -> Option<SearchResult> {
    let video_id = renderer.get("videoId").and_then(Value::as_str)?;

    let channel = match text_of(renderer.get("ownerText")) {
        channel if channel.is_empty() => text_of(renderer.get("longBylineText")),
        channel => channel,
    };

    Some(SearchResult {
        video_id: VideoId(video_id.to_string()),
        title: text_of(renderer.get("title")),
        channel,
        duration: text_of(renderer.get("lengthText")),
    })
}

// Renderers are nested in section lists, shelves and continuation items;
// a depth-first walk keeps them in display order whatever the layout.
fn collect_video_renderers<'a>(value: &'a Value, renderers: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key == "videoRenderer" {
                    renderers.push(child);
                } else {
                    collect_video_renderers(child, renderers);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_video_renderers(item, renderers);
            }
        }
        _ => (),
    }
}

pub(crate) fn parse_search_results(raw_json: &str) -> Result<SearchResults, ParseError> {
    let value: Value = serde_json::from_str(raw_json)?;

    let contents = value
        .get("contents")
        .or_else(|| value.get("onResponseReceivedCommands"))
        .ok_or(ParseError::MissingContents)?;

    let mut renderers = vec![];
    collect_video_renderers(contents, &mut renderers);

    Ok(renderers
        .into_iter()
        .filter_map(parse_video_renderer)
        .collect())
}
