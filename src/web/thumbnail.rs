use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::extract::State;
use axum::http::header::{
    CACHE_CONTROL, CONTENT_TYPE, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED,
};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use httpdate::{fmt_http_date, parse_http_date};

use super::AppState;
use crate::client::GenerationClient;
use crate::constants::{FALLBACK_MIME_TYPE, THUMBNAIL_CACHE_CONTROL};
use crate::error::ThumbsmithError;
use crate::orchestrator::GenerationState;

/// Each attempt produces at most one thumbnail, so the attempt number identifies it.
fn attempt_etag(attempt: u64) -> String {
    format!("\"attempt-{attempt}\"")
}

fn finished_at(state: &GenerationState) -> Option<SystemTime> {
    let secs = u64::try_from(state.finished_at()?.timestamp()).ok()?;
    Some(UNIX_EPOCH + Duration::from_secs(secs))
}

/// Whether the client already holds the thumbnail of `state`'s attempt.
fn client_is_current(headers: &HeaderMap, state: &GenerationState) -> bool {
    if let Some(value) = headers.get(IF_NONE_MATCH) {
        let etag = attempt_etag(state.attempt());
        return value.to_str().is_ok_and(|value| {
            value
                .split(',')
                .map(str::trim)
                .any(|candidate| candidate == "*" || candidate.trim_start_matches("W/") == etag)
        });
    }
    let since = headers
        .get(IF_MODIFIED_SINCE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| parse_http_date(value).ok());
    matches!((since, finished_at(state)), (Some(since), Some(finished)) if finished <= since)
}

/// Serves the latest generated thumbnail as raw bytes.
pub(crate) async fn thumbnail_handler<C: GenerationClient>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
) -> Result<Response, ThumbsmithError> {
    let current = state.generator.state();
    let Some(thumbnail) = current.lifecycle().thumbnail() else {
        return Err(ThumbsmithError::NotFound("/thumbnail".to_string()));
    };

    let mut cache = HeaderMap::new();
    cache.insert(CACHE_CONTROL, HeaderValue::from_static(THUMBNAIL_CACHE_CONTROL));
    if let Ok(etag) = HeaderValue::from_str(&attempt_etag(current.attempt())) {
        cache.insert(ETAG, etag);
    }
    if let Some(modified) = finished_at(&current)
        && let Ok(value) = HeaderValue::from_str(&fmt_http_date(modified))
    {
        cache.insert(LAST_MODIFIED, value);
    }

    if client_is_current(&headers, &current) {
        return Ok((StatusCode::NOT_MODIFIED, cache).into_response());
    }

    let bytes = thumbnail
        .decode()
        .map_err(|err| ThumbsmithError::InternalServerError(err.to_string()))?;
    let content_type = HeaderValue::from_str(&thumbnail.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_MIME_TYPE));
    Ok((cache, [(CONTENT_TYPE, content_type)], bytes).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::GeneratedThumbnail;

    fn settled_state() -> GenerationState {
        let mut state = GenerationState::default();
        for _ in 0..3 {
            let attempt = state.begin().expect("not loading");
            state.succeed(attempt, GeneratedThumbnail::new("aGk=", "image/png"));
        }
        state
    }

    #[test]
    fn etag_names_the_attempt() {
        let state = settled_state();
        let mut headers = HeaderMap::new();
        assert!(!client_is_current(&headers, &state));

        headers.insert(
            IF_NONE_MATCH,
            HeaderValue::from_static("\"attempt-2\", \"attempt-3\""),
        );
        assert!(client_is_current(&headers, &state));

        headers.insert(IF_NONE_MATCH, HeaderValue::from_static("W/\"attempt-3\""));
        assert!(client_is_current(&headers, &state));

        headers.insert(IF_NONE_MATCH, HeaderValue::from_static("\"attempt-4\""));
        assert!(!client_is_current(&headers, &state));
    }

    #[test]
    fn modified_since_compares_whole_seconds() {
        let state = settled_state();
        let finished = finished_at(&state).expect("finished");

        let mut headers = HeaderMap::new();
        let at = HeaderValue::from_str(&fmt_http_date(finished)).expect("http date");
        headers.insert(IF_MODIFIED_SINCE, at);
        assert!(client_is_current(&headers, &state));

        let before = HeaderValue::from_str(&fmt_http_date(finished - Duration::from_secs(1)))
            .expect("http date");
        headers.insert(IF_MODIFIED_SINCE, before);
        assert!(!client_is_current(&headers, &state));
    }
}
