use super::csrf::{csrf_token, validate_csrf};
use super::prelude::*;
use crate::constants::{LOADING_REFRESH_SECONDS, MAX_UPLOAD_BYTES};
use crate::orchestrator::LifecycleState;
use crate::payload::{ImagePayload, PayloadError};
use crate::presenter::{View, present};
use axum::Json;
use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::response::Redirect;
use chrono::{DateTime, Utc};

#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub(crate) struct IndexTemplate {
    title: String,
    has_headshot: bool,
    headshot_preview: String,
    csrf_token: String,
    is_loading: bool,
    refresh_seconds: u64,
    max_upload_mb: usize,
    view_kind: &'static str,
    message: String,
    thumbnail_url: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct StatusResponse {
    status: &'static str,
    attempt: u64,
    message: Option<String>,
    thumbnail_url: Option<&'static str>,
    title: String,
    has_headshot: bool,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

fn unreadable(err: MultipartError) -> PayloadError {
    PayloadError::Io(std::io::Error::other(err.to_string()))
}

/// handles the / GET
pub(crate) async fn index_handler<C: GenerationClient>(
    State(state): State<AppState<C>>,
    session: Session,
) -> Result<IndexTemplate, ThumbsmithError> {
    let csrf_token = csrf_token(&session).await?;
    let snapshot = state.generator.snapshot().await;
    let view = present(&snapshot);

    let (message, thumbnail_url) = match &view {
        View::Placeholder => (String::new(), String::new()),
        View::Loading { message } | View::Error { message } => (message.clone(), String::new()),
        View::Thumbnail { data_url } => (String::new(), data_url.clone()),
    };

    Ok(IndexTemplate {
        title: snapshot.title,
        has_headshot: snapshot.headshot_preview.is_some(),
        headshot_preview: snapshot.headshot_preview.unwrap_or_default(),
        csrf_token,
        is_loading: snapshot.lifecycle.is_loading(),
        refresh_seconds: LOADING_REFRESH_SECONDS,
        max_upload_mb: MAX_UPLOAD_BYTES / (1024 * 1024),
        view_kind: view.kind(),
        message,
        thumbnail_url,
    })
}

/// handles the /generate POST
pub(crate) async fn generate_handler<C: GenerationClient>(
    State(state): State<AppState<C>>,
    session: Session,
    mut multipart: Multipart,
) -> Result<Redirect, ThumbsmithError> {
    let mut csrf_token_value: Option<String> = None;
    let mut title: Option<String> = None;
    let mut headshot: Option<Result<ImagePayload, PayloadError>> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            // an oversized or cut-off upload fails here, after the headshot part has started
            Err(err) if csrf_token_value.is_some() || headshot.is_some() => {
                headshot = Some(Err(unreadable(err)));
                break;
            }
            Err(err) => return Err(ThumbsmithError::InternalServerError(err.to_string())),
        };
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "csrf_token" => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| ThumbsmithError::InternalServerError(err.to_string()))?;
                csrf_token_value = Some(value);
            }
            "title" => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| ThumbsmithError::InternalServerError(err.to_string()))?;
                title = Some(value);
            }
            "headshot" => {
                let file_chosen = field.file_name().is_some_and(|name| !name.is_empty());
                let declared = field.content_type().map(str::to_owned);
                match field.bytes().await {
                    // an empty file input still sends a nameless, empty part
                    Ok(bytes) if bytes.is_empty() && !file_chosen => {}
                    Ok(bytes) => {
                        headshot = Some(ImagePayload::from_bytes(&bytes, declared.as_deref()));
                    }
                    Err(err) => {
                        headshot = Some(Err(unreadable(err)));
                        break;
                    }
                }
            }
            _ => {}
        }
    }

    let csrf_token_value = csrf_token_value.ok_or(ThumbsmithError::BadRequest)?;
    validate_csrf(&session, &csrf_token_value).await?;

    let generator = &state.generator;
    if let Some(title) = title {
        generator.set_title(title).await;
    }
    match headshot {
        Some(Ok(payload)) => {
            debug!(
                mime_type = payload.mime_type(),
                size = payload.size(),
                "headshot uploaded"
            );
            generator.set_headshot(payload).await;
        }
        Some(Err(err)) => {
            generator.report_unreadable_headshot(&err);
            return Ok(Redirect::to("/"));
        }
        None => {}
    }

    let outcome = generator.submit().await;
    info!(?outcome, "Form submitted");
    Ok(Redirect::to("/"))
}

/// handles the /status GET
pub(crate) async fn status_handler<C: GenerationClient>(
    State(state): State<AppState<C>>,
) -> Json<StatusResponse> {
    let snapshot = state.generator.snapshot().await;
    let message = match &snapshot.lifecycle {
        LifecycleState::Loading => snapshot.loading_message.map(str::to_string),
        LifecycleState::Failed { message } => Some(message.clone()),
        LifecycleState::Idle | LifecycleState::Succeeded { .. } => None,
    };
    let thumbnail_url = snapshot
        .lifecycle
        .thumbnail()
        .map(|_| "/thumbnail");

    Json(StatusResponse {
        status: snapshot.lifecycle.label(),
        attempt: snapshot.attempt,
        message,
        thumbnail_url,
        title: snapshot.title,
        has_headshot: snapshot.headshot_preview.is_some(),
        started_at: snapshot.started_at,
        finished_at: snapshot.finished_at,
    })
}
