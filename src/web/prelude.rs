pub(crate) use crate::client::GenerationClient;
pub(crate) use crate::error::ThumbsmithError;
pub(crate) use crate::web::AppState;
pub(crate) use askama::Template;
pub(crate) use askama_web::WebTemplate;
pub(crate) use axum::extract::State;
pub(crate) use serde::Serialize;
pub(crate) use tower_sessions::Session;
pub(crate) use tracing::{debug, info};
