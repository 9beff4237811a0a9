//! Web front end: the form, the status API and the generated image.

use std::num::NonZeroU16;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use tower_sessions::{MemoryStore, SessionManagerLayer};
use tracing::{error, info};

use crate::client::GenerationClient;
use crate::constants::MAX_UPLOAD_BYTES;
use crate::orchestrator::Generator;

mod csrf;
mod prelude;
mod thumbnail;
mod views;

use thumbnail::thumbnail_handler;
use views::{generate_handler, index_handler, status_handler};

pub(crate) struct AppState<C> {
    generator: Generator<C>,
}

impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            generator: self.generator.clone(),
        }
    }
}

/// Builds the application router around `generator`.
pub fn create_router<C: GenerationClient>(generator: Generator<C>) -> Router {
    let sessions = SessionManagerLayer::new(MemoryStore::default()).with_secure(false);

    Router::new()
        .route("/", axum::routing::get(index_handler::<C>))
        .route("/generate", axum::routing::post(generate_handler::<C>))
        .route("/status", axum::routing::get(status_handler::<C>))
        .route("/thumbnail", axum::routing::get(thumbnail_handler::<C>))
        .route("/static/styles.css", axum::routing::get(styles_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(sessions)
        .with_state(AppState { generator })
}

async fn styles_handler() -> impl IntoResponse {
    const STYLES: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/static/styles.css"));
    ([(CONTENT_TYPE, "text/css")], STYLES)
}

/// Serves the application until Ctrl-C.
pub async fn setup_server<C: GenerationClient>(
    listen_addr: &str,
    port: NonZeroU16,
    generator: Generator<C>,
) -> Result<(), anyhow::Error> {
    let app = create_router(generator);

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", err);
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
