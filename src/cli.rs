//! CLI parser
use clap::Parser;
use std::num::NonZeroU16;

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_GEMINI_MODEL, DEFAULT_REQUEST_TIMEOUT_SECONDS,
    NARRATOR_INTERVAL_MS,
};

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "THUMBSMITH_DEBUG")]
    /// Enable debug logging. Env: THUMBSMITH_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "9000", env = "THUMBSMITH_PORT")]
    /// http listener, defaults to `9000`.
    /// Env: THUMBSMITH_PORT
    pub port: NonZeroU16,
    #[clap(
        long,
        short,
        default_value = "127.0.0.1",
        env = "THUMBSMITH_LISTEN_ADDRESS"
    )]
    /// Listen address, defaults to `127.0.0.1`.
    /// Env: THUMBSMITH_LISTEN_ADDRESS
    pub listen_address: String,

    #[clap(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    /// Gemini API key.
    /// Env: GEMINI_API_KEY
    pub gemini_api_key: String,

    #[clap(long, short, default_value = DEFAULT_GEMINI_MODEL, env = "THUMBSMITH_MODEL")]
    /// Image model to ask for the thumbnail.
    /// Env: THUMBSMITH_MODEL
    pub model: String,

    #[clap(long, default_value = DEFAULT_API_BASE_URL, env = "THUMBSMITH_API_BASE_URL")]
    /// Base URL of the Gemini REST API.
    /// Env: THUMBSMITH_API_BASE_URL
    pub api_base_url: String,

    #[clap(
        long,
        default_value_t = DEFAULT_REQUEST_TIMEOUT_SECONDS,
        env = "THUMBSMITH_REQUEST_TIMEOUT"
    )]
    /// Seconds to wait for one generation call.
    /// Env: THUMBSMITH_REQUEST_TIMEOUT
    pub request_timeout: u64,

    #[clap(
        long,
        default_value_t = NARRATOR_INTERVAL_MS,
        env = "THUMBSMITH_NARRATOR_INTERVAL_MS"
    )]
    /// Milliseconds between progress messages.
    /// Env: THUMBSMITH_NARRATOR_INTERVAL_MS
    pub narrator_interval_ms: u64,
}
