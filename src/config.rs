//! Config handling

use std::time::Duration;

use tracing::log::LevelFilter;
use url::Url;

use crate::cli::CliOptions;
use crate::client::GenerationError;

/// Sets up logging based on the debug flag
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut logger = simple_logger::SimpleLogger::new().with_level(level);
    if !debug {
        logger = logger
            .with_module_level("tracing", LevelFilter::Warn)
            .with_module_level("rustls", LevelFilter::Info)
            .with_module_level("hyper_util", LevelFilter::Info)
            .with_module_level("reqwest", LevelFilter::Info)
            .with_module_level("tower_sessions", LevelFilter::Warn)
            .with_module_level("h2", LevelFilter::Info);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

/// Settings for the Gemini client.
#[derive(Clone, Debug)]
pub struct GeminiSettings {
    /// API key sent as `x-goog-api-key`.
    pub api_key: String,
    /// Model identifier, eg `gemini-2.5-flash-image`.
    pub model: String,
    /// Base URL the `models/...` path is joined onto.
    pub base_url: Url,
    /// Timeout for one generation call.
    pub timeout: Duration,
}

impl GeminiSettings {
    /// Builds settings from the command-line options.
    pub fn from_cli(cli: &CliOptions) -> Result<Self, GenerationError> {
        Self::new(
            &cli.gemini_api_key,
            &cli.model,
            &cli.api_base_url,
            Duration::from_secs(cli.request_timeout),
        )
    }

    /// Validates and normalizes the settings. The base URL always ends up with a trailing
    /// slash so relative joins keep its last path segment.
    pub fn new(
        api_key: &str,
        model: &str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(GenerationError::Config("missing Gemini API key".to_string()));
        }
        let model = model.trim();
        if model.is_empty() {
            return Err(GenerationError::Config("missing model name".to_string()));
        }
        let mut base_url =
            Url::parse(base_url).map_err(|err| GenerationError::Config(err.to_string()))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url,
            timeout,
        })
    }
}

/// Narrator interval from the command-line options, never zero.
pub fn narrator_interval(cli: &CliOptions) -> Duration {
    Duration::from_millis(cli.narrator_interval_ms.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let settings = GeminiSettings::new(
            "key",
            "gemini-2.5-flash-image",
            "http://127.0.0.1:1234/v1beta",
            Duration::from_secs(5),
        )
        .expect("valid settings");
        assert_eq!(settings.base_url.as_str(), "http://127.0.0.1:1234/v1beta/");
    }

    #[test]
    fn rejects_blank_key_and_bad_url() {
        assert!(
            GeminiSettings::new("  ", "m", "http://localhost/", Duration::from_secs(1)).is_err()
        );
        assert!(GeminiSettings::new("key", "m", "not a url", Duration::from_secs(1)).is_err());
        assert!(
            GeminiSettings::new("key", " ", "http://localhost/", Duration::from_secs(1)).is_err()
        );
    }
}
