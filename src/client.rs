//! The external image generation service and its Gemini implementation.

use std::future::Future;
use std::time::Instant;

use base64::Engine;
use base64::engine::general_purpose;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::config::GeminiSettings;

/// Errors returned by a [`GenerationClient`].
#[derive(Debug)]
pub enum GenerationError {
    /// The client was configured with unusable settings.
    Config(String),
    /// Network or HTTP failure.
    Http(reqwest::Error),
    /// The service answered with a non-success status.
    Api {
        /// HTTP status code.
        status: u16,
        /// Body of the error response, trimmed.
        message: String,
    },
    /// The service refused the prompt or the image.
    Blocked(String),
    /// The response contained no image.
    NoImage,
    /// The returned image was not valid base64.
    Decode(base64::DecodeError),
}

impl std::fmt::Display for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(message) => write!(f, "invalid client configuration: {message}"),
            Self::Http(err) => write!(f, "request to generation service failed: {err}"),
            Self::Api { status, message } => write!(f, "API error: {status} - {message}"),
            Self::Blocked(reason) => write!(f, "content blocked: {reason}"),
            Self::NoImage => write!(f, "response did not contain an image"),
            Self::Decode(err) => write!(f, "failed to decode returned image: {err}"),
        }
    }
}

impl std::error::Error for GenerationError {}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err)
    }
}

/// A thumbnail returned by the generation service, still base64 encoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedThumbnail {
    /// Base64 image text.
    pub data: String,
    /// Media type of the image.
    pub mime_type: String,
}

impl GeneratedThumbnail {
    /// Creates a thumbnail from base64 text and its media type.
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Returns the image as a data URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Decodes the image bytes.
    pub fn decode(&self) -> Result<Vec<u8>, GenerationError> {
        general_purpose::STANDARD
            .decode(&self.data)
            .map_err(GenerationError::Decode)
    }
}

/// Something that turns a title and a headshot into a thumbnail.
pub trait GenerationClient: Send + Sync + 'static {
    /// Generates a thumbnail for `title` from the base64 `image` of type `mime_type`.
    fn generate_thumbnail(
        &self,
        title: &str,
        image: &str,
        mime_type: &str,
    ) -> impl Future<Output = Result<GeneratedThumbnail, GenerationError>> + Send;
}

/// Builds the instruction sent alongside the headshot.
pub fn thumbnail_prompt(title: &str) -> String {
    format!(
        "Create a click-worthy 16:9 YouTube thumbnail for a video titled \"{title}\". \
         Feature the person from the provided headshot prominently with an expressive face. \
         Add the title as short, bold, highly readable text. Use vibrant colors, strong \
         contrast and a clean background that fits the topic. Do not add logos or watermarks."
    )
}

/// Gemini `generateContent` client.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    client: reqwest::Client,
    settings: GeminiSettings,
}

impl GeminiClient {
    /// Creates a client with its own HTTP connection pool.
    pub fn new(settings: GeminiSettings) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self { client, settings })
    }

    /// Model this client asks for.
    pub fn model(&self) -> &str {
        &self.settings.model
    }

    /// Full URL of the `generateContent` call.
    pub fn endpoint(&self) -> Result<Url, GenerationError> {
        self.settings
            .base_url
            .join(&format!("models/{}:generateContent", self.settings.model))
            .map_err(|err| GenerationError::Config(err.to_string()))
    }

    #[instrument(skip_all, fields(model = %self.settings.model, title_len = title.len()))]
    async fn generate_impl(
        &self,
        title: &str,
        image: &str,
        mime_type: &str,
    ) -> Result<GeneratedThumbnail, GenerationError> {
        let start = Instant::now();
        let body = GeminiRequest::new(title, image, mime_type);

        let response = self
            .client
            .post(self.endpoint()?)
            .header("x-goog-api-key", &self.settings.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message: text.trim().to_string(),
            });
        }

        let parsed: GeminiResponse = response.json().await?;
        let thumbnail = parsed.into_thumbnail()?;
        debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            mime_type = %thumbnail.mime_type,
            "thumbnail received"
        );
        Ok(thumbnail)
    }
}

impl GenerationClient for GeminiClient {
    async fn generate_thumbnail(
        &self,
        title: &str,
        image: &str,
        mime_type: &str,
    ) -> Result<GeneratedThumbnail, GenerationError> {
        self.generate_impl(title, image, mime_type).await
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text { text: String },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
}

impl GeminiRequest {
    fn new(title: &str, image: &str, mime_type: &str) -> Self {
        let parts = vec![
            GeminiRequestPart::InlineData {
                inline_data: InlineData {
                    mime_type: mime_type.to_string(),
                    data: image.to_string(),
                },
            },
            GeminiRequestPart::Text {
                text: thumbnail_prompt(title),
            },
        ];
        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: vec!["IMAGE".to_string(), "TEXT".to_string()],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    inline_data: Option<InlineData>,
}

impl GeminiResponse {
    fn into_thumbnail(self) -> Result<GeneratedThumbnail, GenerationError> {
        if let Some(reason) = self.prompt_feedback.and_then(|feedback| feedback.block_reason) {
            return Err(GenerationError::Blocked(reason));
        }

        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or(GenerationError::NoImage)?;

        if let Some(reason) = candidate.finish_reason.as_deref()
            && matches!(
                reason,
                "SAFETY"
                    | "IMAGE_SAFETY"
                    | "IMAGE_PROHIBITED_CONTENT"
                    | "PROHIBITED_CONTENT"
                    | "RECITATION"
                    | "BLOCKLIST"
            )
        {
            return Err(GenerationError::Blocked(reason.to_string()));
        }

        candidate
            .content
            .into_iter()
            .flat_map(|content| content.parts)
            .find_map(|part| part.inline_data)
            .filter(|inline| !inline.data.is_empty())
            .map(|inline| GeneratedThumbnail::new(inline.data, inline.mime_type))
            .ok_or(GenerationError::NoImage)
    }
}
