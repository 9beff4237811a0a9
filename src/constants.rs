//! Shared constants for messages, limits and defaults
//!

use std::time::Duration;

/// Status lines the narrator cycles through while a thumbnail is generating.
pub const LOADING_MESSAGES: &[&str] = &[
    "Warming up the AI's creative circuits...",
    "Designing a scroll-stopping masterpiece...",
    "Optimizing for maximum clicks...",
    "Adding a touch of viral magic...",
    "Finalizing the pixels...",
];

/// How often the narrator advances, in milliseconds.
pub const NARRATOR_INTERVAL_MS: u64 = 2500;

/// Default narrator interval.
pub const NARRATOR_INTERVAL: Duration = Duration::from_millis(NARRATOR_INTERVAL_MS);

/// Shown when the title or the headshot is missing.
pub const VALIDATION_MESSAGE: &str = "Please provide both a video title and a headshot.";

/// Shown for any failure of the generation service.
pub const GENERATION_FAILED_MESSAGE: &str =
    "Failed to generate thumbnail. Please check your API key and try again.";

/// Shown when the selected headshot could not be read.
pub const READ_FAILED_MESSAGE: &str =
    "Could not read the selected headshot. Please choose the file again.";

/// Fallback media type when neither the upload nor the bytes identify the image.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Largest accepted multipart body.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Default Gemini image model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-image";

/// Default base URL of the Gemini REST API.
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

/// Default timeout for one generation call, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 120;

/// Seconds between page refreshes while a thumbnail is generating.
pub const LOADING_REFRESH_SECONDS: u64 = 2;

/// Cache-Control value for the generated thumbnail.
pub const THUMBNAIL_CACHE_CONTROL: &str = "no-cache";

/// Number of random bytes in a CSRF token.
pub const CSRF_TOKEN_BYTES: usize = 24;
