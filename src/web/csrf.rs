use base64::Engine;
use base64::engine::general_purpose;
use tower_sessions::Session;

use crate::constants::CSRF_TOKEN_BYTES;
use crate::error::ThumbsmithError;

const CSRF_TOKEN_KEY: &str = "csrf_token";

fn generate_token() -> String {
    let bytes: [u8; CSRF_TOKEN_BYTES] = rand::random();
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

pub(crate) async fn csrf_token(session: &Session) -> Result<String, ThumbsmithError> {
    let existing = session.get::<String>(CSRF_TOKEN_KEY).await?;
    let token = existing.unwrap_or_else(generate_token);
    session.insert(CSRF_TOKEN_KEY, token.clone()).await?;
    Ok(token)
}

pub(crate) async fn validate_csrf(session: &Session, token: &str) -> Result<(), ThumbsmithError> {
    let stored = session.get::<String>(CSRF_TOKEN_KEY).await?;
    match stored {
        Some(expected) if !token.is_empty() && expected == token => Ok(()),
        _ => Err(ThumbsmithError::Unauthorized),
    }
}
