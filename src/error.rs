//! Error handling

use axum::response::IntoResponse;
use tracing::info;

/// Errors the web front end turns into HTTP responses.
#[derive(Debug)]
pub enum ThumbsmithError {
    /// When you didn't do the right thing
    BadRequest,
    /// Missing or invalid session
    Unauthorized,
    /// When a requested resource is not found
    NotFound(String),
    /// When an internal server error occurs
    InternalServerError(String),
}

impl From<std::io::Error> for ThumbsmithError {
    fn from(err: std::io::Error) -> Self {
        ThumbsmithError::InternalServerError(err.to_string())
    }
}

impl From<axum::http::Error> for ThumbsmithError {
    fn from(err: axum::http::Error) -> Self {
        ThumbsmithError::InternalServerError(err.to_string())
    }
}

impl From<tower_sessions::session::Error> for ThumbsmithError {
    fn from(err: tower_sessions::session::Error) -> Self {
        ThumbsmithError::InternalServerError(err.to_string())
    }
}

impl IntoResponse for ThumbsmithError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ThumbsmithError::BadRequest => {
                info!("Bad request received");
                (axum::http::StatusCode::BAD_REQUEST, "Bad Request")
            }
            ThumbsmithError::Unauthorized => {
                info!("Unauthorized request received");
                (
                    axum::http::StatusCode::UNAUTHORIZED,
                    "Unauthorized: invalid or missing session.",
                )
            }
            ThumbsmithError::NotFound(what) => {
                info!("404 {what}");
                (axum::http::StatusCode::NOT_FOUND, "Not Found")
            }
            ThumbsmithError::InternalServerError(message) => {
                tracing::error!("Internal server error: {}", message);
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                )
            }
        };
        let mut response = axum::response::Response::new(axum::body::Body::from(body));
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn errors_map_to_status_codes() {
        assert_eq!(
            ThumbsmithError::BadRequest.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ThumbsmithError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ThumbsmithError::NotFound("/thumbnail".into())
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ThumbsmithError::from(std::io::Error::other("disk"))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
