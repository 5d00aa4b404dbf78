use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use homologador::{HomologError, MatchError};
use serde::{Deserialize, Serialize};

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Match error: {0}")]
    Match(#[from] MatchError),

    #[error("Startup error: {0}")]
    Startup(#[from] HomologError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found")]
    NotFound,
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ServerError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ServerError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Match(MatchError::InvalidQuery(_)) => StatusCode::BAD_REQUEST,
            ServerError::Match(MatchError::Provider(_)) => StatusCode::BAD_GATEWAY,
            ServerError::Match(MatchError::InvalidConfig(_))
            | ServerError::Startup(_)
            | ServerError::Internal(_)
            | ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::Authentication(_) => "AUTH_FAILED",
            ServerError::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::Match(MatchError::InvalidQuery(_)) => "INVALID_QUERY",
            ServerError::Match(MatchError::Provider(_)) => "PROVIDER_UNAVAILABLE",
            ServerError::Match(MatchError::InvalidConfig(_)) | ServerError::Config(_) => {
                "CONFIG_ERROR"
            }
            ServerError::Startup(_) => "STARTUP_ERROR",
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::NotFound => "NOT_FOUND",
        }
    }

    /// Message sent to the client. Server-side failures get a fixed text; details go to the log.
    fn public_message(&self) -> String {
        match self {
            ServerError::Match(MatchError::Provider(_)) => {
                "similarity provider unavailable, try again later".to_string()
            }
            ServerError::Match(MatchError::InvalidConfig(_))
            | ServerError::Startup(_)
            | ServerError::Internal(_)
            | ServerError::Config(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "request_failed");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.public_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<std::net::AddrParseError> for ServerError {
    fn from(err: std::net::AddrParseError) -> Self {
        ServerError::Config(format!("Invalid address: {err}"))
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(format!("IO error: {err}"))
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::BadRequest(format!("JSON parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homologador::SemanticError;

    #[test]
    fn invalid_query_is_bad_request() {
        let err = ServerError::from(MatchError::InvalidQuery("make must not be empty".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "INVALID_QUERY");
        assert!(err.public_message().contains("make must not be empty"));
    }

    #[test]
    fn provider_failure_hides_detail() {
        let err = ServerError::from(MatchError::Provider(SemanticError::Request(
            "connection refused to http://10.0.0.5/embed".into(),
        )));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert!(!err.public_message().contains("10.0.0.5"));
    }

    #[test]
    fn config_errors_are_internal() {
        let err = ServerError::Config("bad".into());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "internal server error");
    }
}
