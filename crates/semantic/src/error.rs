use thiserror::Error;

/// Errors surfaced by embedding providers and vector helpers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SemanticError {
    /// Configuration is inconsistent (e.g., `api` mode without an endpoint).
    #[error("invalid semantic config: {0}")]
    InvalidConfig(String),
    /// The remote provider could not be reached or answered with a non-success status.
    #[error("embedding request failed: {0}")]
    Request(String),
    /// The provider answered, but the payload did not contain usable vectors.
    #[error("inference failure: {0}")]
    Inference(String),
    /// Two vectors of different dimension were compared.
    #[error("embedding dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_invalid_config() {
        let err = SemanticError::InvalidConfig("api_url is required".into());
        assert!(err.to_string().contains("invalid semantic config"));
        assert!(err.to_string().contains("api_url"));
    }

    #[test]
    fn error_request() {
        let err = SemanticError::Request("HTTP error 503".into());
        assert!(err.to_string().contains("embedding request failed"));
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn error_dimension_mismatch() {
        let err = SemanticError::DimensionMismatch {
            left: 384,
            right: 768,
        };
        assert_eq!(err.to_string(), "embedding dimension mismatch: 384 vs 768");
    }

    #[test]
    fn error_clone_preserves_message() {
        let err = SemanticError::Inference("empty response".into());
        assert_eq!(err.clone(), err);
        assert_eq!(format!("{err}"), format!("{}", err.clone()));
    }
}
