use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::SemanticError;

/// Runtime configuration describing which embedding provider to use and how to post-process
/// vectors.
///
/// # Example
/// ```
/// use semantic::SemanticConfig;
///
/// let cfg = SemanticConfig {
///     mode: "api".into(),
///     api_url: Some("https://router.huggingface.co/hf-inference/models/sentence-transformers/all-MiniLM-L6-v2/pipeline/feature-extraction".into()),
///     api_auth_header: Some("Bearer hf_xxx".into()),
///     api_provider: Some("hf".into()),
///     ..Default::default()
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SemanticConfig {
    /// Provider selector: `"fast"` (deterministic local stub), `"onnx"` (local model, needs the
    /// `onnx` feature), or `"api"` (remote HTTP).
    pub mode: String,
    /// Model label; also sent as `model` to OpenAI-style endpoints.
    pub model_name: String,
    /// Normalize vectors to unit length.
    pub normalize: bool,
    /// Vector dimension produced by the stub provider.
    pub dimension: usize,
    /// ONNX model file for `"onnx"` mode.
    pub model_path: Option<PathBuf>,
    /// `tokenizer.json` matching [`model_path`](Self::model_path).
    pub tokenizer_path: Option<PathBuf>,
    /// Token limit per text in `"onnx"` mode; longer inputs are truncated.
    pub max_sequence_length: usize,
    /// Inference endpoint when [`mode`](Self::mode) is `"api"`.
    pub api_url: Option<String>,
    /// Authorization header (e.g., `"Bearer hf_xxx"`).
    pub api_auth_header: Option<String>,
    /// Remote provider hint: `"hf"`, `"openai"`, or `"custom"` (default).
    pub api_provider: Option<String>,
    /// Overall API timeout in seconds.
    pub api_timeout_secs: Option<u64>,
    /// Texts per request when warming the embedding cache.
    pub batch_size: usize,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            mode: "fast".into(),
            model_name: "all-MiniLM-L6-v2".into(),
            normalize: true,
            dimension: 384,
            model_path: None,
            tokenizer_path: None,
            max_sequence_length: 256,
            api_url: None,
            api_auth_header: None,
            api_provider: None,
            api_timeout_secs: Some(30),
            batch_size: 32,
        }
    }
}

impl SemanticConfig {
    /// Checks mode-specific requirements. Environment overrides are applied by the provider
    /// itself, so `api_url` may legitimately be absent here when `HOMOLOG_SEMANTIC_API_URL`
    /// is set.
    pub fn validate(&self) -> Result<(), SemanticError> {
        match self.mode.as_str() {
            "fast" => {
                if self.dimension == 0 {
                    return Err(SemanticError::InvalidConfig(
                        "dimension must be greater than zero".into(),
                    ));
                }
            }
            "onnx" => {
                if self.model_path.is_none() || self.tokenizer_path.is_none() {
                    return Err(SemanticError::InvalidConfig(
                        "onnx mode requires model_path and tokenizer_path".into(),
                    ));
                }
                if self.max_sequence_length == 0 {
                    return Err(SemanticError::InvalidConfig(
                        "max_sequence_length must be greater than zero".into(),
                    ));
                }
            }
            "api" => {}
            other => {
                return Err(SemanticError::InvalidConfig(format!(
                    "unknown semantic mode '{other}' (expected \"fast\", \"onnx\" or \"api\")"
                )))
            }
        }
        if self.batch_size == 0 {
            return Err(SemanticError::InvalidConfig(
                "batch_size must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let cfg = SemanticConfig::default();
        assert_eq!(cfg.mode, "fast");
        assert_eq!(cfg.model_name, "all-MiniLM-L6-v2");
        assert_eq!(cfg.dimension, 384);
        assert!(cfg.normalize);
        assert!(cfg.api_url.is_none());
        assert_eq!(cfg.api_timeout_secs, Some(30));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn config_partial_json_uses_defaults() {
        let cfg: SemanticConfig =
            serde_json::from_str(r#"{ "mode": "api", "api_provider": "openai" }"#).unwrap();
        assert_eq!(cfg.mode, "api");
        assert_eq!(cfg.api_provider.as_deref(), Some("openai"));
        assert_eq!(cfg.batch_size, 32);
    }

    #[test]
    fn unknown_mode_rejected() {
        let cfg = SemanticConfig {
            mode: "gpu".into(),
            ..Default::default()
        };
        match cfg.validate() {
            Err(SemanticError::InvalidConfig(msg)) => assert!(msg.contains("gpu")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn onnx_mode_requires_model_files() {
        let mut cfg = SemanticConfig {
            mode: "onnx".into(),
            model_path: Some("models/all-MiniLM-L6-v2/model.onnx".into()),
            ..Default::default()
        };
        match cfg.validate() {
            Err(SemanticError::InvalidConfig(msg)) => assert!(msg.contains("tokenizer_path")),
            other => panic!("unexpected result: {other:?}"),
        }

        cfg.tokenizer_path = Some("models/all-MiniLM-L6-v2/tokenizer.json".into());
        assert!(cfg.validate().is_ok());

        cfg.max_sequence_length = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_batch_size_rejected() {
        let cfg = SemanticConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
