use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::api::ApiEmbedder;
use crate::stub::StubEmbedder;
use crate::{SemanticConfig, SemanticError};

/// Turns text into a dense vector.
///
/// Implementations must be deterministic for a given text within a process; the matcher
/// caches vectors by text and relies on repeat calls agreeing.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Label of the underlying model, for logs and stats.
    fn model_name(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, SemanticError>;

    /// Embeds several texts, preserving order. The default issues one call per text;
    /// providers with native batching override it.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, SemanticError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

/// Builds the provider selected by `cfg.mode`.
pub fn build_embedder(cfg: &SemanticConfig) -> Result<Arc<dyn Embedder>, SemanticError> {
    cfg.validate()?;
    let embedder: Arc<dyn Embedder> = match cfg.mode.as_str() {
        "api" => Arc::new(ApiEmbedder::from_config(cfg)?),
        "onnx" => onnx_embedder(cfg)?,
        _ => Arc::new(StubEmbedder::from_config(cfg)),
    };
    info!(
        mode = %cfg.mode,
        model = embedder.model_name(),
        "embedder_ready"
    );
    Ok(embedder)
}

#[cfg(feature = "onnx")]
fn onnx_embedder(cfg: &SemanticConfig) -> Result<Arc<dyn Embedder>, SemanticError> {
    Ok(Arc::new(crate::onnx::OnnxEmbedder::from_config(cfg)?))
}

#[cfg(not(feature = "onnx"))]
fn onnx_embedder(_cfg: &SemanticConfig) -> Result<Arc<dyn Embedder>, SemanticError> {
    Err(SemanticError::InvalidConfig(
        "onnx mode needs homolog-semantic built with the `onnx` feature".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_mode_builds_stub() {
        let embedder = build_embedder(&SemanticConfig::default()).unwrap();
        assert_eq!(embedder.model_name(), "stub(all-MiniLM-L6-v2)");
    }

    #[test]
    fn invalid_mode_is_rejected() {
        let cfg = SemanticConfig {
            mode: "gpu".into(),
            ..Default::default()
        };
        assert!(matches!(
            build_embedder(&cfg),
            Err(SemanticError::InvalidConfig(_))
        ));
    }

    #[test]
    fn onnx_mode_without_model_files_is_config_error() {
        let cfg = SemanticConfig {
            mode: "onnx".into(),
            model_path: Some("missing/model.onnx".into()),
            tokenizer_path: Some("missing/tokenizer.json".into()),
            ..Default::default()
        };
        assert!(matches!(
            build_embedder(&cfg),
            Err(SemanticError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn default_batch_preserves_order() {
        let embedder = build_embedder(&SemanticConfig::default()).unwrap();
        let batch = embedder.embed_batch(&["COR LE", "JETTA GLI"]).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], embedder.embed("COR LE").await.unwrap());
        assert_eq!(batch[1], embedder.embed("JETTA GLI").await.unwrap());
    }
}
