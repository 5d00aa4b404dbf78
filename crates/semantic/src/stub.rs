use async_trait::async_trait;
use fxhash::hash64;

use crate::vector::l2_normalize_in_place;
use crate::{Embedder, SemanticConfig, SemanticError};

/// Deterministic offline embedder used in `"fast"` mode and in tests.
///
/// Each whitespace token is hashed into one of `dimension` buckets with a hash-derived sign,
/// so texts sharing tokens point in similar directions. It is not a language model; it only
/// gives the engine a stable, cheap stand-in with sensible overlap behavior.
#[derive(Debug, Clone)]
pub struct StubEmbedder {
    model_name: String,
    dimension: usize,
    normalize: bool,
}

impl StubEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            model_name: "stub".into(),
            dimension: dimension.max(1),
            normalize: true,
        }
    }

    /// The label names the configured model but marks it as a stand-in, so stats never
    /// claim a real model served the vectors.
    pub fn from_config(cfg: &SemanticConfig) -> Self {
        Self {
            model_name: format!("stub({})", cfg.model_name),
            dimension: cfg.dimension.max(1),
            normalize: cfg.normalize,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dimension];
        for token in text.split_whitespace() {
            let h = hash64(token.to_uppercase().as_bytes());
            let bucket = (h % self.dimension as u64) as usize;
            let sign = if (h >> 63) == 0 { 1.0 } else { -1.0 };
            v[bucket] += sign;
        }
        if self.normalize {
            l2_normalize_in_place(&mut v);
        }
        v
    }
}

impl Default for StubEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, SemanticError> {
        Ok(self.embed_sync(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, SemanticError> {
        Ok(texts.iter().map(|t| self.embed_sync(t)).collect())
    }
}
