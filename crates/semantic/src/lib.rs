//! Homologador Semantic Layer
//!
//! Turns catalog descriptions and query text into dense vectors and compares them. The
//! matcher only sees the [`Embedder`] trait, so the provider can be swapped without touching
//! scoring.
//!
//! Providers:
//!
//! - **Fast mode** - [`StubEmbedder`], a deterministic token-hashing embedder. No network,
//!   no model files; used for tests and offline runs.
//! - **ONNX mode** - `OnnxEmbedder` (behind the `onnx` feature), local inference of an
//!   exported sentence-transformer with attention-mask mean pooling.
//! - **API mode** - [`ApiEmbedder`], which calls a remote feature-extraction endpoint
//!   (Hugging Face router, OpenAI embeddings, or a custom `{"texts": [...]}` service).
//!
//! [`EmbeddingCache`] sits in front of either one. Catalog descriptions are warmed once at
//! startup and shared read-only afterwards, so the per-query cost is a single embedding of
//! the query text.
//!
//! ## Env vars to know
//!
//! - `HOMOLOG_SEMANTIC_API_URL` - Override the API endpoint
//! - `HOMOLOG_SEMANTIC_API_TOKEN` - Bearer token when no `api_auth_header` is configured
//!
//! ## Quick example
//!
//! ```
//! use semantic::{cosine_similarity, Embedder, StubEmbedder};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let embedder = StubEmbedder::default();
//! let a = embedder.embed("COR LE").await.unwrap();
//! let b = embedder.embed("COR LE SEDAN").await.unwrap();
//! assert!(cosine_similarity(&a, &b).unwrap() > 0.5);
//! # }
//! ```

pub mod config;
pub mod error;

mod api;
mod cache;
mod embedder;
#[cfg(feature = "onnx")]
mod onnx;
mod pooling;
mod stub;
mod vector;

pub use crate::api::{ApiEmbedder, API_TOKEN_ENV, API_URL_ENV};
pub use crate::cache::{CacheStats, EmbeddingCache};
pub use crate::config::SemanticConfig;
pub use crate::embedder::{build_embedder, Embedder};
pub use crate::error::SemanticError;
#[cfg(feature = "onnx")]
pub use crate::onnx::OnnxEmbedder;
pub use crate::pooling::mean_pool;
pub use crate::stub::StubEmbedder;
pub use crate::vector::{cosine_similarity, l2_normalize_in_place};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn stub_determinism_through_cache() {
        let cfg = SemanticConfig::default();
        let embedder = build_embedder(&cfg).unwrap();
        let cache = EmbeddingCache::new(embedder).with_batch_size(cfg.batch_size);

        let e1 = cache.get_or_embed("VERSA ADVANCE").await.unwrap();
        let e2 = cache.get_or_embed("VERSA ADVANCE").await.unwrap();
        assert!(Arc::ptr_eq(&e1, &e2));
        assert_eq!(e1.len(), cfg.dimension);
    }

    #[tokio::test]
    async fn api_mode_without_endpoint_is_config_error() {
        if std::env::var(API_URL_ENV).is_ok() {
            return;
        }
        let cfg = SemanticConfig {
            mode: "api".into(),
            ..Default::default()
        };
        assert!(matches!(
            build_embedder(&cfg),
            Err(SemanticError::InvalidConfig(_))
        ));
    }
}
