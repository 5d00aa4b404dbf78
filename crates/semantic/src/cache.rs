use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use tracing::info;

use crate::{Embedder, SemanticError};

/// Counters exposed by [`EmbeddingCache::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Text-keyed embedding cache in front of any [`Embedder`].
///
/// Catalog descriptions repeat heavily across sources, and the catalog never changes after
/// load, so vectors are computed once and shared as `Arc<[f32]>`. Concurrent readers never
/// block each other; two tasks missing on the same text may both compute it, and the later
/// insert wins with an identical vector.
pub struct EmbeddingCache {
    inner: Arc<dyn Embedder>,
    entries: DashMap<String, Arc<[f32]>>,
    batch_size: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl EmbeddingCache {
    pub fn new(inner: Arc<dyn Embedder>) -> Self {
        Self {
            inner,
            entries: DashMap::new(),
            batch_size: 32,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Texts per provider call during [`warm`](Self::warm).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn inner(&self) -> &Arc<dyn Embedder> {
        &self.inner
    }

    /// Returns the cached vector for `text`, computing and storing it on a miss.
    pub async fn get_or_embed(&self, text: &str) -> Result<Arc<[f32]>, SemanticError> {
        let cached = self.entries.get(text).map(|entry| Arc::clone(entry.value()));
        if let Some(vector) = cached {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(vector);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let vector: Arc<[f32]> = self.inner.embed(text).await?.into();
        self.entries.insert(text.to_string(), Arc::clone(&vector));
        Ok(vector)
    }

    /// Precomputes vectors for every text not yet cached, in provider batches.
    ///
    /// Returns the number of newly inserted entries. The first failing batch aborts warming;
    /// entries from earlier batches stay cached.
    pub async fn warm<'a, I>(&self, texts: I) -> Result<usize, SemanticError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let start = Instant::now();
        let mut seen = HashSet::new();
        let pending: Vec<&str> = texts
            .into_iter()
            .filter(|text| seen.insert(*text) && !self.entries.contains_key(*text))
            .collect();

        let mut inserted = 0;
        for chunk in pending.chunks(self.batch_size) {
            let vectors = self.inner.embed_batch(chunk).await?;
            if vectors.len() != chunk.len() {
                return Err(SemanticError::Inference(format!(
                    "provider returned {} embeddings for {} inputs",
                    vectors.len(),
                    chunk.len()
                )));
            }
            for (text, vector) in chunk.iter().zip(vectors) {
                self.entries.insert((*text).to_string(), vector.into());
                inserted += 1;
            }
        }

        info!(
            model = self.inner.model_name(),
            inserted,
            entries = self.entries.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "embedding_cache_warmed"
        );
        Ok(inserted)
    }

    pub fn contains(&self, text: &str) -> bool {
        self.entries.contains_key(text)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl Embedder for EmbeddingCache {
    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, SemanticError> {
        self.get_or_embed(text).await.map(|v| v.to_vec())
    }
}
