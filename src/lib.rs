//! Workspace umbrella crate for the vehicle homologation engine.
//!
//! This crate stitches together catalog loading, alias grouping, the embedding provider,
//! and the matcher so callers can go from a YAML file to ranked cross-references with a
//! single entry point, [`Homologator`].
//!
//! ```no_run
//! use homologador::{HomologConfig, Homologator, Query};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HomologConfig::from_file("homologador.yaml")?;
//! let homologator = Homologator::from_config(&config).await?;
//!
//! let query = Query::new("Toyota", "", "2020", "COR", "LE")?;
//! let results = homologator.homologate(&query).await?;
//! for (source, matches) in &results.0 {
//!     println!("{source}: {} candidates", matches.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;

pub use crate::config::{ConfigLoadError, HomologConfig};
pub use catalog::{
    normalize_record, Catalog, CatalogError, CatalogRecord, RawCatalogRecord, SourceProfile,
    SourceStats,
};
pub use matcher::{
    set_match_metrics, AliasGroupConfig, AliasTable, FlatMatch, MatchConfig, MatchError,
    MatchMetrics, MatchResult, Matcher, Query, RankedResults, TokenSortRatio,
};
pub use semantic::{
    build_embedder, CacheStats, Embedder, EmbeddingCache, SemanticConfig, SemanticError,
    StubEmbedder,
};

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

/// Errors that can occur while assembling a [`Homologator`]. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum HomologError {
    #[error(transparent)]
    Config(#[from] ConfigLoadError),
    #[error("catalog load failed: {0}")]
    Catalog(#[from] CatalogError),
    #[error("embedding provider setup failed: {0}")]
    Semantic(#[from] SemanticError),
    #[error(transparent)]
    Match(#[from] MatchError),
}

/// Snapshot of what a running [`Homologator`] holds.
#[derive(Debug, Clone, Serialize)]
pub struct HomologStats {
    pub records: usize,
    pub sources: Vec<SourceStats>,
    pub alias_groups: usize,
    pub model: String,
    pub embedding_cache: CacheStats,
}

/// Read-only catalog plus a configured matcher.
pub struct Homologator {
    catalog: Arc<Catalog>,
    matcher: Matcher,
}

impl Homologator {
    /// Loads every source, builds the alias table and embedder, and warms the cache.
    pub async fn from_config(config: &HomologConfig) -> Result<Self, HomologError> {
        config.validate()?;
        let embedder = build_embedder(&config.semantic)?;
        Self::with_embedder(config, embedder).await
    }

    /// Like [`from_config`](Self::from_config), with an explicit embedding provider.
    pub async fn with_embedder(
        config: &HomologConfig,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, HomologError> {
        let catalog = Catalog::load(&config.sources)?;
        let alias = AliasTable::from_config(&config.aliases);
        Self::from_parts(
            catalog,
            alias,
            embedder,
            config.matcher.clone(),
            config.semantic.batch_size,
            config.warm_embeddings,
        )
        .await
    }

    /// Assembles a homologator from already built parts.
    ///
    /// Sources flagged with `skip_submake_filter` are added to the matcher's exempt set.
    pub async fn from_parts(
        catalog: Catalog,
        alias: AliasTable,
        embedder: Arc<dyn Embedder>,
        mut match_config: MatchConfig,
        batch_size: usize,
        warm: bool,
    ) -> Result<Self, HomologError> {
        let start = Instant::now();
        match_config
            .submake_exempt_sources
            .extend(catalog.submake_exempt_sources());

        let cache = Arc::new(EmbeddingCache::new(embedder).with_batch_size(batch_size));
        if warm {
            cache.warm(catalog.distinct_descriptions()).await?;
        }

        let matcher = Matcher::new(
            Arc::new(alias),
            cache,
            Arc::new(TokenSortRatio),
            match_config,
        )?;

        info!(
            records = catalog.len(),
            sources = catalog.sources().len(),
            alias_groups = matcher.alias().group_count(),
            exempt_sources = ?matcher.config().submake_exempt_sources,
            elapsed_ms = start.elapsed().as_millis(),
            "homologator_ready"
        );
        Ok(Self {
            catalog: Arc::new(catalog),
            matcher,
        })
    }

    /// Ranks catalog entries for one query.
    pub async fn homologate(&self, query: &Query) -> Result<RankedResults, MatchError> {
        self.matcher.match_query(query, self.catalog.records()).await
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn stats(&self) -> HomologStats {
        let cache = self.matcher.embeddings();
        HomologStats {
            records: self.catalog.len(),
            sources: self.catalog.stats().to_vec(),
            alias_groups: self.matcher.alias().group_count(),
            model: cache.model_name().to_string(),
            embedding_cache: cache.stats(),
        }
    }
}
