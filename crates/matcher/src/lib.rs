//! # Homologador Matcher (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` is the core of the homologation engine. Given a structured vehicle query
//! (make, sub-make, year, model code, trim text) and the merged catalog produced by the
//! `catalog` crate, it narrows the catalog with a series of hard filters and ranks the
//! survivors per insurer with a blend of semantic and lexical similarity.
//!
//! Stages, in order (none re-admits a record an earlier stage rejected):
//!
//! 1. **Brand** - record make is in the alias group of the query make.
//! 2. **Sub-brand** - same, for sub-makes; skipped when the query has no sub-make and for
//!    sources listed in [`MatchConfig::submake_exempt_sources`].
//! 3. **Year** - exact match on the decimal year text.
//! 4. **Model** - type code equals the model code, or the description starts with the
//!    model code followed by a space. An empty model code disables this stage.
//! 5. **Scoring** - `semantic` is the cosine similarity of query text and description
//!    scaled to 0-100 (negative values clamp to 0); `lexical` is a token-sort ratio;
//!    `score` is their mean, rounded to two decimals.
//! 6. **Ranking** - per source, stable sort by descending score, truncated to
//!    [`MatchConfig::max_results_per_source`] (at most 10).
//!
//! ## Core Types
//!
//! - [`AliasTable`]: brand name -> equivalence set.
//! - [`Query`]: normalized query fields.
//! - [`Matcher`]: the engine, holding the alias table, an [`semantic::EmbeddingCache`],
//!   and a [`LexicalScorer`].
//! - [`RankedResults`]: per-source shortlists, flattenable into [`FlatMatch`] entries.
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use catalog::CatalogRecord;
//! use matcher::{AliasTable, MatchConfig, Matcher, Query, TokenSortRatio};
//! use semantic::{EmbeddingCache, StubEmbedder};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let catalog = vec![CatalogRecord {
//!     source: "chubb".into(),
//!     insurance_company_id: json!(1),
//!     make: "TOYOTA".into(),
//!     submake: "TOYOTA".into(),
//!     year: 2020,
//!     type_id: "COR".into(),
//!     make_id: json!(3),
//!     description: "COR LE SEDAN".into(),
//! }];
//!
//! let matcher = Matcher::new(
//!     Arc::new(AliasTable::from_groups([("TOYOTA", vec!["TOY"])])),
//!     Arc::new(EmbeddingCache::new(Arc::new(StubEmbedder::default()))),
//!     Arc::new(TokenSortRatio),
//!     MatchConfig::default(),
//! )
//! .unwrap();
//!
//! let query = Query::new("toyota", "", "2020", "cor", "le").unwrap();
//! let results = matcher.match_query(&query, &catalog).await.unwrap();
//! assert_eq!(results.get("chubb").unwrap()[0].description, "COR LE SEDAN");
//! # }
//! ```
//!
//! ## Observability
//!
//! Install a [`MatchMetrics`] implementation via [`set_match_metrics`] to record
//! per-query latency, scored candidates, and hit counts. Filter stage counts are logged
//! at `debug` level through `tracing`.

pub mod alias;
pub mod engine;
pub mod lexical;
pub mod metrics;
pub mod types;

pub use crate::alias::{AliasGroup, AliasGroupConfig, AliasTable};
pub use crate::engine::{
    passes_brand, passes_model, passes_submake, passes_year, FilterStages, Matcher, StageCounts,
};
pub use crate::lexical::{LexicalScorer, TokenSortRatio};
pub use crate::metrics::{set_match_metrics, MatchMetrics};
pub use crate::types::{
    FlatMatch, MatchConfig, MatchError, MatchResult, Query, RankedResults,
    MAX_RESULTS_PER_SOURCE,
};
