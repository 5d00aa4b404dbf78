use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;

use catalog::CatalogRecord;
use semantic::{cosine_similarity, Embedder, EmbeddingCache};
use tracing::debug;

use crate::alias::{AliasGroup, AliasTable};
use crate::lexical::LexicalScorer;
use crate::metrics::metrics_recorder;
use crate::types::{MatchConfig, MatchError, MatchResult, Query, RankedResults};


/// Which filter stages to apply. All are on in normal operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterStages {
    pub brand: bool,
    pub submake: bool,
    pub year: bool,
    pub model: bool,
}

impl FilterStages {
    pub const ALL: FilterStages = FilterStages {
        brand: true,
        submake: true,
        year: true,
        model: true,
    };
}

impl Default for FilterStages {
    fn default() -> Self {
        Self::ALL
    }
}

/// Survivors after each stage, in stage order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageCounts {
    pub brand: usize,
    pub submake: usize,
    pub year: usize,
    pub model: usize,
}

/// Record make is in the query's brand group.
pub fn passes_brand(record: &CatalogRecord, brand_group: &AliasGroup) -> bool {
    brand_group.contains(&record.make)
}

/// `None` means the query has no sub-brand. Exempt sources always pass.
pub fn passes_submake(
    record: &CatalogRecord,
    submake_group: Option<&AliasGroup>,
    exempt_sources: &BTreeSet<String>,
) -> bool {
    match submake_group {
        None => true,
        Some(_) if exempt_sources.contains(&record.source) => true,
        Some(group) => group.contains(&record.submake),
    }
}

/// Years are compared by their decimal text.
pub fn passes_year(record: &CatalogRecord, year: &str) -> bool {
    record.year.to_string() == year
}

/// The type code equals the model code, or the description starts with the model code
/// followed by a space. An empty model code matches everything.
pub fn passes_model(record: &CatalogRecord, model_code: &str) -> bool {
    if model_code.is_empty() {
        return true;
    }
    record.type_id == model_code
        || record
            .description
            .strip_prefix(model_code)
            .is_some_and(|rest| rest.starts_with(' '))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Filters a catalog against a query and ranks survivors per source.
///
/// The matcher holds only read-only state, so one instance serves concurrent queries.
pub struct Matcher {
    alias: Arc<AliasTable>,
    embeddings: Arc<EmbeddingCache>,
    lexical: Arc<dyn LexicalScorer>,
    config: MatchConfig,
}

impl Matcher {
    pub fn new(
        alias: Arc<AliasTable>,
        embeddings: Arc<EmbeddingCache>,
        lexical: Arc<dyn LexicalScorer>,
        config: MatchConfig,
    ) -> Result<Self, MatchError> {
        config.validate()?;
        Ok(Self {
            alias,
            embeddings,
            lexical,
            config,
        })
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn alias(&self) -> &AliasTable {
        &self.alias
    }

    pub fn embeddings(&self) -> &Arc<EmbeddingCache> {
        &self.embeddings
    }

    /// Records surviving every filter stage, in catalog order.
    pub fn filter_candidates<'a>(
        &self,
        query: &Query,
        catalog: &'a [CatalogRecord],
    ) -> Vec<&'a CatalogRecord> {
        self.filter_with_stages(query, catalog, FilterStages::ALL).0
    }

    /// Like [`filter_candidates`](Self::filter_candidates) with individual stages switchable.
    pub fn filter_with_stages<'a>(
        &self,
        query: &Query,
        catalog: &'a [CatalogRecord],
        stages: FilterStages,
    ) -> (Vec<&'a CatalogRecord>, StageCounts) {
        let brand_group = self.alias.resolve_group(&query.make);
        let submake_group =
            (!query.submake.is_empty()).then(|| self.alias.resolve_group(&query.submake));
        let exempt = &self.config.submake_exempt_sources;

        let mut counts = StageCounts::default();
        let survivors = catalog
            .iter()
            .filter(|record| {
                if stages.brand && !passes_brand(record, &brand_group) {
                    return false;
                }
                counts.brand += 1;
                if stages.submake && !passes_submake(record, submake_group.as_ref(), exempt) {
                    return false;
                }
                counts.submake += 1;
                if stages.year && !passes_year(record, &query.year) {
                    return false;
                }
                counts.year += 1;
                if stages.model && !passes_model(record, &query.model_code) {
                    return false;
                }
                counts.model += 1;
                true
            })
            .collect();
        (survivors, counts)
    }

    /// Runs one query end to end.
    ///
    /// No survivors is an empty result, not an error. Any provider failure aborts the query.
    pub async fn match_query(
        &self,
        query: &Query,
        catalog: &[CatalogRecord],
    ) -> Result<RankedResults, MatchError> {
        let start = Instant::now();
        let outcome = self.rank(query, catalog).await;
        let latency = start.elapsed();

        if let Some(recorder) = metrics_recorder() {
            match &outcome {
                Ok((results, scored)) => recorder.record_match(latency, *scored, results.total()),
                Err(_) => recorder.record_failure(latency),
            }
        }
        outcome.map(|(results, _)| results)
    }

    async fn rank(
        &self,
        query: &Query,
        catalog: &[CatalogRecord],
    ) -> Result<(RankedResults, usize), MatchError> {
        let (candidates, counts) = self.filter_with_stages(query, catalog, FilterStages::ALL);
        debug!(
            make = %query.make,
            submake = %query.submake,
            year = %query.year,
            model = %query.model_code,
            catalog = catalog.len(),
            after_brand = counts.brand,
            after_submake = counts.submake,
            after_year = counts.year,
            after_model = counts.model,
            "match_filter_counts"
        );
        if candidates.is_empty() {
            return Ok((RankedResults::default(), 0));
        }

        let query_text = query.query_text();
        // Query texts are not cached; only catalog descriptions are.
        let query_vector = self.embeddings.inner().embed(&query_text).await?;

        let mut grouped: BTreeMap<String, Vec<MatchResult>> = BTreeMap::new();
        for record in &candidates {
            let description_vector = self.embeddings.get_or_embed(&record.description).await?;
            let cosine = cosine_similarity(&query_vector, &description_vector)? as f64;
            let semantic = (cosine * 100.0).clamp(0.0, 100.0);
            let lexical = self
                .lexical
                .token_sort_ratio(&query_text, &record.description)
                .clamp(0.0, 100.0);
            let score = round2((semantic + lexical) / 2.0);

            grouped
                .entry(record.source.clone())
                .or_default()
                .push(MatchResult::from_record(
                    record,
                    score,
                    round2(semantic),
                    round2(lexical),
                ));
        }

        for results in grouped.values_mut() {
            // `sort_by` is stable: equal scores keep catalog order.
            results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
            results.truncate(self.config.max_results_per_source);
        }

        Ok((RankedResults(grouped), candidates.len()))
    }
}
