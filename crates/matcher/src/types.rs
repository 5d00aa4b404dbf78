use std::collections::{BTreeMap, BTreeSet};

use catalog::{normalize_text, CatalogRecord};
use semantic::SemanticError;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Hard cap on results kept per source.
pub const MAX_RESULTS_PER_SOURCE: usize = 10;

/// Engine-wide settings, fixed at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchConfig {
    /// Results kept per source after ranking.
    #[serde(default = "MatchConfig::default_max_results_per_source")]
    pub max_results_per_source: usize,
    /// Sources whose catalogs do not populate sub-brands reliably; the sub-brand
    /// filter is skipped for their records.
    #[serde(default)]
    pub submake_exempt_sources: BTreeSet<String>,
}

impl MatchConfig {
    pub(crate) fn default_max_results_per_source() -> usize {
        MAX_RESULTS_PER_SOURCE
    }

    pub fn with_exempt_source(mut self, source: impl Into<String>) -> Self {
        self.submake_exempt_sources.insert(source.into());
        self
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if self.max_results_per_source == 0 {
            return Err(MatchError::InvalidConfig(
                "max_results_per_source must be greater than zero".into(),
            ));
        }
        if self.max_results_per_source > MAX_RESULTS_PER_SOURCE {
            return Err(MatchError::InvalidConfig(format!(
                "max_results_per_source must be at most {MAX_RESULTS_PER_SOURCE}"
            )));
        }
        if self
            .submake_exempt_sources
            .iter()
            .any(|s| s.trim().is_empty())
        {
            return Err(MatchError::InvalidConfig(
                "submake_exempt_sources must not contain empty names".into(),
            ));
        }
        Ok(())
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_results_per_source: Self::default_max_results_per_source(),
            submake_exempt_sources: BTreeSet::new(),
        }
    }
}

/// A normalized homologation query. Text fields are uppercased and trimmed on construction.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub make: String,
    /// Empty means "no sub-brand constraint".
    pub submake: String,
    /// Kept as text; catalog years are compared by their decimal rendering.
    pub year: String,
    /// Empty means "no model anchor".
    pub model_code: String,
    pub trim_text: String,
}

impl Query {
    pub fn new(
        make: impl AsRef<str>,
        submake: impl AsRef<str>,
        year: impl AsRef<str>,
        model_code: impl AsRef<str>,
        trim_text: impl AsRef<str>,
    ) -> Result<Self, MatchError> {
        let query = Self {
            make: normalize_text(make.as_ref()),
            submake: normalize_text(submake.as_ref()),
            year: year.as_ref().trim().to_string(),
            model_code: normalize_text(model_code.as_ref()),
            trim_text: normalize_text(trim_text.as_ref()),
        };
        if query.make.is_empty() {
            return Err(MatchError::InvalidQuery("make must not be empty".into()));
        }
        if query.year.is_empty() {
            return Err(MatchError::InvalidQuery("year must not be empty".into()));
        }
        Ok(query)
    }

    /// `"{model_code} {trim_text}"`, trimmed; the text compared against descriptions.
    pub fn query_text(&self) -> String {
        format!("{} {}", self.model_code, self.trim_text)
            .trim()
            .to_string()
    }
}

/// One ranked candidate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    /// Mean of the semantic and lexical scores, 0-100, two decimals.
    pub score: f64,
    pub semantic_score: f64,
    pub lexical_score: f64,
    pub description: String,
    pub year: i32,
    pub type_id: String,
    pub make_id: JsonValue,
    pub insurance_company_id: JsonValue,
}

impl MatchResult {
    pub(crate) fn from_record(
        record: &CatalogRecord,
        score: f64,
        semantic_score: f64,
        lexical_score: f64,
    ) -> Self {
        Self {
            score,
            semantic_score,
            lexical_score,
            description: record.description.clone(),
            year: record.year,
            type_id: record.type_id.clone(),
            make_id: record.make_id.clone(),
            insurance_company_id: record.insurance_company_id.clone(),
        }
    }
}

/// A [`MatchResult`] tagged with its source, for the flattened response shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlatMatch {
    pub source: String,
    #[serde(flatten)]
    pub result: MatchResult,
}

/// Per-source ranked shortlists. Sources without surviving candidates are absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct RankedResults(pub BTreeMap<String, Vec<MatchResult>>);

impl RankedResults {
    pub fn get(&self, source: &str) -> Option<&[MatchResult]> {
        self.0.get(source).map(Vec::as_slice)
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of results across sources.
    pub fn total(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    /// One entry per result, sources in key order, ranks preserved within a source.
    pub fn flatten(&self) -> Vec<FlatMatch> {
        self.0
            .iter()
            .flat_map(|(source, results)| {
                results.iter().map(move |result| FlatMatch {
                    source: source.clone(),
                    result: result.clone(),
                })
            })
            .collect()
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<MatchResult>> {
        self.0
    }
}

/// Errors produced by the matching layer.
#[derive(Debug, Error)]
pub enum MatchError {
    /// The query is missing a required field.
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    /// Invalid engine configuration.
    #[error("invalid match config: {0}")]
    InvalidConfig(String),
    /// The embedding provider failed; the whole query is aborted.
    #[error("similarity provider failed: {0}")]
    Provider(#[from] SemanticError),
}
