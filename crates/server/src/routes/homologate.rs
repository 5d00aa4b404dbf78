use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use homologador::{FlatMatch, MatchResult, Query, RankedResults};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Model year as sent by clients: `2020` and `"2020"` are both accepted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum YearField {
    Number(i64),
    Text(String),
}

impl YearField {
    pub fn to_text(&self) -> String {
        match self {
            YearField::Number(n) => n.to_string(),
            YearField::Text(s) => s.trim().to_string(),
        }
    }
}

/// Homologation request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomologateRequest {
    pub make: String,

    /// Sub-brand; empty skips the sub-brand filter
    #[serde(default)]
    pub submake: String,

    pub year: YearField,

    /// Short model/type code; empty disables the model anchor
    #[serde(default, alias = "model")]
    pub model_code: String,

    /// Version or trim description
    #[serde(default, alias = "version")]
    pub trim_text: String,
}

impl HomologateRequest {
    fn to_query(&self) -> ServerResult<Query> {
        Ok(Query::new(
            &self.make,
            &self.submake,
            self.year.to_text(),
            &self.model_code,
            &self.trim_text,
        )?)
    }
}

/// Grouped response: one ranked list per source
#[derive(Debug, Serialize)]
pub struct HomologateResponse {
    pub query: Query,
    pub total_matches: usize,
    pub results: RankedResults,
}

/// Flattened response: one entry per match, tagged with its source
#[derive(Debug, Serialize)]
pub struct FlatHomologateResponse {
    pub query: Query,
    pub total_matches: usize,
    pub matches: Vec<FlatMatch>,
}

/// Request body of the legacy `/homologar` endpoint
#[derive(Debug, Deserialize)]
pub struct LegacyRequest {
    pub marca: String,
    #[serde(default)]
    pub submarca: String,
    #[serde(rename = "año", alias = "anio")]
    pub anio: YearField,
    pub modelo: String,
    pub version: String,
}

/// One entry of the legacy response
#[derive(Debug, Serialize)]
pub struct LegacyMatch {
    pub score: f64,
    pub sbert: f64,
    pub fuzz: f64,
    pub description: String,
    pub year: i32,
    #[serde(rename = "typeId")]
    pub type_id: String,
    #[serde(rename = "makeId")]
    pub make_id: JsonValue,
}

impl From<MatchResult> for LegacyMatch {
    fn from(result: MatchResult) -> Self {
        Self {
            score: result.score,
            sbert: result.semantic_score,
            fuzz: result.lexical_score,
            description: result.description,
            year: result.year,
            type_id: result.type_id,
            make_id: result.make_id,
        }
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ServerResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ServerError::BadRequest(rejection.body_text()))
}

async fn run(state: &ServerState, query: &Query) -> ServerResult<RankedResults> {
    let results = state.homologator.homologate(query).await?;
    tracing::debug!(
        make = %query.make,
        year = %query.year,
        model = %query.model_code,
        sources = results.0.len(),
        total = results.total(),
        "homologation_served"
    );
    Ok(results)
}

/// Rank catalog entries per source for one vehicle description.
///
/// # Request
///
/// ```json
/// { "make": "toyota", "submake": "", "year": 2020, "modelCode": "cor", "trimText": "le" }
/// ```
pub async fn homologate(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<HomologateRequest>, JsonRejection>,
) -> ServerResult<impl IntoResponse> {
    let query = body(payload)?.to_query()?;
    let results = run(&state, &query).await?;
    Ok(Json(HomologateResponse {
        total_matches: results.total(),
        query,
        results,
    }))
}

/// Same ranking as [`homologate`], flattened into a single list.
pub async fn homologate_flat(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<HomologateRequest>, JsonRejection>,
) -> ServerResult<impl IntoResponse> {
    let query = body(payload)?.to_query()?;
    let results = run(&state, &query).await?;
    let matches = results.flatten();
    Ok(Json(FlatHomologateResponse {
        total_matches: matches.len(),
        query,
        matches,
    }))
}

/// Legacy endpoint: Spanish field names in, `{source: [{score, sbert, fuzz, ...}]}` out.
pub async fn homologar(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<LegacyRequest>, JsonRejection>,
) -> ServerResult<impl IntoResponse> {
    let request = body(payload)?;
    let query = Query::new(
        &request.marca,
        &request.submarca,
        request.anio.to_text(),
        &request.modelo,
        &request.version,
    )?;
    let results = run(&state, &query).await?;
    let legacy: BTreeMap<String, Vec<LegacyMatch>> = results
        .into_inner()
        .into_iter()
        .map(|(source, matches)| (source, matches.into_iter().map(LegacyMatch::from).collect()))
        .collect();
    Ok(Json(legacy))
}

/// Catalog, alias, and embedding cache statistics
pub async fn catalog_stats(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<impl IntoResponse> {
    Ok(Json(state.homologator.stats()))
}
