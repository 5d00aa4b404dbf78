use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::vector::l2_normalize_in_place;
use crate::{Embedder, SemanticConfig, SemanticError};

/// Overrides `api_url` when set.
pub const API_URL_ENV: &str = "HOMOLOG_SEMANTIC_API_URL";
/// Sent as `Authorization: Bearer <token>` when no explicit header is configured.
pub const API_TOKEN_ENV: &str = "HOMOLOG_SEMANTIC_API_TOKEN";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ApiProviderKind {
    HuggingFace,
    OpenAI,
    Custom,
}

impl ApiProviderKind {
    fn from_hint(hint: Option<&str>) -> Self {
        match hint.unwrap_or("custom").to_ascii_lowercase().as_str() {
            "hf" | "huggingface" => ApiProviderKind::HuggingFace,
            "openai" | "gpt" => ApiProviderKind::OpenAI,
            _ => ApiProviderKind::Custom,
        }
    }
}

/// Remote embedding provider speaking the Hugging Face, OpenAI, or a plain custom JSON dialect.
///
/// Each call is a single attempt; failures surface as [`SemanticError::Request`] or
/// [`SemanticError::Inference`] and callers decide what to do with the query.
#[derive(Debug, Clone)]
pub struct ApiEmbedder {
    client: reqwest::Client,
    url: String,
    auth_header: Option<String>,
    provider: ApiProviderKind,
    model_name: String,
    normalize: bool,
}

impl ApiEmbedder {
    /// Resolves endpoint and credentials from `cfg`, with environment overrides.
    pub fn from_config(cfg: &SemanticConfig) -> Result<Self, SemanticError> {
        let url = std::env::var(API_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| cfg.api_url.clone())
            .ok_or_else(|| {
                SemanticError::InvalidConfig(format!(
                    "api_url is required for api mode (or set {API_URL_ENV})"
                ))
            })?;
        let auth_header = cfg.api_auth_header.clone().or_else(|| {
            std::env::var(API_TOKEN_ENV)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(|token| format!("Bearer {token}"))
        });
        if auth_header.is_none() {
            warn!(url = %url, "semantic api configured without credentials");
        }

        let timeout = Duration::from_secs(cfg.api_timeout_secs.unwrap_or(30));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(32)
            .build()
            .map_err(|e| SemanticError::InvalidConfig(format!("http client: {e}")))?;

        Ok(Self {
            client,
            url,
            auth_header,
            provider: ApiProviderKind::from_hint(cfg.api_provider.as_deref()),
            model_name: cfg.model_name.clone(),
            normalize: cfg.normalize,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn send(&self, payload: Value) -> Result<Value, SemanticError> {
        let mut request = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json");
        if let Some(header) = self.auth_header.as_deref() {
            request = request.header("Authorization", header);
        }

        let response = request
            .json(&payload)
            .send()
            .await
            .map_err(|e| SemanticError::Request(format!("HTTP request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SemanticError::Request(format!("HTTP error {status}: {body}")));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SemanticError::Inference(format!("invalid JSON response: {e}")))
    }

    fn finish(&self, mut vector: Vec<f32>) -> Vec<f32> {
        if self.normalize {
            l2_normalize_in_place(&mut vector);
        }
        vector
    }
}

#[async_trait]
impl Embedder for ApiEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, SemanticError> {
        let payload = build_payload(self.provider, &[text], &self.model_name, false);
        let vectors = parse_embeddings(self.send(payload).await?)?;
        Ok(self.finish(single_vector(vectors)?))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, SemanticError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let start = Instant::now();
        let payload = build_payload(self.provider, texts, &self.model_name, true);
        let vectors = parse_embeddings(self.send(payload).await?)?;
        if vectors.len() != texts.len() {
            return Err(SemanticError::Inference(format!(
                "API returned {} embeddings for {} inputs",
                vectors.len(),
                texts.len()
            )));
        }
        debug!(
            inputs = texts.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "semantic_api_batch"
        );
        Ok(vectors.into_iter().map(|v| self.finish(v)).collect())
    }
}

fn build_payload(provider: ApiProviderKind, texts: &[&str], model: &str, batch: bool) -> Value {
    let first = texts.first().copied().unwrap_or("");
    match (provider, batch) {
        (ApiProviderKind::HuggingFace, true) => json!({ "inputs": texts }),
        (ApiProviderKind::HuggingFace, false) => json!({ "inputs": first }),
        (ApiProviderKind::OpenAI, true) => json!({ "input": texts, "model": model }),
        (ApiProviderKind::OpenAI, false) => json!({ "input": first, "model": model }),
        (ApiProviderKind::Custom, true) => json!({ "texts": texts }),
        (ApiProviderKind::Custom, false) => json!({ "text": first }),
    }
}

/// Accepts `{"embeddings": ...}`, OpenAI's `{"data": [{"embedding": ...}]}`, or a bare
/// (possibly nested) array.
fn parse_embeddings(value: Value) -> Result<Vec<Vec<f32>>, SemanticError> {
    match value {
        Value::Object(mut map) => {
            if let Some(embeddings) = map.remove("embeddings") {
                return parse_collection(embeddings);
            }
            match map.remove("data") {
                Some(Value::Array(items)) => items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(mut obj) => obj
                            .remove("embedding")
                            .ok_or_else(|| {
                                SemanticError::Inference(
                                    "missing `embedding` field in data item".into(),
                                )
                            })
                            .and_then(parse_vector),
                        _ => Err(SemanticError::Inference(
                            "unexpected entry inside `data` array".into(),
                        )),
                    })
                    .collect(),
                _ => Err(SemanticError::Inference(
                    "unsupported API response shape".into(),
                )),
            }
        }
        other => parse_collection(other),
    }
}

/// A single-text request must come back with exactly one vector.
fn single_vector(vectors: Vec<Vec<f32>>) -> Result<Vec<f32>, SemanticError> {
    let count = vectors.len();
    let mut iter = vectors.into_iter();
    match (iter.next(), count) {
        (Some(vector), 1) => Ok(vector),
        _ => Err(SemanticError::Inference(format!(
            "API returned {count} embeddings for 1 input"
        ))),
    }
}

fn parse_collection(value: Value) -> Result<Vec<Vec<f32>>, SemanticError> {
    match value {
        Value::Array(items) if items.is_empty() => Ok(Vec::new()),
        Value::Array(items) if items.iter().all(Value::is_array) => {
            items.into_iter().map(parse_vector).collect()
        }
        other => parse_vector(other).map(|v| vec![v]),
    }
}

fn parse_vector(value: Value) -> Result<Vec<f32>, SemanticError> {
    match value {
        Value::Array(values) => values
            .into_iter()
            .map(|entry| match entry {
                Value::Number(num) => num
                    .as_f64()
                    .map(|f| f as f32)
                    .filter(|f| f.is_finite())
                    .ok_or_else(|| {
                        SemanticError::Inference(format!("non-finite embedding value {num}"))
                    }),
                other => Err(SemanticError::Inference(format!(
                    "embedding entries must be numbers, got {other}"
                ))),
            })
            .collect(),
        other => Err(SemanticError::Inference(format!(
            "embedding vector must be an array, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_config(url: &str) -> SemanticConfig {
        SemanticConfig {
            mode: "api".into(),
            api_url: Some(url.into()),
            api_auth_header: Some("Bearer test".into()),
            api_provider: Some("openai".into()),
            api_timeout_secs: Some(1),
            ..Default::default()
        }
    }

    #[test]
    fn provider_hint_parsing() {
        assert_eq!(
            ApiProviderKind::from_hint(Some("HF")),
            ApiProviderKind::HuggingFace
        );
        assert_eq!(
            ApiProviderKind::from_hint(Some("gpt")),
            ApiProviderKind::OpenAI
        );
        assert_eq!(ApiProviderKind::from_hint(None), ApiProviderKind::Custom);
    }

    #[test]
    fn payload_shapes_per_provider() {
        let texts = ["COR LE", "YARIS"];
        assert_eq!(
            build_payload(ApiProviderKind::HuggingFace, &texts, "m", true),
            json!({ "inputs": ["COR LE", "YARIS"] })
        );
        assert_eq!(
            build_payload(ApiProviderKind::OpenAI, &texts[..1], "m", false),
            json!({ "input": "COR LE", "model": "m" })
        );
        assert_eq!(
            build_payload(ApiProviderKind::Custom, &[], "m", false),
            json!({ "text": "" })
        );
    }

    #[test]
    fn parse_response_variants() {
        let nested = parse_embeddings(json!([[1.0, 2.0], [3.0, 4.0]])).unwrap();
        assert_eq!(nested, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);

        let single = parse_embeddings(json!([1.0, 2.0, 3.0])).unwrap();
        assert_eq!(single, vec![vec![1.0, 2.0, 3.0]]);

        let wrapped = parse_embeddings(json!({ "embeddings": [[0.5, 0.5]] })).unwrap();
        assert_eq!(wrapped, vec![vec![0.5, 0.5]]);

        let openai = parse_embeddings(json!({
            "data": [{ "embedding": [0.1, 0.2] }, { "embedding": [0.3, 0.4] }]
        }))
        .unwrap();
        assert_eq!(openai.len(), 2);

        assert!(parse_embeddings(json!([])).unwrap().is_empty());
    }

    #[test]
    fn parse_rejects_bad_shapes() {
        assert!(matches!(
            parse_embeddings(json!({ "result": [] })),
            Err(SemanticError::Inference(_))
        ));
        assert!(parse_embeddings(json!({ "data": [{ "vector": [1.0] }] })).is_err());
        assert!(parse_embeddings(json!([["a", "b"]])).is_err());
    }

    #[test]
    fn parse_rejects_values_that_overflow_f32() {
        // 1e39 is a finite f64 but infinite once narrowed.
        assert!(matches!(
            parse_embeddings(json!([1e39, 1.0])),
            Err(SemanticError::Inference(_))
        ));
        assert!(parse_embeddings(json!({ "data": [{ "embedding": [-1e39] }] })).is_err());
        assert!(parse_embeddings(json!([[3.4e38, 1.0]])).is_ok());
    }

    #[test]
    fn single_request_needs_exactly_one_vector() {
        assert_eq!(single_vector(vec![vec![1.0, 2.0]]).unwrap(), vec![1.0, 2.0]);

        let empty = single_vector(Vec::new()).unwrap_err();
        assert_eq!(
            empty,
            SemanticError::Inference("API returned 0 embeddings for 1 input".into())
        );

        // An echo of a batch must not silently pick the last row.
        let many = single_vector(vec![vec![1.0], vec![2.0]]).unwrap_err();
        assert!(matches!(many, SemanticError::Inference(msg) if msg.contains("2 embeddings")));
    }

    #[test]
    fn explicit_config_builds_embedder() {
        let embedder = ApiEmbedder::from_config(&api_config("http://127.0.0.1:9/embed")).unwrap();
        assert_eq!(embedder.model_name(), "all-MiniLM-L6-v2");
        assert_eq!(embedder.provider, ApiProviderKind::OpenAI);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_request_error() {
        // Port 9 (discard) is closed on test hosts; the call must fail fast, not hang.
        let embedder = ApiEmbedder::from_config(&api_config("http://127.0.0.1:9/embed")).unwrap();
        assert!(matches!(
            embedder.embed("COR LE").await,
            Err(SemanticError::Request(_))
        ));
    }
}
