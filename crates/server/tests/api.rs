//! Route-level tests: the full router, middleware included, driven with `oneshot`.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use homologador::{
    AliasTable, Catalog, CatalogRecord, Embedder, Homologator, MatchConfig, SemanticError,
    SourceProfile, StubEmbedder,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use server::{build_router, ServerConfig, ServerState};
use tower::ServiceExt;

fn record(source: &str, make: &str, type_id: &str, description: &str) -> CatalogRecord {
    CatalogRecord {
        source: source.into(),
        insurance_company_id: json!(1),
        make: make.into(),
        submake: make.into(),
        year: 2020,
        type_id: type_id.into(),
        make_id: json!(42),
        description: description.into(),
    }
}

async fn homologator(embedder: Arc<dyn Embedder>, warm: bool) -> Arc<Homologator> {
    let catalog = Catalog::from_records(
        vec![
            SourceProfile::new("chubb", "chubb.json"),
            SourceProfile::new("hdi", "hdi.json"),
        ],
        vec![
            record("chubb", "TOYOTA", "COR", "COR LE SEDAN"),
            record("hdi", "TOYOTA", "COROLLA", "COR XLE 4P"),
            record("hdi", "VW", "JET", "JET COMFORTLINE"),
        ],
    )
    .unwrap();
    let homologator = Homologator::from_parts(
        catalog,
        AliasTable::from_groups([("VOLKSWAGEN", vec!["VW"])]),
        embedder,
        MatchConfig::default(),
        8,
        warm,
    )
    .await
    .unwrap();
    Arc::new(homologator)
}

async fn app_with(config: ServerConfig) -> Router {
    let homologator = homologator(Arc::new(StubEmbedder::default()), true).await;
    build_router(Arc::new(ServerState::with_homologator(
        config,
        homologator,
        None,
    )))
}

async fn app() -> Router {
    app_with(ServerConfig::default()).await
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_and_info_are_public() {
    let app = app_with(ServerConfig {
        api_keys: ["secret".to_string()].into_iter().collect(),
        ..ServerConfig::default()
    })
    .await;

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "healthy");

    let response = app.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/ready")).await.unwrap();
    let body = json_body(response).await;
    assert_eq!(body["components"]["catalog"]["records"], 3);
    assert_eq!(body["components"]["embedder"]["model"], "stub");
}

#[tokio::test]
async fn grouped_homologation_ranks_per_source() {
    let response = app()
        .await
        .oneshot(post(
            "/api/v1/homologate",
            json!({"make": "toyota", "year": 2020, "modelCode": "cor", "trimText": "le"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["query"]["make"], "TOYOTA");
    assert_eq!(body["results"]["chubb"][0]["description"], "COR LE SEDAN");
    // "COR XLE 4P" passes the model anchor through its description prefix.
    assert_eq!(body["results"]["hdi"][0]["typeId"], "COROLLA");
    assert_eq!(body["total_matches"], 2);

    let top = &body["results"]["chubb"][0];
    let score = top["score"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&score));
    assert!(top["semanticScore"].is_number());
    assert!(top["lexicalScore"].is_number());
}

#[tokio::test]
async fn year_may_be_a_string_and_aliases_apply() {
    let response = app()
        .await
        .oneshot(post(
            "/api/v1/homologate",
            json!({"make": "Volkswagen", "year": "2020", "model": "jet", "version": "comfortline"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["results"]["hdi"][0]["description"], "JET COMFORTLINE");
    assert!(body["results"].get("chubb").is_none());
}

#[tokio::test]
async fn no_survivors_is_an_empty_mapping() {
    let response = app()
        .await
        .oneshot(post(
            "/api/v1/homologate",
            json!({"make": "toyota", "year": 2019, "modelCode": "cor"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["results"], json!({}));
    assert_eq!(body["total_matches"], 0);
}

#[tokio::test]
async fn flat_homologation_tags_sources() {
    let response = app()
        .await
        .oneshot(post(
            "/api/v1/homologate/flat",
            json!({"make": "toyota", "year": 2020, "modelCode": "cor", "trimText": "le"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let matches = body["matches"].as_array().unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0]["source"], "chubb");
    assert_eq!(matches[1]["source"], "hdi");
    assert_eq!(body["total_matches"], 2);
}

#[tokio::test]
async fn legacy_endpoint_keeps_original_shape() {
    let response = app()
        .await
        .oneshot(post(
            "/homologar",
            json!({"marca": "toyota", "submarca": "", "año": 2020, "modelo": "cor", "version": "le"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let top = &body["chubb"][0];
    assert_eq!(top["description"], "COR LE SEDAN");
    assert_eq!(top["typeId"], "COR");
    assert_eq!(top["makeId"], 42);
    assert_eq!(top["year"], 2020);
    assert!(top["sbert"].is_number());
    assert!(top["fuzz"].is_number());
    assert!(top.get("insuranceCompanyId").is_none());
}

#[tokio::test]
async fn invalid_query_is_rejected() {
    let response = app()
        .await
        .oneshot(post("/api/v1/homologate", json!({"make": " ", "year": 2020})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], "INVALID_QUERY");
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let response = app()
        .await
        .oneshot(post("/api/v1/homologate", json!({"make": "toyota"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn api_key_and_rate_limit_are_enforced() {
    let app = app_with(ServerConfig {
        api_keys: ["secret".to_string()].into_iter().collect(),
        rate_limit_per_minute: 1,
        ..ServerConfig::default()
    })
    .await;

    let response = app
        .clone()
        .oneshot(get("/api/v1/catalog/stats"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let with_key = || {
        Request::builder()
            .uri("/api/v1/catalog/stats")
            .header("x-api-key", "secret")
            .body(Body::empty())
            .unwrap()
    };
    let response = app.clone().oneshot(with_key()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["records"], 3);
    assert_eq!(body["alias_groups"], 1);

    let response = app.oneshot(with_key()).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn bearer_token_is_accepted() {
    let app = app_with(ServerConfig {
        api_keys: ["secret".to_string()].into_iter().collect(),
        ..ServerConfig::default()
    })
    .await;
    let request = Request::builder()
        .uri("/api/v1/catalog/stats")
        .header("authorization", "Bearer secret")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

struct DownEmbedder;

#[async_trait]
impl Embedder for DownEmbedder {
    fn model_name(&self) -> &str {
        "down"
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>, SemanticError> {
        Err(SemanticError::Request(
            "connect error: http://10.1.2.3:8000/embed".into(),
        ))
    }
}

#[tokio::test]
async fn provider_failure_is_bad_gateway_without_detail() {
    let homologator = homologator(Arc::new(DownEmbedder), false).await;
    let app = build_router(Arc::new(ServerState::with_homologator(
        ServerConfig::default(),
        homologator,
        None,
    )));

    let response = app
        .oneshot(post(
            "/api/v1/homologate",
            json!({"make": "toyota", "year": 2020, "modelCode": "cor"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "PROVIDER_UNAVAILABLE");
    assert!(!body.to_string().contains("10.1.2.3"));
}

#[tokio::test]
async fn unknown_route_and_disabled_metrics_are_not_found() {
    let app = app().await;
    let response = app.clone().oneshot(get("/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"]["code"], "NOT_FOUND");

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn request_id_is_echoed() {
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-123")
        .body(Body::empty())
        .unwrap();
    let response = app().await.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-123");

    let response = app().await.oneshot(get("/health")).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}
