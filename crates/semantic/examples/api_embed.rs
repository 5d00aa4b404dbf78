use std::{env, error::Error};

use semantic::{
    build_embedder, cosine_similarity, Embedder, SemanticConfig, API_TOKEN_ENV, API_URL_ENV,
};

/// Embeds vehicle descriptions through a remote feature-extraction endpoint.
///
/// ### Hugging Face Inference API
/// ```bash
/// HOMOLOG_SEMANTIC_API_URL=https://router.huggingface.co/hf-inference/models/sentence-transformers/all-MiniLM-L6-v2/pipeline/feature-extraction \
/// HOMOLOG_SEMANTIC_API_TOKEN=hf_xxx \
/// cargo run -p homolog-semantic --example api_embed -- "JETTA COMFORTLINE" "JET COMFORTLINE TIPTRONIC"
/// ```
///
/// The endpoint answers `{"inputs": [...]}` with one vector per input:
/// ```json
/// [[0.023, -0.045, 0.067, ...], [...]]
/// ```
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let texts: Vec<String> = env::args().skip(1).collect();
    let texts = if texts.len() >= 2 {
        texts
    } else {
        vec![
            "JETTA COMFORTLINE".to_string(),
            "JET COMFORTLINE TIPTRONIC".to_string(),
        ]
    };

    if env::var(API_URL_ENV).is_err() {
        println!("{API_URL_ENV} is not set; the config api_url is used");
    }
    if env::var(API_TOKEN_ENV).is_err() {
        println!("{API_TOKEN_ENV} is not set; requests go out unauthenticated");
    }

    let cfg = SemanticConfig {
        mode: "api".into(),
        api_url: Some(
            "https://router.huggingface.co/hf-inference/models/sentence-transformers/all-MiniLM-L6-v2/pipeline/feature-extraction"
                .into(),
        ),
        api_provider: Some("hf".into()),
        ..SemanticConfig::default()
    };
    let embedder = build_embedder(&cfg)?;

    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let vectors = embedder.embed_batch(&refs).await?;
    for (text, vector) in texts.iter().zip(&vectors) {
        println!("{text}: dim {}", vector.len());
    }
    for pair in vectors.windows(2) {
        println!("cosine: {:.4}", cosine_similarity(&pair[0], &pair[1])?);
    }

    Ok(())
}
