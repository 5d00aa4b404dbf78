use std::{env, error::Error};

use semantic::{build_embedder, cosine_similarity, Embedder, SemanticConfig};

/// Scores two vehicle descriptions with the configured embedder (the offline stub by default).
///
/// ```bash
/// cargo run -p homolog-semantic --example embed -- "COR LE" "COR LE SEDAN"
/// ```
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let mut args = env::args().skip(1);
    let left = args.next().unwrap_or_else(|| "COR LE".into());
    let right = args.next().unwrap_or_else(|| "COR LE SEDAN 4P".into());

    let cfg = SemanticConfig::default();
    let embedder = build_embedder(&cfg)?;

    let a = embedder.embed(&left).await?;
    let b = embedder.embed(&right).await?;
    let cosine = cosine_similarity(&a, &b)?;

    println!("model: {}", embedder.model_name());
    println!("dim: {}", a.len());
    println!("first values: {:?}", &a[..a.len().min(8)]);
    println!("cosine({left:?}, {right:?}) = {cosine:.4}");
    println!("semantic score: {:.2}", (cosine * 100.0).clamp(0.0, 100.0));

    Ok(())
}
