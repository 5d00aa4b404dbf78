use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use homologador::{HomologConfig, Homologator, Query, RankedResults};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "homologador")]
#[command(about = "Cross-reference a vehicle description against insurer catalogs", long_about = None)]
struct Cli {
    /// Pipeline YAML configuration
    #[arg(short, long, default_value = "homologador.yaml")]
    config: PathBuf,

    /// Results shown per insurer (1-10)
    #[arg(short, long)]
    top: Option<usize>,

    /// Print results as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = HomologConfig::from_file(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(top) = cli.top {
        config.matcher.max_results_per_source = top;
    }

    let homologator = Homologator::from_config(&config)
        .await
        .context("starting homologator")?;
    for stats in homologator.catalog().stats() {
        println!("{}: {} records", stats.source.to_uppercase(), stats.records);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let Some(make) = prompt(&mut lines, "\nMake (empty to quit): ").await? else {
            break;
        };
        if make.trim().is_empty() {
            break;
        }
        let submake = prompt(&mut lines, "Sub-make (may be empty): ")
            .await?
            .unwrap_or_default();
        let year = prompt(&mut lines, "Year: ").await?.unwrap_or_default();
        let model = prompt(&mut lines, "Model: ").await?.unwrap_or_default();
        let version = prompt(&mut lines, "Version/Description: ")
            .await?
            .unwrap_or_default();

        let query = match Query::new(&make, &submake, &year, &model, &version) {
            Ok(query) => query,
            Err(err) => {
                eprintln!("{err}");
                continue;
            }
        };
        let results = homologator.homologate(&query).await?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&results)?);
        } else {
            print_results(&results);
        }
    }
    Ok(())
}

async fn prompt(lines: &mut Lines<BufReader<Stdin>>, label: &str) -> Result<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(label.as_bytes()).await?;
    stdout.flush().await?;
    Ok(lines.next_line().await?)
}

fn print_results(results: &RankedResults) {
    if results.is_empty() {
        println!("\nNo matches.");
        return;
    }
    println!("\nTop matches per insurer (semantic + lexical):");
    for (source, matches) in &results.0 {
        println!("\nInsurer: {}", source.to_uppercase());
        for m in matches {
            println!(
                "  score {:.2}%  | semantic {:.2}%  | lexical {:.2}%",
                m.score, m.semantic_score, m.lexical_score
            );
            println!("  year: {}", m.year);
            println!("  typeId: {}  |  makeId: {}", m.type_id, m.make_id);
            println!("  description: {}\n", m.description);
        }
    }
}
