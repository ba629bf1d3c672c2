use std::{path::Path, sync::Arc};

use anyhow::{Context, anyhow};
use clap::Parser;

use fraud_check::{known_frauds::load_known_frauds, samples::InternalSampleSource};
use scoring::{
    corpus::{CorpusSource, FraudCorpus, ingest},
    executable_utils::{DEFAULT_CONFIG_PATH, build_aggregator, load_config_and_init_tracing},
    model::QueryKind,
};

/// Scores a single query against the sample corpus and prints the result as JSON.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct AssessArgs {
    /// Path to config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Skip kind detection (card_number, phone_number, email, url, unknown)
    #[arg(short, long)]
    kind: Option<QueryKind>,

    /// Phone number, email, URL, card number or free text
    query: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = AssessArgs::parse();
    let config = load_config_and_init_tracing(&args.config).map_err(|e| anyhow!(e))?;
    let config_dir = Path::new(&args.config)
        .parent()
        .unwrap_or(Path::new("."));

    let known_frauds = load_known_frauds(&config.scoring, config_dir)
        .context("loading known fraud table")?;
    let aggregator = build_aggregator(&config.scoring, known_frauds);

    let corpus = FraudCorpus::new();
    let sources: Vec<Arc<dyn CorpusSource>> = vec![Arc::new(InternalSampleSource)];
    ingest(&corpus, &sources).await;

    let investigation = aggregator
        .investigate(&args.query, args.kind, &corpus.snapshot())
        .await;
    println!(
        "{}",
        serde_json::to_string_pretty(&investigation).context("serializing investigation")?
    );

    Ok(())
}
