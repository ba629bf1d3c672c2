use std::{fs::File, io::BufWriter, net::SocketAddr, path::Path, sync::Arc};

use metrics_exporter_prometheus::PrometheusBuilder;

use fraud_check::{known_frauds::load_known_frauds, samples::InternalSampleSource};
use scoring::{
    corpus::{CorpusSource, FraudCorpus, JsonlCorpusSource, ingest},
    executable_utils::{
        AppState, build_aggregator, build_report_log, initialize_executable, run_analyzer,
    },
    model::GenericError,
};

#[tokio::main]
async fn main() -> Result<(), GenericError> {
    let (args, config) = initialize_executable()?;
    let config_dir = Path::new(&args.config)
        .parent()
        .unwrap_or(Path::new("."));

    if let Some(metrics_address) = &config.analyzer.metrics_address {
        let metrics_address: SocketAddr = metrics_address.parse()?;
        PrometheusBuilder::new()
            .with_http_listener(metrics_address)
            .install()?;
        tracing::info!("Serving metrics at {}", metrics_address);
    }

    let known_frauds = load_known_frauds(&config.scoring, config_dir)?;
    let aggregator = Arc::new(build_aggregator(&config.scoring, known_frauds));

    // A previous export replaces the built-in samples so restarts do not duplicate them.
    let export_path = config.scoring.corpus_export_path.clone();
    let source: Arc<dyn CorpusSource> = match &export_path {
        Some(path) if path.exists() => Arc::new(JsonlCorpusSource::new(path.clone())),
        _ => Arc::new(InternalSampleSource),
    };
    let corpus = Arc::new(FraudCorpus::new());
    let ingested = ingest(&corpus, &[source]).await;
    tracing::info!("Corpus ready with {} records", ingested);

    let state = AppState::new(
        aggregator,
        Arc::clone(&corpus),
        build_report_log(&config.scoring),
    );
    run_analyzer(config.analyzer, state).await?;

    if let Some(path) = export_path {
        let writer = BufWriter::new(File::create(&path)?);
        let exported = corpus.export_jsonl(writer)?;
        tracing::info!(path = %path.display(), exported, "Exported corpus");
    }

    Ok(())
}
