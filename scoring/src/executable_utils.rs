use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    extract::{Json, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use common::config::{AnalyzerConfig, Config, ScoringConfig};
use http::header;
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;

use crate::{
    aggregator::RiskAggregator,
    classifier::HttpTextClassifier,
    corpus::FraudCorpus,
    matcher::{FraudCorpusMatcher, KnownFraudTable},
    model::{CorpusRecord, FraudInvestigation, GenericError, PhoneCandidate, QueryKind, RiskVerdict},
    patterns::PatternLibrary,
    reports::{
        FraudReportSubmission, InMemoryReportLog, JsonlReportLog, ReportIdGenerator, ReportLog,
        ReportReceipt, ReportSubmissionError, submit_report,
    },
    scorers::KeywordHeuristic,
};

pub const DEFAULT_CONFIG_PATH: &str = "target/debug/config/total_config.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,
}

/// Parses the command line, then loads config and tracing from it.
pub fn initialize_executable() -> Result<(Args, Config), GenericError> {
    let args = Args::parse();
    let config = load_config_and_init_tracing(&args.config)?;
    Ok((args, config))
}

/// Loads `.env`, the YAML config and installs the tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured log level.
pub fn load_config_and_init_tracing(config_path: &str) -> Result<Config, GenericError> {
    let dotenv = dotenvy::dotenv();
    let config = Config::load(config_path)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.analyzer.log_level));
    // A subscriber may already be installed (tests, embedding applications).
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded environment file");
    }
    tracing::info!(
        project = %config.common.project_name,
        config_path,
        "Loaded configuration"
    );

    Ok(config)
}

/// Wires the scoring components from configuration.
pub fn build_aggregator(config: &ScoringConfig, known_frauds: KnownFraudTable) -> RiskAggregator {
    let patterns = PatternLibrary::new(&config.default_country_code);

    let keyword_heuristic = match &config.classifier {
        Some(classifier_config) => {
            tracing::info!(endpoint = %classifier_config.endpoint, "Using remote text classifier");
            KeywordHeuristic::new(
                Arc::new(HttpTextClassifier::from_config(classifier_config)),
                Duration::from_millis(classifier_config.timeout_ms),
            )
        }
        None => {
            tracing::info!("No text classifier configured, using keyword heuristic only");
            KeywordHeuristic::fallback_only()
        }
    };

    RiskAggregator::new(
        keyword_heuristic,
        FraudCorpusMatcher::new(known_frauds, patterns),
    )
}

pub fn build_report_log(config: &ScoringConfig) -> Arc<dyn ReportLog> {
    match &config.report_log_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Appending fraud reports to file");
            Arc::new(JsonlReportLog::new(path.clone()))
        }
        None => Arc::new(InMemoryReportLog::new()),
    }
}

#[derive(Clone)]
pub struct AppState {
    aggregator: Arc<RiskAggregator>,
    corpus: Arc<FraudCorpus>,
    report_log: Arc<dyn ReportLog>,
    report_ids: ReportIdGenerator,
}

impl AppState {
    pub fn new(
        aggregator: Arc<RiskAggregator>,
        corpus: Arc<FraudCorpus>,
        report_log: Arc<dyn ReportLog>,
    ) -> Self {
        Self {
            aggregator,
            corpus,
            report_log,
            report_ids: ReportIdGenerator,
        }
    }
}

pub fn build_router(state: AppState, allowed_origin: Option<&str>) -> Router {
    let cors = match allowed_origin.map(|origin| origin.parse::<header::HeaderValue>()) {
        Some(Ok(origin)) => CorsLayer::new().allow_origin(origin),
        Some(Err(e)) => {
            tracing::warn!(error = %e, "Invalid allowed origin, allowing any origin");
            CorsLayer::new().allow_origin(Any)
        }
        None => CorsLayer::new().allow_origin(Any),
    };

    Router::new()
        .route("/api/analyze", post(analyze_query))
        .route("/api/phone/check", post(check_phone))
        .route("/api/reports", post(submit_fraud_report).get(list_reports))
        .route("/api/corpus", get(list_corpus).post(ingest_corpus))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(cors.allow_methods(Any).allow_headers(Any))
        .with_state(state)
}

/// Serves the analyzer API until ctrl-c.
pub async fn run_analyzer(config: AnalyzerConfig, state: AppState) -> Result<(), GenericError> {
    let app = build_router(state, config.allowed_origin.as_deref());

    tracing::info!("Starting analyzer service at {}", config.server_address);
    let listener = tokio::net::TcpListener::bind(&config.server_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Analyzer service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub query: String,
    #[serde(default)]
    pub kind: Option<QueryKind>,
}

pub async fn analyze_query(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Json<FraudInvestigation> {
    let corpus = state.corpus.snapshot();
    let investigation = state
        .aggregator
        .investigate(&request.query, request.kind, &corpus)
        .await;
    Json(investigation)
}

#[derive(Debug, Deserialize)]
pub struct PhoneCheckRequest {
    pub phone: String,
}

#[derive(Debug, Serialize)]
pub struct PhoneCheckResponse {
    pub normalized: Option<PhoneCandidate>,
    pub verdict: Option<RiskVerdict>,
}

pub async fn check_phone(
    State(state): State<AppState>,
    Json(request): Json<PhoneCheckRequest>,
) -> Json<PhoneCheckResponse> {
    let normalized = state
        .aggregator
        .matcher()
        .patterns()
        .normalize_phone(&request.phone);
    let verdict = normalized
        .as_ref()
        .map(PatternLibrary::match_high_risk_phone_pattern);
    Json(PhoneCheckResponse {
        normalized,
        verdict,
    })
}

/// Every outcome, including an unreadable body, is answered with a receipt.
pub async fn submit_fraud_report(
    State(state): State<AppState>,
    submission: Result<Json<FraudReportSubmission>, JsonRejection>,
) -> Response {
    let submission = match submission {
        Ok(Json(submission)) => submission,
        Err(rejection) => {
            tracing::info!(error = %rejection.body_text(), "Rejected unreadable fraud report");
            metrics::counter!("fraud_check_reports_total", "status" => "rejected").increment(1);
            return (
                rejection.status(),
                Json(ReportReceipt::error(rejection.body_text())),
            )
                .into_response();
        }
    };

    match submit_report(submission, state.report_log.as_ref(), &state.report_ids).await {
        Ok(receipt) => (StatusCode::OK, Json(receipt)).into_response(),
        Err(e @ ReportSubmissionError::Invalid(_)) => {
            (StatusCode::UNPROCESSABLE_ENTITY, Json(e.receipt())).into_response()
        }
        Err(e @ ReportSubmissionError::Storage(_)) => {
            (StatusCode::INTERNAL_SERVER_ERROR, Json(e.receipt())).into_response()
        }
    }
}

pub async fn list_reports(State(state): State<AppState>) -> Response {
    match state.report_log.reports().await {
        Ok(reports) => (StatusCode::OK, Json(reports)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read report log");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

pub async fn list_corpus(State(state): State<AppState>) -> Json<Vec<CorpusRecord>> {
    Json(state.corpus.snapshot().to_vec())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    pub added: usize,
    pub total: usize,
}

pub async fn ingest_corpus(
    State(state): State<AppState>,
    Json(records): Json<Vec<CorpusRecord>>,
) -> Json<IngestResponse> {
    let added = state.corpus.append(records);
    let total = state.corpus.len();
    tracing::info!(added, total, "Ingested corpus records over HTTP");
    Json(IngestResponse { added, total })
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK").into_response()
}
