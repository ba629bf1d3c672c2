#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use axum::{Router, body::Body};
use mockall::mock;
use scoring::{
    aggregator::RiskAggregator,
    classifier::{ClassifierError, ClassifierOutput, LabelScore, TextClassifier},
    corpus::{CorpusError, CorpusSource, FraudCorpus},
    executable_utils::{AppState, build_router},
    matcher::{FraudCorpusMatcher, KnownFraudTable},
    model::{CorpusRecord, KnownFraudRecord, QueryKind, Severity},
    patterns::PatternLibrary,
    reports::{FraudReport, ReportLog, ReportLogError},
    scorers::KeywordHeuristic,
};

mock! {
    pub Classifier {}

    #[async_trait]
    impl TextClassifier for Classifier {
        async fn classify(&self, text: &str) -> Result<ClassifierOutput, ClassifierError>;
    }
}

mock! {
    pub ReportLog {}

    #[async_trait]
    impl ReportLog for ReportLog {
        async fn append(&self, report: &FraudReport) -> Result<(), ReportLogError>;
        async fn reports(&self) -> Result<Vec<FraudReport>, ReportLogError>;
    }
}

/// Classifier that answers only after `delay`.
pub struct SlowClassifier {
    pub delay: Duration,
}

#[async_trait]
impl TextClassifier for SlowClassifier {
    async fn classify(&self, _text: &str) -> Result<ClassifierOutput, ClassifierError> {
        tokio::time::sleep(self.delay).await;
        Ok(spam_output(0.99))
    }
}

pub struct StaticSource {
    pub name: String,
    pub records: Vec<CorpusRecord>,
}

#[async_trait]
impl CorpusSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<CorpusRecord>, CorpusError> {
        Ok(self.records.clone())
    }
}

pub struct FailingSource;

#[async_trait]
impl CorpusSource for FailingSource {
    fn name(&self) -> &str {
        "scraper"
    }

    async fn fetch(&self) -> Result<Vec<CorpusRecord>, CorpusError> {
        Err(CorpusError::Unavailable {
            source_name: "scraper".to_string(),
            reason: "connection refused".to_string(),
        })
    }
}

pub fn spam_output(probability: f64) -> ClassifierOutput {
    ClassifierOutput::Flat(vec![
        LabelScore {
            label: "HAM".to_string(),
            score: 1.0 - probability,
        },
        LabelScore {
            label: "SPAM".to_string(),
            score: probability,
        },
    ])
}

pub fn corpus_record(value: &str) -> CorpusRecord {
    CorpusRecord::new("Test Feed", value, "Test", Severity::High)
}

pub fn known_frauds() -> KnownFraudTable {
    KnownFraudTable::from_records([
        KnownFraudRecord {
            kind: QueryKind::PhoneNumber,
            value: "+919999111111".to_string(),
            fraud_type: "Impersonation Scam".to_string(),
            reports: 23,
        },
        KnownFraudRecord {
            kind: QueryKind::Email,
            value: "investment@quick-gain.com".to_string(),
            fraud_type: "Investment Scam".to_string(),
            reports: 37,
        },
    ])
}

pub fn fallback_aggregator() -> RiskAggregator {
    RiskAggregator::new(
        KeywordHeuristic::fallback_only(),
        FraudCorpusMatcher::new(known_frauds(), PatternLibrary::default()),
    )
}

pub fn create_test_app(report_log: Arc<dyn ReportLog>, records: Vec<CorpusRecord>) -> Router {
    let state = AppState::new(
        Arc::new(fallback_aggregator()),
        Arc::new(FraudCorpus::with_records(records)),
        report_log,
    );
    build_router(state, None)
}

pub fn json_request(
    method: &str,
    uri: &str,
    body: &serde_json::Value,
) -> common::test_helpers::TestResult<http::Request<Body>> {
    let body = common::test_helpers::test_utils::serialize_json(body)?;
    let request = common::test_helpers::test_utils::build_request(method, uri, Some(body))?;
    let (parts, body) = request.into_parts();
    Ok(http::Request::from_parts(parts, Body::from(body)))
}

pub fn empty_request(method: &str, uri: &str) -> common::test_helpers::TestResult<http::Request<Body>> {
    let request = common::test_helpers::test_utils::build_request(method, uri, None)?;
    let (parts, body) = request.into_parts();
    Ok(http::Request::from_parts(parts, Body::from(body)))
}

pub async fn response_body_string(response: axum::response::Response) -> String {
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    String::from_utf8(body_bytes.to_vec()).expect("Response body is not valid UTF-8")
}

/// Fresh directory under the system temp dir, unique per call.
pub fn scratch_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let dir = std::env::temp_dir().join(format!(
        "scoring-{}-{}-{}",
        name,
        std::process::id(),
        nanos
    ));
    std::fs::create_dir_all(&dir).expect("Failed to create scratch dir");
    dir
}
