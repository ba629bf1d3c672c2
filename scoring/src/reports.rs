use std::{
    fmt::Display,
    path::PathBuf,
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::{
    model::{FraudType, Severity},
    patterns::PatternLibrary,
};

pub const REPORT_ID_PREFIX: &str = "HS";
const REPORT_ID_TIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// Report as received from a reporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudReportSubmission {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub fraud_type: FraudType,
    pub description: String,
    pub severity: Severity,
}

/// Accepted report as appended to the report log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudReport {
    pub report_id: String,
    pub submitted_at: DateTime<Utc>,
    #[serde(flatten)]
    pub submission: FraudReportSubmission,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportReceipt {
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ReportReceipt {
    fn success(report_id: String) -> Self {
        Self {
            status: ReportStatus::Success,
            report_id: Some(report_id),
            message: Some("Report submitted successfully".to_string()),
        }
    }

    pub(crate) fn error(message: String) -> Self {
        Self {
            status: ReportStatus::Error,
            report_id: None,
            message: Some(message),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ReportStatus::Success
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportValidationError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("email address {0:?} is not valid")]
    InvalidEmail(String),
}

impl FraudReportSubmission {
    pub fn validate(&self) -> Result<(), ReportValidationError> {
        let missing: Vec<&'static str> = [
            ("name", &self.name),
            ("email", &self.email),
            ("description", &self.description),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();

        if !missing.is_empty() {
            return Err(ReportValidationError::MissingFields(missing));
        }
        if !PatternLibrary::is_email(&self.email) {
            return Err(ReportValidationError::InvalidEmail(self.email.clone()));
        }
        Ok(())
    }
}

/// Produces `HS<YYYYMMDDHHMMSS>` identifiers from the local clock.
///
/// Ids have second granularity: two reports accepted within the same second
/// share an id.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportIdGenerator;

impl ReportIdGenerator {
    pub fn new_id(&self) -> String {
        self.id_at(&Local::now())
    }

    pub fn id_at<Tz>(&self, timestamp: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        format!(
            "{}{}",
            REPORT_ID_PREFIX,
            timestamp.format(REPORT_ID_TIME_FORMAT)
        )
    }
}

#[derive(Debug, Error)]
pub enum ReportLogError {
    #[error("report log io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("report serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Append-only store of accepted reports.
#[async_trait]
pub trait ReportLog: Send + Sync {
    async fn append(&self, report: &FraudReport) -> Result<(), ReportLogError>;
    async fn reports(&self) -> Result<Vec<FraudReport>, ReportLogError>;
}

#[derive(Debug, Default)]
pub struct InMemoryReportLog {
    reports: Mutex<Vec<FraudReport>>,
}

impl InMemoryReportLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReportLog for InMemoryReportLog {
    async fn append(&self, report: &FraudReport) -> Result<(), ReportLogError> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(report.clone());
        Ok(())
    }

    async fn reports(&self) -> Result<Vec<FraudReport>, ReportLogError> {
        Ok(self
            .reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}

/// One JSON report per line, appended to a file.
pub struct JsonlReportLog {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonlReportLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }
}

#[async_trait]
impl ReportLog for JsonlReportLog {
    async fn append(&self, report: &FraudReport) -> Result<(), ReportLogError> {
        let mut line = serde_json::to_vec(report)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }

    async fn reports(&self) -> Result<Vec<FraudReport>, ReportLogError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(ReportLogError::from))
            .collect()
    }
}

#[derive(Debug, Error)]
pub enum ReportSubmissionError {
    #[error(transparent)]
    Invalid(#[from] ReportValidationError),

    #[error("failed to store report: {0}")]
    Storage(#[from] ReportLogError),
}

impl ReportSubmissionError {
    /// Structured rejection returned to the reporter.
    pub fn receipt(&self) -> ReportReceipt {
        ReportReceipt::error(self.to_string())
    }
}

/// Validates, stamps and appends a report.
///
/// Invalid submissions are rejected without touching the log.
pub async fn submit_report(
    submission: FraudReportSubmission,
    log: &dyn ReportLog,
    ids: &ReportIdGenerator,
) -> Result<ReportReceipt, ReportSubmissionError> {
    if let Err(e) = submission.validate() {
        tracing::info!(error = %e, "Rejected fraud report");
        metrics::counter!("fraud_check_reports_total", "status" => "rejected").increment(1);
        return Err(e.into());
    }

    let report = FraudReport {
        report_id: ids.new_id(),
        submitted_at: Utc::now(),
        submission,
    };

    if let Err(e) = log.append(&report).await {
        tracing::error!(error = %e, "Failed to append fraud report");
        metrics::counter!("fraud_check_reports_total", "status" => "failed").increment(1);
        return Err(e.into());
    }

    tracing::info!(
        report_id = %report.report_id,
        fraud_type = %report.submission.fraud_type,
        "Fraud report submitted"
    );
    metrics::counter!("fraud_check_reports_total", "status" => "accepted").increment(1);
    Ok(ReportReceipt::success(report.report_id))
}
