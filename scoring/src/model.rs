use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::{error::Error, fmt};
use strum_macros::{Display as EnumDisplay, EnumString};

pub type GenericError = Box<dyn Error + Send + Sync>;

/// Structural kind of a query, as detected by the pattern library.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumDisplay, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QueryKind {
    CardNumber,
    PhoneNumber,
    Email,
    Url,
    Unknown,
}

/// A phone number reduced to `+<country code><10 national digits>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneCandidate {
    country_code: String,
    national_number: String,
}

impl PhoneCandidate {
    /// Callers must pass a digits-only country code and exactly 10 national digits.
    pub(crate) fn new(country_code: &str, national_number: &str) -> Self {
        Self {
            country_code: country_code.to_string(),
            national_number: national_number.to_string(),
        }
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    pub fn national_number(&self) -> &str {
        &self.national_number
    }
}

impl fmt::Display for PhoneCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{}{}", self.country_code, self.national_number)
    }
}

impl Serialize for PhoneCandidate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumDisplay,
)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const CRITICAL_ABOVE: f64 = 85.0;
    pub const HIGH_ABOVE: f64 = 65.0;
    pub const MEDIUM_ABOVE: f64 = 40.0;

    /// Buckets a score; every boundary is strict, so exactly 85.0 is `High`.
    pub fn from_score(score: f64) -> Self {
        if score > Self::CRITICAL_ABOVE {
            RiskLevel::Critical
        } else if score > Self::HIGH_ABOVE {
            RiskLevel::High
        } else if score > Self::MEDIUM_ABOVE {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Outcome of a rule-triggered check such as the phone signature rules.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskVerdict {
    pub level: RiskLevel,
    pub reason: String,
    pub source: String,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumDisplay,
    EnumString,
)]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumDisplay, EnumString,
)]
pub enum FraudType {
    Phishing,
    IdentityTheft,
    PaymentFraud,
    InvestmentScam,
    AccountTakeover,
    Other,
}

/// Curated, previously confirmed fraud identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnownFraudRecord {
    pub kind: QueryKind,
    pub value: String,
    pub fraud_type: String,
    pub reports: u32,
}

/// One ingested fraud observation. Only `value` (or `title`) is required on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusRecord {
    #[serde(default)]
    pub source: String,
    #[serde(alias = "title")]
    pub value: String,
    #[serde(default, alias = "type")]
    pub category: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl CorpusRecord {
    pub fn new(
        source: impl Into<String>,
        value: impl Into<String>,
        category: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            source: source.into(),
            value: value.into(),
            category: category.into(),
            severity,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FeatureVector {
    pub length: usize,
    pub digit_ratio: f64,
    pub special_ratio: f64,
    pub keyword_hits: usize,
}

impl FeatureVector {
    /// Features in their fixed order: length, digit ratio, special ratio, keyword hits.
    pub fn values(&self) -> [f64; 4] {
        [
            self.length as f64,
            self.digit_ratio,
            self.special_ratio,
            self.keyword_hits as f64,
        ]
    }

    pub fn sum(&self) -> f64 {
        self.values().iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub text_analysis_score: f64,
    pub pattern_analysis_score: f64,
    pub web_matches: usize,
    pub matches: Vec<CorpusRecord>,
    pub features: FeatureVector,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhoneCheck {
    pub normalized: PhoneCandidate,
    pub verdict: RiskVerdict,
}

/// Everything the engine knows about one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FraudInvestigation {
    pub query: String,
    pub kind: QueryKind,
    pub phone_check: Option<PhoneCheck>,
    pub known_fraud: Option<KnownFraudRecord>,
    pub assessment: RiskAssessment,
}

pub(crate) fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
