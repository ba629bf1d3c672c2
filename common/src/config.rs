use serde::Deserialize;
use std::{error::Error, fs, path::PathBuf};
use url::Url;

pub const DEFAULT_COUNTRY_CODE: &str = "91";
pub const DEFAULT_CLASSIFIER_TIMEOUT_MS: u64 = 3_000;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CommonConfig {
    pub project_name: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AnalyzerConfig {
    pub server_address: String,
    pub log_level: String,
    #[serde(default)]
    pub allowed_origin: Option<String>,
    #[serde(default)]
    pub metrics_address: Option<String>,
}

/// Remote text-classification endpoint used as the primary text scorer.
#[derive(Debug, Deserialize, Clone)]
pub struct ClassifierConfig {
    pub endpoint: Url,
    #[serde(default = "default_classifier_timeout_ms")]
    pub timeout_ms: u64,
    /// Name of the environment variable holding the bearer token, if any.
    #[serde(default)]
    pub api_token_env: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScoringConfig {
    #[serde(default = "default_country_code")]
    pub default_country_code: String,
    #[serde(default)]
    pub classifier: Option<ClassifierConfig>,
    #[serde(default)]
    pub known_frauds_path: Option<PathBuf>,
    #[serde(default)]
    pub report_log_path: Option<PathBuf>,
    #[serde(default)]
    pub corpus_export_path: Option<PathBuf>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            default_country_code: default_country_code(),
            classifier: None,
            known_frauds_path: None,
            report_log_path: None,
            corpus_export_path: None,
        }
    }
}

fn default_country_code() -> String {
    DEFAULT_COUNTRY_CODE.to_string()
}

fn default_classifier_timeout_ms() -> u64 {
    DEFAULT_CLASSIFIER_TIMEOUT_MS
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    pub common: CommonConfig,
    pub analyzer: AnalyzerConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

impl Config {
    pub fn load(config_path: &str) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let contents = fs::read_to_string(config_path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let config = serde_yml::from_str(contents)?;

        Ok(config)
    }
}
