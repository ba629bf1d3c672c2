use async_trait::async_trait;
use common::config::ClassifierConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const SPAM_LABEL: &str = "SPAM";

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("classifier returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("classifier timed out after {0:?}")]
    Timeout(Duration),

    #[error("classifier output is unusable: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

/// Label probabilities, either a single list or grouped lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassifierOutput {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl ClassifierOutput {
    pub fn label_scores(&self) -> Box<dyn Iterator<Item = &LabelScore> + '_> {
        match self {
            ClassifierOutput::Nested(groups) => Box::new(groups.iter().flatten()),
            ClassifierOutput::Flat(scores) => Box::new(scores.iter()),
        }
    }

    /// Highest SPAM probability across every group; 0 when no SPAM label is present.
    pub fn spam_probability(&self) -> f64 {
        self.label_scores()
            .filter(|s| s.label.eq_ignore_ascii_case(SPAM_LABEL))
            .map(|s| s.score)
            .fold(0.0, f64::max)
    }
}

/// Text-classification capability used as the primary text scorer.
#[async_trait]
pub trait TextClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<ClassifierOutput, ClassifierError>;
}

/// Talks to a hosted inference endpoint accepting `{"inputs": "<text>"}`.
pub struct HttpTextClassifier {
    client: reqwest::Client,
    endpoint: Url,
    api_token: Option<String>,
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    inputs: &'a str,
}

impl HttpTextClassifier {
    pub fn new(endpoint: Url, api_token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_token,
        }
    }

    /// Reads the token from the environment variable named in the config, if any.
    pub fn from_config(config: &ClassifierConfig) -> Self {
        let api_token = config
            .api_token_env
            .as_deref()
            .and_then(|var| match std::env::var(var) {
                Ok(token) => Some(token),
                Err(e) => {
                    tracing::warn!(variable = var, error = %e, "Classifier token not available");
                    None
                }
            });
        Self::new(config.endpoint.clone(), api_token)
    }
}

#[async_trait]
impl TextClassifier for HttpTextClassifier {
    async fn classify(&self, text: &str) -> Result<ClassifierOutput, ClassifierError> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .json(&ClassifyRequest { inputs: text });
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ClassifierError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_output_takes_spam_label() {
        let output: ClassifierOutput = serde_json::from_str(
            r#"[{"label": "HAM", "score": 0.2}, {"label": "spam", "score": 0.8}]"#,
        )
        .unwrap();
        assert!(matches!(output, ClassifierOutput::Flat(_)));
        assert_eq!(output.spam_probability(), 0.8);
    }

    #[test]
    fn nested_output_takes_maximum_across_groups() {
        let output: ClassifierOutput = serde_json::from_str(
            r#"[[{"label": "SPAM", "score": 0.3}], [{"label": "SPAM", "score": 0.65}, {"label": "HAM", "score": 0.35}]]"#,
        )
        .unwrap();
        assert!(matches!(output, ClassifierOutput::Nested(_)));
        assert_eq!(output.spam_probability(), 0.65);
    }

    #[test]
    fn missing_spam_label_is_zero() {
        let output = ClassifierOutput::Flat(vec![LabelScore {
            label: "HAM".to_string(),
            score: 0.99,
        }]);
        assert_eq!(output.spam_probability(), 0.0);
    }
}
