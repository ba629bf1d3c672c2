use std::{sync::Arc, time::Duration};

use common::config::DEFAULT_CLASSIFIER_TIMEOUT_MS;
#[cfg(not(test))]
use tracing::{debug, warn};
#[cfg(test)]
use {println as debug, println as warn};

use crate::{
    classifier::{ClassifierError, TextClassifier},
    scorers::count_keyword_hits,
};

/// Longest input handed to the classifier, in characters.
pub const MAX_CLASSIFIER_CHARS: usize = 512;
/// Returned for blank text: not enough signal either way.
pub const NEUTRAL_TEXT_SCORE: f64 = 50.0;
pub const FALLBACK_SCORE_CAP: f64 = 95.0;
pub const FALLBACK_DENSITY_WEIGHT: f64 = 300.0;

pub const FRAUD_KEYWORDS: [&str; 20] = [
    "free", "win", "prize", "urgent", "password", "verify", "account", "bank", "pay", "security",
    "update", "login", "suspend", "limited", "offer", "claim", "reward", "bonus", "selected",
    "winner",
];

/// Lexical fraud-likelihood scorer in [0, 100].
///
/// Uses the configured classifier when there is one and falls back to keyword
/// density whenever the classifier is absent, fails or times out.
#[derive(Clone)]
pub struct KeywordHeuristic {
    classifier: Option<Arc<dyn TextClassifier>>,
    timeout: Duration,
}

impl Default for KeywordHeuristic {
    fn default() -> Self {
        Self::fallback_only()
    }
}

impl KeywordHeuristic {
    pub fn new(classifier: Arc<dyn TextClassifier>, timeout: Duration) -> Self {
        Self {
            classifier: Some(classifier),
            timeout,
        }
    }

    pub fn fallback_only() -> Self {
        Self {
            classifier: None,
            timeout: Duration::from_millis(DEFAULT_CLASSIFIER_TIMEOUT_MS),
        }
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    pub async fn score(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return NEUTRAL_TEXT_SCORE;
        }

        let Some(classifier) = &self.classifier else {
            return Self::fallback_score(text);
        };

        match self.classify(classifier.as_ref(), text).await {
            Ok(score) => score,
            Err(e) => {
                warn!("Text classifier unavailable, using keyword fallback: {}", e);
                metrics::counter!("fraud_check_classifier_fallbacks_total").increment(1);
                Self::fallback_score(text)
            }
        }
    }

    async fn classify(
        &self,
        classifier: &dyn TextClassifier,
        text: &str,
    ) -> Result<f64, ClassifierError> {
        let truncated = truncate_chars(text, MAX_CLASSIFIER_CHARS);
        debug!("Classifying {} characters of text", truncated.chars().count());

        let output = tokio::time::timeout(self.timeout, classifier.classify(truncated))
            .await
            .map_err(|_| ClassifierError::Timeout(self.timeout))??;

        let probability = output.spam_probability();
        if !probability.is_finite() {
            return Err(ClassifierError::Malformed(format!(
                "SPAM probability {} is not finite",
                probability
            )));
        }

        Ok((probability * 100.0).clamp(0.0, 100.0))
    }

    /// Keyword density scaled to at most 95; blank text scores 50.
    pub fn fallback_score(text: &str) -> f64 {
        let lower = text.to_lowercase();
        let word_count = lower.split_whitespace().count();
        if word_count == 0 {
            return NEUTRAL_TEXT_SCORE;
        }

        let hits = count_keyword_hits(&lower, &FRAUD_KEYWORDS);
        let density = hits as f64 / word_count as f64;
        (density * FALLBACK_DENSITY_WEIGHT).min(FALLBACK_SCORE_CAP)
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
