use crate::{model::FeatureVector, scorers::count_keyword_hits};

pub const PATTERN_RISK_WEIGHT: f64 = 5.0;

pub const STRUCTURAL_KEYWORDS: [&str; 12] = [
    "free", "win", "prize", "urgent", "password", "verify", "account", "bank", "pay", "security",
    "update", "login",
];

/// Derives the structural feature vector of a raw query.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralFeatureExtractor;

impl StructuralFeatureExtractor {
    pub fn extract(&self, query: &str) -> FeatureVector {
        let length = query.chars().count();
        if length == 0 {
            return FeatureVector::default();
        }

        // Any script's numerals count, not only ASCII.
        let digits = query.chars().filter(|c| c.is_numeric()).count();
        let specials = query
            .chars()
            .filter(|c| !c.is_alphanumeric() && !c.is_whitespace())
            .count();

        FeatureVector {
            length,
            digit_ratio: digits as f64 / length as f64,
            special_ratio: specials as f64 / length as f64,
            keyword_hits: count_keyword_hits(&query.to_lowercase(), &STRUCTURAL_KEYWORDS),
        }
    }

    /// Sum of all features times 5.
    ///
    /// The raw character length is added to two ratios and a count. The mixed
    /// units are kept as they are: the risk thresholds are calibrated on them.
    pub fn pattern_risk(features: &FeatureVector) -> f64 {
        features.sum() * PATTERN_RISK_WEIGHT
    }
}
