use std::time::Instant;

#[cfg(not(test))]
use tracing::{debug, info};
#[cfg(test)]
use {println as debug, println as info};

use crate::{
    matcher::FraudCorpusMatcher,
    model::{
        round_to_tenth, CorpusRecord, FraudInvestigation, PhoneCheck, QueryKind, RiskAssessment,
        RiskLevel,
    },
    patterns::PatternLibrary,
    scorers::{KeywordHeuristic, StructuralFeatureExtractor},
};

pub const TEXT_SCORE_WEIGHT: f64 = 0.6;
pub const MAX_RISK_SCORE: f64 = 100.0;

/// Combines the text, structural and corpus signals into one verdict.
///
/// Holds no mutable state: the corpus is passed in per call, so identical
/// inputs always give identical assessments.
#[derive(Clone, Default)]
pub struct RiskAggregator {
    keyword_heuristic: KeywordHeuristic,
    feature_extractor: StructuralFeatureExtractor,
    matcher: FraudCorpusMatcher,
}

impl RiskAggregator {
    pub fn new(keyword_heuristic: KeywordHeuristic, matcher: FraudCorpusMatcher) -> Self {
        Self {
            keyword_heuristic,
            feature_extractor: StructuralFeatureExtractor,
            matcher,
        }
    }

    pub fn matcher(&self) -> &FraudCorpusMatcher {
        &self.matcher
    }

    pub async fn assess(&self, query: &str, corpus: &[CorpusRecord]) -> RiskAssessment {
        let started = Instant::now();

        let text_score = self.keyword_heuristic.score(query).await;

        let features = self.feature_extractor.extract(query);
        let pattern_risk = StructuralFeatureExtractor::pattern_risk(&features);

        let matches: Vec<CorpusRecord> = self.matcher.match_corpus(query, corpus).cloned().collect();
        let web_risk = FraudCorpusMatcher::web_risk(matches.len());

        let total_risk =
            (text_score * TEXT_SCORE_WEIGHT + pattern_risk + web_risk).clamp(0.0, MAX_RISK_SCORE);
        let risk_level = RiskLevel::from_score(total_risk);

        debug!(
            "Scored query: text={} pattern={} web={} total={}",
            text_score, pattern_risk, web_risk, total_risk
        );
        metrics::counter!("fraud_check_assessments_total", "level" => risk_level.to_string())
            .increment(1);
        metrics::histogram!("fraud_check_assess_seconds").record(started.elapsed().as_secs_f64());

        RiskAssessment {
            risk_score: round_to_tenth(total_risk),
            risk_level,
            text_analysis_score: round_to_tenth(text_score),
            pattern_analysis_score: round_to_tenth(pattern_risk),
            web_matches: matches.len(),
            matches,
            features,
        }
    }

    /// Kind detection, phone signature check, known-fraud lookup and assessment.
    ///
    /// Checks that do not apply to the query (an unnormalizable phone, an
    /// unknown kind) are skipped; the assessment always runs.
    pub async fn investigate(
        &self,
        query: &str,
        kind_hint: Option<QueryKind>,
        corpus: &[CorpusRecord],
    ) -> FraudInvestigation {
        let kind = kind_hint.unwrap_or_else(|| PatternLibrary::classify_query_kind(query));

        let phone_check = match kind {
            QueryKind::PhoneNumber => {
                self.matcher
                    .patterns()
                    .normalize_phone(query)
                    .map(|normalized| PhoneCheck {
                        verdict: PatternLibrary::match_high_risk_phone_pattern(&normalized),
                        normalized,
                    })
            }
            _ => None,
        };

        let known_fraud = self.matcher.lookup_known(query, kind).cloned();
        let assessment = self.assess(query, corpus).await;

        info!(
            "Investigated {} query: level={} known_fraud={}",
            kind,
            assessment.risk_level,
            known_fraud.is_some()
        );

        FraudInvestigation {
            query: query.to_string(),
            kind,
            phone_check,
            known_fraud,
            assessment,
        }
    }
}
