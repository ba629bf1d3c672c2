use common::config::DEFAULT_COUNTRY_CODE;
use regex::Regex;

use crate::model::{PhoneCandidate, QueryKind, RiskLevel, RiskVerdict};

const NATIONAL_DIGITS: usize = 10;
const PHONE_CHECK_SOURCE: &str = "Telecom Database";

/// A documented high-risk phone number signature.
pub struct PhoneRule {
    pub name: &'static str,
    pub pattern: Regex,
    pub reason: &'static str,
}

lazy_static::lazy_static! {
    /// Evaluated in order; the first matching pattern decides the kind.
    static ref QUERY_KIND_PATTERNS: Vec<(Regex, QueryKind)> = vec![
        (
            Regex::new(r"\b(?:\d{4}[\s-]?){3}\d{4}\b").expect("card pattern"),
            QueryKind::CardNumber,
        ),
        (
            Regex::new(r"(?:\+\d{1,3}[\s-]?)?\d{3}[\s-]?\d{3}[\s-]?\d{4}").expect("phone pattern"),
            QueryKind::PhoneNumber,
        ),
        (
            Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("email pattern"),
            QueryKind::Email,
        ),
        (
            Regex::new(r"(?i)(?:https?://)?(?:www\.)?[a-z0-9-]+(?:\.[a-z0-9-]+)*\.[a-z]{2,}(?:/\S*)?")
                .expect("url pattern"),
            QueryKind::Url,
        ),
    ];

    static ref EMAIL_SHAPE: Regex =
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("email shape");

    /// Indian mobile fraud archetypes, matched against the canonical form.
    static ref HIGH_RISK_PHONE_RULES: Vec<PhoneRule> = vec![
        PhoneRule {
            name: "repeated_one_suffix",
            pattern: Regex::new(r"^\+91[6-9][0-9]{5}1111$").expect("phone rule"),
            reason: "Matches known fraud pattern: subscriber number ending in 1111",
        },
        PhoneRule {
            name: "repeated_nine_suffix",
            pattern: Regex::new(r"^\+91[6-9][0-9]{5}9999$").expect("phone rule"),
            reason: "Matches known fraud pattern: subscriber number ending in 9999",
        },
        PhoneRule {
            name: "repeated_four_block",
            pattern: Regex::new(r"^\+91[6-9]4444[0-9]{5}$").expect("phone rule"),
            reason: "Matches known fraud pattern: subscriber number opening with a 4444 block",
        },
    ];
}

/// Structural rules for query kinds and phone fraud signatures.
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    default_country_code: String,
}

impl Default for PatternLibrary {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTRY_CODE)
    }
}

impl PatternLibrary {
    pub fn new(default_country_code: &str) -> Self {
        let digits: String = default_country_code
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();
        let default_country_code = if digits.is_empty() {
            tracing::warn!(
                configured = default_country_code,
                "Invalid default country code, using {}",
                DEFAULT_COUNTRY_CODE
            );
            DEFAULT_COUNTRY_CODE.to_string()
        } else {
            digits
        };
        Self {
            default_country_code,
        }
    }

    pub fn default_country_code(&self) -> &str {
        &self.default_country_code
    }

    /// Card > phone > email > URL; the first pattern found anywhere in the query wins.
    pub fn classify_query_kind(query: &str) -> QueryKind {
        QUERY_KIND_PATTERNS
            .iter()
            .find(|(pattern, _)| pattern.is_match(query))
            .map(|(_, kind)| *kind)
            .unwrap_or(QueryKind::Unknown)
    }

    pub fn is_email(value: &str) -> bool {
        EMAIL_SHAPE.is_match(value.trim())
    }

    /// Reduces `raw` to `+<cc><10 digits>`.
    ///
    /// Ten remaining digits get the default country code; digits that already
    /// start with the default country code followed by ten digits are kept.
    /// Anything else is not a phone candidate.
    pub fn normalize_phone(&self, raw: &str) -> Option<PhoneCandidate> {
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

        if digits.len() == NATIONAL_DIGITS {
            return Some(PhoneCandidate::new(&self.default_country_code, &digits));
        }

        digits
            .strip_prefix(self.default_country_code.as_str())
            .filter(|national| national.len() == NATIONAL_DIGITS)
            .map(|national| PhoneCandidate::new(&self.default_country_code, national))
    }

    pub fn high_risk_phone_rules() -> &'static [PhoneRule] {
        &HIGH_RISK_PHONE_RULES
    }

    /// Any single rule match is `High`; no match is `Low`.
    pub fn match_high_risk_phone_pattern(candidate: &PhoneCandidate) -> RiskVerdict {
        let canonical = candidate.to_string();

        match HIGH_RISK_PHONE_RULES
            .iter()
            .find(|rule| rule.pattern.is_match(&canonical))
        {
            Some(rule) => {
                tracing::debug!(rule = rule.name, "High-risk phone signature matched");
                RiskVerdict {
                    level: RiskLevel::High,
                    reason: rule.reason.to_string(),
                    source: PHONE_CHECK_SOURCE.to_string(),
                }
            }
            None => RiskVerdict {
                level: RiskLevel::Low,
                reason: "No issues found".to_string(),
                source: PHONE_CHECK_SOURCE.to_string(),
            },
        }
    }
}
