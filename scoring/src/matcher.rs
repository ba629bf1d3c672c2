use std::{collections::HashMap, fs, path::Path};

use thiserror::Error;

use crate::{
    model::{CorpusRecord, KnownFraudRecord, QueryKind},
    patterns::PatternLibrary,
};

pub const WEB_MATCH_WEIGHT: f64 = 15.0;

#[derive(Debug, Error)]
pub enum KnownFraudTableError {
    #[error("failed to read known fraud table {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse known fraud table {path}: {source}")]
    Parse {
        path: String,
        source: serde_yml::Error,
    },
}

/// Exact-match table of curated fraud identifiers, keyed by kind and normalized value.
#[derive(Debug, Clone, Default)]
pub struct KnownFraudTable {
    entries: HashMap<(QueryKind, String), KnownFraudRecord>,
}

impl KnownFraudTable {
    /// Values are expected in normalized form (canonical phones, lower-cased emails).
    pub fn from_records(records: impl IntoIterator<Item = KnownFraudRecord>) -> Self {
        let entries = records
            .into_iter()
            .map(|record| ((record.kind, record.value.clone()), record))
            .collect();
        Self { entries }
    }

    /// Loads a YAML list of records.
    pub fn load_yaml(path: &Path) -> Result<Self, KnownFraudTableError> {
        let contents = fs::read_to_string(path).map_err(|source| KnownFraudTableError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let records: Vec<KnownFraudRecord> =
            serde_yml::from_str(&contents).map_err(|source| KnownFraudTableError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        tracing::info!(path = %path.display(), count = records.len(), "Loaded known fraud table");
        Ok(Self::from_records(records))
    }

    pub fn get(&self, kind: QueryKind, normalized_value: &str) -> Option<&KnownFraudRecord> {
        self.entries.get(&(kind, normalized_value.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Corpus records whose value contains the query, case-insensitively.
///
/// Lazy and restartable: clone it to iterate again from the start.
#[derive(Debug, Clone)]
pub struct CorpusMatches<'a> {
    needle: Option<String>,
    records: std::slice::Iter<'a, CorpusRecord>,
}

impl<'a> Iterator for CorpusMatches<'a> {
    type Item = &'a CorpusRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let needle = self.needle.as_deref()?;
        self.records
            .by_ref()
            .find(|record| record.value.to_lowercase().contains(needle))
    }
}

/// Looks queries up in the known-fraud table and the observed fraud corpus.
#[derive(Debug, Clone, Default)]
pub struct FraudCorpusMatcher {
    known_frauds: KnownFraudTable,
    patterns: PatternLibrary,
}

impl FraudCorpusMatcher {
    pub fn new(known_frauds: KnownFraudTable, patterns: PatternLibrary) -> Self {
        Self {
            known_frauds,
            patterns,
        }
    }

    pub fn patterns(&self) -> &PatternLibrary {
        &self.patterns
    }

    pub fn known_frauds(&self) -> &KnownFraudTable {
        &self.known_frauds
    }

    pub fn lookup_known(&self, query: &str, kind: QueryKind) -> Option<&KnownFraudRecord> {
        let normalized = match kind {
            QueryKind::PhoneNumber => self.patterns.normalize_phone(query)?.to_string(),
            QueryKind::Email => query.trim().to_lowercase(),
            _ => query.trim().to_string(),
        };
        self.known_frauds.get(kind, &normalized)
    }

    /// An empty query matches nothing; whitespace is an ordinary needle.
    pub fn match_corpus<'a>(&self, query: &str, corpus: &'a [CorpusRecord]) -> CorpusMatches<'a> {
        let needle = if query.is_empty() {
            None
        } else {
            Some(query.to_lowercase())
        };
        CorpusMatches {
            needle,
            records: corpus.iter(),
        }
    }

    pub fn web_risk(match_count: usize) -> f64 {
        match_count as f64 * WEB_MATCH_WEIGHT
    }
}
