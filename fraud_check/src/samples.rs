use async_trait::async_trait;
use scoring::{
    corpus::{CorpusError, CorpusSource},
    model::{CorpusRecord, Severity},
};

const INTERNAL_SOURCE: &str = "Internal Database";

/// Fixed fraud samples standing in for the web scraper.
#[derive(Debug, Clone, Copy, Default)]
pub struct InternalSampleSource;

impl InternalSampleSource {
    pub fn records() -> Vec<CorpusRecord> {
        [
            ("Phishing Email: fraud@example.com", "Phishing Email", Severity::High),
            ("Fake Investment: java.sgvr.gait", "Fake Investment", Severity::High),
            ("Clone Website: www.fakebank.com", "Clone Website", Severity::Medium),
        ]
        .into_iter()
        .map(|(title, category, severity)| {
            CorpusRecord::new(INTERNAL_SOURCE, title, category, severity)
        })
        .collect()
    }
}

#[async_trait]
impl CorpusSource for InternalSampleSource {
    fn name(&self) -> &str {
        INTERNAL_SOURCE
    }

    async fn fetch(&self) -> Result<Vec<CorpusRecord>, CorpusError> {
        Ok(Self::records())
    }
}
