use std::{
    io::{BufRead, BufReader, Write},
    path::PathBuf,
    sync::{Arc, PoisonError, RwLock},
};

use async_trait::async_trait;
use thiserror::Error;

use crate::model::CorpusRecord;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("corpus source {source_name} is unavailable: {reason}")]
    Unavailable { source_name: String, reason: String },

    #[error("corpus io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corpus record on line {line} is malformed: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("corpus serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Supplier of fraud observations (scrapers, feeds, exports).
#[async_trait]
pub trait CorpusSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch(&self) -> Result<Vec<CorpusRecord>, CorpusError>;
}

/// Append-only corpus of observed fraud records.
///
/// Readers work on an `Arc` snapshot. Appends clone the record list when a
/// snapshot is still alive, so a snapshot never changes underneath its reader.
#[derive(Debug, Default)]
pub struct FraudCorpus {
    records: RwLock<Arc<Vec<CorpusRecord>>>,
}

impl FraudCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<CorpusRecord>) -> Self {
        Self {
            records: RwLock::new(Arc::new(records)),
        }
    }

    pub fn snapshot(&self) -> Arc<Vec<CorpusRecord>> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn append(&self, new_records: impl IntoIterator<Item = CorpusRecord>) -> usize {
        let new_records: Vec<CorpusRecord> = new_records.into_iter().collect();
        let added = new_records.len();
        if added == 0 {
            return 0;
        }

        let mut guard = self.records.write().unwrap_or_else(PoisonError::into_inner);
        Arc::make_mut(&mut *guard).extend(new_records);
        added
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes one JSON record per line; returns the number of records written.
    pub fn export_jsonl<W: Write>(&self, mut writer: W) -> Result<usize, CorpusError> {
        let snapshot = self.snapshot();
        for record in snapshot.iter() {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        tracing::info!("Exported {} corpus records", snapshot.len());
        Ok(snapshot.len())
    }
}

/// Fetches every source concurrently and appends what arrives.
///
/// A failing source contributes no records; ingestion carries on with the rest.
pub async fn ingest(corpus: &FraudCorpus, sources: &[Arc<dyn CorpusSource>]) -> usize {
    let results =
        futures::future::join_all(sources.iter().map(|source| async move {
            (source.name().to_string(), source.fetch().await)
        }))
        .await;

    let mut added = 0;
    for (name, result) in results {
        match result {
            Ok(records) => {
                let count = corpus.append(records);
                tracing::info!(source = %name, count, "Ingested corpus records");
                added += count;
            }
            Err(e) => {
                tracing::warn!(source = %name, error = %e, "Corpus source failed, skipping");
            }
        }
    }
    added
}

/// Reads records previously written by [`FraudCorpus::export_jsonl`] or any
/// feed with at least a `value` or `title` field per line.
pub struct JsonlCorpusSource {
    path: PathBuf,
    name: String,
}

impl JsonlCorpusSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("jsonl:{}", path.display());
        Self { path, name }
    }

    pub fn parse<R: BufRead>(reader: R) -> Result<Vec<CorpusRecord>, CorpusError> {
        let mut records = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|e| CorpusError::Malformed {
                line: index + 1,
                reason: e.to_string(),
            })?;
            records.push(record);
        }
        Ok(records)
    }
}

#[async_trait]
impl CorpusSource for JsonlCorpusSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<CorpusRecord>, CorpusError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let file = std::fs::File::open(path)?;
            Self::parse(BufReader::new(file))
        })
        .await
        .map_err(|e| CorpusError::Unavailable {
            source_name: self.name.clone(),
            reason: e.to_string(),
        })?
    }
}
