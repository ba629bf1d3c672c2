use std::path::{Path, PathBuf};

use common::config::ScoringConfig;
use scoring::{
    matcher::{KnownFraudTable, KnownFraudTableError},
    model::{KnownFraudRecord, QueryKind},
};

/// Confirmed fraud identifiers shipped with the service.
pub fn curated_known_frauds() -> KnownFraudTable {
    KnownFraudTable::from_records([
        KnownFraudRecord {
            kind: QueryKind::PhoneNumber,
            value: "+918888555555".to_string(),
            fraud_type: "SIM Swap Fraud".to_string(),
            reports: 15,
        },
        KnownFraudRecord {
            kind: QueryKind::PhoneNumber,
            value: "+919999111111".to_string(),
            fraud_type: "Impersonation Scam".to_string(),
            reports: 23,
        },
        KnownFraudRecord {
            kind: QueryKind::Email,
            value: "investment@quick-gain.com".to_string(),
            fraud_type: "Investment Scam".to_string(),
            reports: 37,
        },
    ])
}

/// Loads the configured table, resolving relative paths against `config_dir`.
///
/// Without a configured path the curated table is used.
pub fn load_known_frauds(
    config: &ScoringConfig,
    config_dir: &Path,
) -> Result<KnownFraudTable, KnownFraudTableError> {
    match &config.known_frauds_path {
        Some(path) => KnownFraudTable::load_yaml(&resolve(config_dir, path)),
        None => {
            tracing::info!("No known fraud table configured, using curated entries");
            Ok(curated_known_frauds())
        }
    }
}

fn resolve(config_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        config_dir.join(path)
    }
}
