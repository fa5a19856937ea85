//! Sync settings, loaded from YAML

use crate::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How much of an import one host transaction covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionScope {
    #[default]
    Workbook,
    Sheet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Rows between progress reports
    pub progress_batch: usize,
    /// Errors listed in the console summary
    pub error_preview: usize,
    /// Attribute matched against textual row keys
    pub fallback_key_attribute: String,
    pub transaction_scope: TransactionScope,
    pub include_headers: bool,
    pub include_grand_totals: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            progress_batch: 10,
            error_preview: 10,
            fallback_key_attribute: "Mark".to_string(),
            transaction_scope: TransactionScope::Workbook,
            include_headers: true,
            include_grand_totals: true,
        }
    }
}

impl SyncConfig {
    pub fn load(path: &Path) -> SyncResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SyncError::from_io(path, e))?;
        let config: SyncConfig = serde_yaml::from_str(&content)?;
        if config.progress_batch == 0 {
            return Err(SyncError::Parse(
                "progress_batch must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    /// Config from `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> SyncResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
