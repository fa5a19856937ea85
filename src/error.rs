use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type SyncResult<T> = Result<T, SyncError>;

/// Failures that abort a whole export or import.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("File is open in another application: {}", .0.display())]
    FileLocked(PathBuf),

    #[error("Failed to read workbook: {0}")]
    SpreadsheetRead(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Transaction failed: {0}")]
    HostTransaction(String),

    #[error("Background worker failed: {0}")]
    Worker(String),
}

impl SyncError {
    /// Map an IO failure on `path`, keeping "file already open" distinguishable.
    pub fn from_io(path: &Path, err: std::io::Error) -> Self {
        if is_locked(&err) {
            SyncError::FileLocked(path.to_path_buf())
        } else {
            SyncError::Io(err)
        }
    }
}

/// Windows sharing and lock violations (ERROR_SHARING_VIOLATION = 32,
/// ERROR_LOCK_VIOLATION = 33). Other platforms have no mandatory file locks,
/// so a plain permission error stays an IO error there.
fn is_locked(err: &std::io::Error) -> bool {
    cfg!(windows) && matches!(err.raw_os_error(), Some(32) | Some(33))
}

/// Per-cell codec failures. Always recovered into an [`ErrorRecord`], which
/// carries the attribute name, so messages leave it out.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("is read-only")]
    ReadOnly { name: String },

    #[error("expects {expected}, got '{value}'")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        value: String,
    },

    #[error("no element or item named '{value}'")]
    LinkNotFound { name: String, value: String },

    #[error("{reason}")]
    HostRejected { name: String, reason: String },
}

/// Failures reported by the host document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    #[error("no open transaction")]
    NoTransaction,

    #[error("a transaction is already open")]
    TransactionOpen,

    #[error("element {0} does not exist")]
    MissingEntity(i64),

    #[error("attribute '{0}' not found")]
    MissingAttribute(String),

    #[error("attribute '{0}' is read-only")]
    ReadOnly(String),

    #[error("attribute '{name}' stores {expected}")]
    WrongStorage { name: String, expected: &'static str },

    #[error("no type named '{0}' in this category")]
    UnknownType(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Codec,
    RowKeyUnresolved,
    SheetNotFound,
    /// Two rows gave different values for one shared type attribute
    Conflict,
    Host,
}

/// One recovered failure inside a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
    /// Element id, row key, or sheet name
    pub key: String,
    /// Attribute name or a short description of what was attempted
    pub field: String,
    pub message: String,
    pub kind: ErrorKind,
}

impl ErrorRecord {
    pub fn new(
        kind: ErrorKind,
        key: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            field: field.into(),
            message: message.into(),
            kind,
        }
    }

    pub fn codec(key: impl Into<String>, err: &CodecError) -> Self {
        let field = match err {
            CodecError::ReadOnly { name }
            | CodecError::TypeMismatch { name, .. }
            | CodecError::LinkNotFound { name, .. }
            | CodecError::HostRejected { name, .. } => name.clone(),
        };
        Self::new(ErrorKind::Codec, key, field, err.to_string())
    }

    /// Text for the "Description" column of the error report.
    pub fn description(&self) -> String {
        if self.field.is_empty() {
            self.message.clone()
        } else {
            format!("{}: {}", self.field, self.message)
        }
    }
}
