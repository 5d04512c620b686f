//! Error types for the indexing pipeline
//!
//! Two layers: `StoreError` for the graph-store boundary and `IndexError`
//! for everything the pipeline itself can fail with. Per-file problems are
//! logged and suppressed inside passes; only discovery, transaction and
//! cancellation errors surface to the caller of `Orchestrator::run`.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised at the graph-store boundary.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("node not found for qualified name '{qn}'")]
    NodeNotFound { qn: String },

    #[error("store backend error during {operation}: {cause}")]
    Backend { operation: String, cause: String },

    #[error("no transaction is active for this operation")]
    NoTransaction,

    #[error("store lock was poisoned, likely due to a panic in another thread")]
    Poisoned,
}

/// Main error type for pipeline operations.
#[derive(Error, Debug)]
pub enum IndexError {
    /// File discovery failed. Fatal: without a file list there is no run.
    #[error("failed to discover files under '{root}': {reason}")]
    Discover { root: PathBuf, reason: String },

    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A single file failed to parse. Non-fatal: logged, the file
    /// contributes nothing to the run.
    #[error("failed to parse {language} file '{path}': {reason}")]
    Parse {
        path: PathBuf,
        language: String,
        reason: String,
    },

    /// Extraction failed for one file. Non-fatal, same policy as `Parse`.
    #[error("extraction failed for '{path}': {reason}")]
    Extraction { path: PathBuf, reason: String },

    /// A batch write failed mid-pass. The pass is abandoned but the run
    /// continues; missing edges are recoverable by reindexing.
    #[error("store batch failed during pass '{pass}': {source}")]
    StoreBatch { pass: String, source: StoreError },

    /// The transactional wrapper failed. Fatal: the whole run rolls back.
    #[error("transaction failed: {source}")]
    Transaction { source: StoreError },

    #[error("indexing run cancelled")]
    Cancelled,

    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    #[error("{0}")]
    General(String),
}

impl IndexError {
    /// Whether the orchestrator must abort the run on this error.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Discover { .. } | Self::Transaction { .. } | Self::Cancelled
        )
    }
}

impl From<StoreError> for IndexError {
    /// A store error escaping without a pass wrapper escalates to a
    /// transaction failure.
    fn from(source: StoreError) -> Self {
        Self::Transaction { source }
    }
}

/// Result type alias for pipeline operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_classification() {
        let discover = IndexError::Discover {
            root: PathBuf::from("/repo"),
            reason: "permission denied".into(),
        };
        assert!(discover.is_fatal());

        let parse = IndexError::Parse {
            path: PathBuf::from("a.go"),
            language: "Go".into(),
            reason: "syntax".into(),
        };
        assert!(!parse.is_fatal());

        let batch = IndexError::StoreBatch {
            pass: "calls".into(),
            source: StoreError::Backend {
                operation: "insert_edge_batch".into(),
                cause: "disk full".into(),
            },
        };
        assert!(!batch.is_fatal());
        assert!(IndexError::Cancelled.is_fatal());
    }

    #[test]
    fn error_messages_carry_context() {
        let err = IndexError::Parse {
            path: PathBuf::from("src/handler.go"),
            language: "Go".into(),
            reason: "invalid node".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("src/handler.go"));
        assert!(msg.contains("Go"));
    }
}
