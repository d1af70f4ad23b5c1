//! Catalog error types with clear, actionable messages

use std::path::PathBuf;
use thiserror::Error;

/// Boxed transport error, so sources other than HTTP can report failures too
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while syncing, loading or validating the catalog
///
/// Query and cart operations never fail; everything here comes from I/O or
/// from a dataset that cannot be read as a whole. A single malformed cell is
/// never an error, it falls back to a default value instead.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The metadata check or the download could not reach the remote resource
    #[error("Failed to reach the medication dataset at {resource}\n\nThe previous local copy (if any) is still in use. Check your connection and run:\n  vademecum sync")]
    Network {
        resource: String,
        #[source]
        source: BoxError,
    },

    /// The remote resource answered with a non-success status
    #[error("The medication dataset at {resource} answered HTTP {status}")]
    HttpStatus { resource: String, status: u16 },

    /// The dataset is structurally unreadable (no sheet, no header, no rows)
    #[error("Could not read the medication dataset from {origin}: {reason}")]
    DatasetParse { origin: String, reason: String },

    /// There is no cached dataset and no bundled snapshot to fall back to
    #[error("Medication data is unavailable: no dataset at {}\n\nTo download it, run:\n  vademecum sync", path.display())]
    DatasetMissing { path: PathBuf },

    /// A local filesystem operation failed
    #[error("Filesystem error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON snapshot could not be decoded or encoded
    #[error("Invalid catalog snapshot at {}", path.display())]
    Snapshot {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A loaded entry list failed validation
    #[error("Invalid catalog data: {reason}")]
    InvalidDataset { reason: String },
}

impl CatalogError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CatalogError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        CatalogError::DatasetParse {
            origin: origin.into(),
            reason: reason.into(),
        }
    }

    /// Whether the caller may retry and keep using any existing cache meanwhile
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CatalogError::Network { .. } | CatalogError::HttpStatus { .. }
        )
    }
}

/// Convenience `Result` type for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_errors_are_recoverable() {
        let err = CatalogError::Network {
            resource: "https://example.com/data.xlsx".to_string(),
            source: "connection reset".into(),
        };
        assert!(err.is_recoverable());

        let err = CatalogError::HttpStatus {
            resource: "https://example.com/data.xlsx".to_string(),
            status: 503,
        };
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_dataset_errors_are_not_recoverable() {
        let err = CatalogError::parse("payload", "no worksheet");
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("no worksheet"));

        let err = CatalogError::DatasetMissing {
            path: PathBuf::from("/tmp/medicamentos.xlsx"),
        };
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("vademecum sync"));
    }
}
