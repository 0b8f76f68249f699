//! # Store Errors
//!
//! Error types for the Balade record store.

use std::io;
use std::path::Path;

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Record store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Identifier is not a well-formed record id
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Document does not fit the Balade shape
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Search term could not be turned into a matcher
    #[error("Invalid search pattern: {0}")]
    InvalidPattern(String),

    /// Create request lacks one of the mandatory fields
    #[error("Missing or empty required fields: {}", .0.join(", "))]
    MissingRequiredFields(Vec<&'static str>),

    /// Disk I/O failure while loading or persisting the collection
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// Collection file could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A writer panicked while holding the collection lock
    #[error("Collection lock poisoned")]
    Poisoned,
}

impl StoreError {
    /// I/O error with a short description of what was attempted
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        StoreError::Io {
            context: context.into(),
            source,
        }
    }

    /// I/O error against a specific path
    pub fn io_at_path(action: &str, path: &Path, source: io::Error) -> Self {
        Self::io(format!("{} {}", action, path.display()), source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_message_includes_path() {
        let err = StoreError::io_at_path(
            "Failed to read",
            Path::new("/tmp/balades.json"),
            io::Error::new(io::ErrorKind::NotFound, "missing"),
        );
        assert_eq!(err.to_string(), "Failed to read /tmp/balades.json: missing");
    }

    #[test]
    fn test_missing_fields_message() {
        let err = StoreError::MissingRequiredFields(vec!["nom_poi", "categorie"]);
        assert_eq!(
            err.to_string(),
            "Missing or empty required fields: nom_poi, categorie"
        );
    }
}
