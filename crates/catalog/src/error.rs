//! Error types produced by the catalog crate.
//!
//! Every variant of [`CatalogError`] is a load-time configuration failure: a catalog
//! that cannot be read or normalized is fatal and must stop the process before any
//! query is served. [`RecordError`] describes why a single upstream record was
//! rejected and is always wrapped with its source and position.
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading and normalizing insurer catalogs.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The catalog file is not a JSON array of upstream records.
    #[error("failed to parse catalog {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A record inside an otherwise valid catalog could not be normalized.
    #[error("invalid record #{index} in source '{source_name}': {reason}")]
    InvalidRecord {
        source_name: String,
        index: usize,
        #[source]
        reason: RecordError,
    },

    /// A source profile was declared without a name.
    #[error("catalog source name must not be empty")]
    EmptySourceName,

    /// Two source profiles share the same name.
    #[error("catalog source '{0}' declared more than once")]
    DuplicateSource(String),
}

/// Reasons a single upstream record is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// `year` is neither an integer nor a numeric string.
    #[error("year {0} is not an integer")]
    InvalidYear(String),

    /// `make.makeString` is blank, so neither brand nor sub-brand can be derived.
    #[error("make.makeString is empty")]
    EmptyMake,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_record_mentions_source_and_index() {
        let err = CatalogError::InvalidRecord {
            source_name: "hdi".into(),
            index: 4,
            reason: RecordError::InvalidYear("\"20XX\"".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("hdi"));
        assert!(msg.contains("#4"));
        assert!(msg.contains("20XX"));
    }

    #[test]
    fn io_error_exposes_source() {
        let err = CatalogError::Io {
            path: PathBuf::from("missing.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert!(err.to_string().contains("missing.json"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn duplicate_source_message() {
        let err = CatalogError::DuplicateSource("chubb".into());
        assert_eq!(err.to_string(), "catalog source 'chubb' declared more than once");
    }
}
