//! Error types for gambit.
//!
//! This module provides exhaustive, strongly-typed errors for all operations
//! in the library, enabling precise error handling and informative messages.
//! Variants mirror the error taxonomy table in the design spec.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in gambit operations.
#[derive(Debug, Error)]
pub enum GambitError {
    /// `KmerSpec` construction was given an invalid prefix or k.
    #[error("invalid k-mer spec: {details}")]
    InvalidKmerSpec { details: String },

    /// A non-ACGT byte was found while encoding a k-mer directly (not via
    /// the signature builder, which swallows this one per the builder's
    /// documented skip policy).
    #[error("invalid base '{}' at position {position}", *base as char)]
    InvalidNucleotide { base: u8, position: usize },

    /// The signature file's header, bounds, or value ranges failed
    /// validation on open or first access.
    #[error("corrupt signature file '{path}': {details}")]
    CorruptSignatureFile { path: PathBuf, details: String },

    /// The signature store's IDs and the metadata store's genome
    /// accessions disagree.
    #[error("reference mismatch: {details}")]
    ReferenceMismatch { details: String },

    /// A query's `KmerSpec` does not match the reference set's `KmerSpec`.
    #[error("dimension mismatch: query spec {query} does not match reference spec {reference}")]
    DimensionMismatch { query: String, reference: String },

    /// A cancellation token fired mid-operation.
    #[error("operation cancelled")]
    Cancelled,

    /// Failed to read or write a file.
    #[error("failed to access '{path}': {source}")]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to parse a CSV metadata table.
    #[error("failed to parse metadata table '{path}': {source}")]
    Csv {
        #[source]
        source: csv::Error,
        path: PathBuf,
    },

    /// Failed to (de)serialize JSON metadata.
    #[error("JSON error: {source}")]
    Json {
        #[source]
        source: serde_json::Error,
    },
}

impl GambitError {
    pub(crate) fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            source,
            path: path.into(),
        }
    }

    pub(crate) fn csv(source: csv::Error, path: impl Into<PathBuf>) -> Self {
        Self::Csv {
            source,
            path: path.into(),
        }
    }

    /// Returns `true` if this error represents structural corruption that
    /// should abort immediately rather than being treated like ordinary
    /// bad user input (see the CLI's exit code policy).
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::CorruptSignatureFile { .. } | Self::ReferenceMismatch { .. }
        )
    }
}

impl From<serde_json::Error> for GambitError {
    fn from(source: serde_json::Error) -> Self {
        Self::Json { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_nucleotide_display() {
        let err = GambitError::InvalidNucleotide {
            base: b'N',
            position: 5,
        };
        assert_eq!(err.to_string(), "invalid base 'N' at position 5");
    }

    #[test]
    fn dimension_mismatch_display() {
        let err = GambitError::DimensionMismatch {
            query: "(ATGAC, 11)".into(),
            reference: "(ATGAC, 13)".into(),
        };
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn cancelled_display() {
        assert_eq!(GambitError::Cancelled.to_string(), "operation cancelled");
    }

    #[test]
    fn is_corruption_classification() {
        assert!(GambitError::CorruptSignatureFile {
            path: "x.gs".into(),
            details: "bad magic".into()
        }
        .is_corruption());
        assert!(!GambitError::Cancelled.is_corruption());
    }
}
