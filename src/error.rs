//! Error types for ndpa operations.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for NDPA operations.
///
/// Only failures that abort a whole import or export end up here.
/// Recoverable problems (a malformed record, unreadable slide metadata)
/// are collected in a [`ConversionReport`](crate::conversion::ConversionReport)
/// instead.
#[derive(Debug, Error)]
pub enum NdpaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot convert annotations for {path}: {message}")]
    Precondition { path: PathBuf, message: String },

    #[error("No NDPA file for this image: {path}")]
    AnnotationFileMissing { path: PathBuf },

    #[error("Failed to parse NDPA XML from {path}: {message}")]
    NdpaXmlParse { path: PathBuf, message: String },

    #[error("Failed to write NDPA XML to {path}: {message}")]
    NdpaWrite { path: PathBuf, message: String },

    #[error("Failed to back up {path} before overwriting: {source}")]
    BackupWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse annotation JSON from {path}: {source}")]
    AnnotationJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write annotation JSON to {path}: {source}")]
    AnnotationJsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse slide info from {path}: {message}")]
    SlideInfoParse { path: PathBuf, message: String },

    #[error("Failed to serialize conversion report: {0}")]
    ReportSerialize(#[source] serde_json::Error),

    #[error("Conversion produced {warning_count} warning(s) (strict mode)")]
    StrictWarnings { warning_count: usize },
}

impl NdpaError {
    /// True for failures detected before any file was read or written.
    pub fn is_precondition(&self) -> bool {
        matches!(self, NdpaError::Precondition { .. })
    }
}
