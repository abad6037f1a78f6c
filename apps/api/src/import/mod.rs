//! Resume import: the two-phase session that turns an uploaded file into a
//! `CanonicalResume`.
//!
//! Phase 1 (`load`): validate → extract text layer → normalize.
//! Phase 2 (`parse`): deterministic signals → structured extraction → builder.
//!
//! `ImportError` is the one error type callers ever see from this module.

pub mod builder;
pub mod handlers;
pub mod orchestrator;
pub mod session;

use serde::Serialize;
use thiserror::Error;

use crate::extraction::ServiceError;
use session::ImportState;

pub use orchestrator::{FileUpload, ImportOrchestrator, LoadReport, ParseOptions};

const MIB: u64 = 1024 * 1024;

pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * MIB;

const GENERIC_FAILURE_MESSAGE: &str = "Failed to analyze resume. Please try again.";
const NO_DATA_MESSAGE: &str = "No data received from resume analysis";

/// Per-session settings, fixed when the orchestrator is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportConfig {
    pub max_file_bytes: u64,
    /// Verbose diagnostics; also forwarded to the extraction service.
    pub development_mode: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            development_mode: false,
        }
    }
}

impl ImportConfig {
    pub fn max_file_mb(&self) -> u64 {
        self.max_file_bytes / MIB
    }
}

/// Normalized import failure. `Display` is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("Please upload a PDF or DOCX file")]
    InvalidFileType { file_name: String },

    #[error("File size must be less than {limit_mb}MB")]
    FileTooLarge { limit_mb: u64 },

    #[error("No text content extracted from document")]
    EmptyContent,

    #[error("{0}")]
    ExtractionFailed(String),

    #[error("Resume parsing service is temporarily unavailable. Please try again later.")]
    ServiceUnavailable,

    #[error("An import is already in progress ({0}). Wait for it to finish or reset the session.")]
    Busy(ImportState),

    #[error("Cannot {action} while the import is {state}")]
    InvalidTransition {
        action: &'static str,
        state: ImportState,
    },

    #[error("The import was cancelled")]
    Cancelled,

    #[error("Something went wrong while importing the file. Please try again.")]
    Internal(String),
}

impl ImportError {
    pub fn code(&self) -> &'static str {
        match self {
            ImportError::InvalidFileType { .. } => "INVALID_FILE_TYPE",
            ImportError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            ImportError::EmptyContent => "EMPTY_CONTENT",
            ImportError::ExtractionFailed(_) => "EXTRACTION_FAILED",
            ImportError::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ImportError::Busy(_) => "IMPORT_BUSY",
            ImportError::InvalidTransition { .. } => "INVALID_TRANSITION",
            ImportError::Cancelled => "CANCELLED",
            ImportError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether repeating the same action can succeed without changing the input.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            ImportError::ExtractionFailed(_)
                | ImportError::ServiceUnavailable
                | ImportError::Busy(_)
                | ImportError::Internal(_)
        )
    }
}

/// Wire form of an `ImportError`, as kept in session snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorSummary {
    pub code: &'static str,
    pub message: String,
    pub retryable: bool,
}

impl From<&ImportError> for ErrorSummary {
    fn from(err: &ImportError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
            retryable: err.retryable(),
        }
    }
}

/// Collapses every extraction-service failure into the import taxonomy.
pub fn translate_service_error(err: &ServiceError) -> ImportError {
    if err.is_unavailable() {
        return ImportError::ServiceUnavailable;
    }
    match err {
        ServiceError::EmptyResponse => ImportError::ExtractionFailed(NO_DATA_MESSAGE.to_string()),
        other => ImportError::ExtractionFailed(
            other
                .service_message()
                .unwrap_or(GENERIC_FAILURE_MESSAGE)
                .to_string(),
        ),
    }
}
