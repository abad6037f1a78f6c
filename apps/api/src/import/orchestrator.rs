//! Import orchestrator: one per session, single-flight.
//!
//! Idle → Loading → Loaded → Parsing → Done, with Error reachable from
//! Loading or Parsing and a reset to Idle from anywhere. Every phase captures
//! the cancel epoch when it starts; a reset bumps the epoch, which aborts the
//! awaited work and makes any late result a no-op.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::builder::build_resume;
use super::session::{CancelSignal, ImportState, Phase, ProgressEvent, ProgressReporter};
use super::{translate_service_error, ErrorSummary, ImportConfig, ImportError};
use crate::document::signals::{estimate_tokens, DeterministicSignals};
use crate::document::{
    extract_text_layer, resolve_file_type, DegradedReason, DocumentContent, FileType, TextLayer,
};
use crate::extraction::{ExtractionRequest, StructuredExtractor};
use crate::models::resume::CanonicalResume;

const LOAD_STARTED: f32 = 0.2;
const LOAD_EXTRACTED: f32 = 0.8;
const PARSE_STARTED: f32 = 0.1;
const PARSE_REQUEST_SENT: f32 = 0.3;
const PHASE_COMPLETE: f32 = 1.0;

/// Blocking reader that turns an upload into its text layer.
type TextReader = Arc<dyn Fn(FileType, &[u8]) -> TextLayer + Send + Sync>;

#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParseOptions {
    pub user_id: Option<String>,
    #[serde(default)]
    pub is_example: bool,
}

/// Result of the loading phase. `no_text` is a warning, not a failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadReport {
    pub file_name: String,
    pub file_type: FileType,
    pub char_count: usize,
    pub token_estimate: usize,
    pub no_text: bool,
    pub degraded_reason: Option<DegradedReason>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub session_id: Uuid,
    pub state: ImportState,
    pub file_name: Option<String>,
    pub file_type: Option<FileType>,
    pub progress: Option<ProgressEvent>,
    pub no_text: bool,
    pub degraded_reason: Option<DegradedReason>,
    pub token_estimate: usize,
    pub last_error: Option<ErrorSummary>,
    pub result: Option<CanonicalResume>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

struct Inner {
    state: ImportState,
    file_name: Option<String>,
    document: Option<DocumentContent>,
    degraded: Option<DegradedReason>,
    last_error: Option<ImportError>,
    result: Option<CanonicalResume>,
    updated_at: DateTime<Utc>,
}

impl Inner {
    fn idle() -> Self {
        Self {
            state: ImportState::Idle,
            file_name: None,
            document: None,
            degraded: None,
            last_error: None,
            result: None,
            updated_at: Utc::now(),
        }
    }

    fn transition(&mut self, state: ImportState) {
        self.state = state;
        self.updated_at = Utc::now();
    }
}

pub struct ImportOrchestrator {
    id: Uuid,
    config: ImportConfig,
    extractor: Arc<dyn StructuredExtractor>,
    reader: TextReader,
    inner: Mutex<Inner>,
    progress: ProgressReporter,
    cancel: CancelSignal,
    created_at: DateTime<Utc>,
}

impl ImportOrchestrator {
    pub fn new(config: ImportConfig, extractor: Arc<dyn StructuredExtractor>) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            extractor,
            reader: Arc::new(extract_text_layer),
            inner: Mutex::new(Inner::idle()),
            progress: ProgressReporter::new(),
            cancel: CancelSignal::new(),
            created_at: Utc::now(),
        }
    }

    #[cfg(test)]
    fn with_reader(mut self, reader: TextReader) -> Self {
        self.reader = reader;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// True when no phase is running and the last state change is at least
    /// `ttl` before `now`.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        let inner = self.lock();
        !inner.state.is_busy() && now - inner.updated_at >= ttl
    }

    #[cfg(test)]
    pub fn state(&self) -> ImportState {
        self.lock().state
    }

    pub fn subscribe_progress(&self) -> tokio::sync::watch::Receiver<Option<ProgressEvent>> {
        self.progress.subscribe()
    }

    // ──────────────────────────────────────────────────────────
    // Phase 1: loading
    // ──────────────────────────────────────────────────────────

    /// Validates the upload, extracts its text layer and ends in `Loaded`,
    /// even when no text could be read.
    pub async fn load(&self, upload: FileUpload) -> Result<LoadReport, ImportError> {
        let file_type = self.validate_upload(&upload)?;

        let epoch = {
            let mut inner = self.lock();
            if inner.state.is_busy() {
                return Err(ImportError::Busy(inner.state));
            }
            *inner = Inner::idle();
            inner.file_name = Some(upload.file_name.clone());
            inner.transition(ImportState::Loading);
            self.progress.begin(Phase::Loading);
            self.cancel.epoch()
        };

        info!(
            session_id = %self.id,
            file_name = %upload.file_name,
            %file_type,
            bytes = upload.bytes.len(),
            content_type = upload.content_type.as_deref().unwrap_or("unknown"),
            "Extracting document text"
        );
        self.advance(epoch, Phase::Loading, LOAD_STARTED);

        let bytes = upload.bytes.clone();
        let reader = self.reader.clone();
        let extraction = tokio::task::spawn_blocking(move || reader(file_type, &bytes));

        // A cancelled reader thread cannot be stopped; its result is dropped.
        let joined = tokio::select! {
            joined = extraction => joined,
            _ = self.cancel.cancelled(epoch) => {
                debug!(session_id = %self.id, "Loading cancelled");
                return Err(ImportError::Cancelled);
            }
        };

        let layer = match joined {
            Ok(layer) => layer,
            Err(e) => {
                error!(session_id = %self.id, error = %e, "Text extraction task failed");
                return Err(self.fail(epoch, ImportError::Internal(e.to_string())));
            }
        };
        self.advance(epoch, Phase::Loading, LOAD_EXTRACTED);

        let clean_text = layer.clean_text().to_string();
        let degraded = layer.degraded_reason().cloned();
        let report = LoadReport {
            file_name: upload.file_name.clone(),
            file_type,
            char_count: clean_text.chars().count(),
            token_estimate: estimate_tokens(&clean_text),
            no_text: clean_text.is_empty(),
            degraded_reason: degraded.clone(),
        };

        {
            let mut inner = self.lock();
            if !self.cancel.is_current(epoch) {
                return Err(ImportError::Cancelled);
            }
            inner.document = Some(DocumentContent {
                clean_text,
                file_type,
            });
            inner.degraded = degraded;
            inner.transition(ImportState::Loaded);
            self.progress.advance(Phase::Loading, PHASE_COMPLETE);
        }

        match &report.degraded_reason {
            Some(reason) => warn!(
                session_id = %self.id,
                file_name = %report.file_name,
                %reason,
                "No text content extracted from document"
            ),
            None => info!(
                session_id = %self.id,
                file_name = %report.file_name,
                chars = report.char_count,
                "Document loaded"
            ),
        }

        Ok(report)
    }

    fn validate_upload(&self, upload: &FileUpload) -> Result<FileType, ImportError> {
        let file_type = resolve_file_type(&upload.file_name);
        if file_type == FileType::Unknown {
            return Err(ImportError::InvalidFileType {
                file_name: upload.file_name.clone(),
            });
        }
        let size = upload.bytes.len() as u64;
        if size > self.config.max_file_bytes {
            warn!(session_id = %self.id, file_name = %upload.file_name, size, "Upload exceeds size cap");
            return Err(ImportError::FileTooLarge {
                limit_mb: self.config.max_file_mb(),
            });
        }
        Ok(file_type)
    }

    // ──────────────────────────────────────────────────────────
    // Phase 2: parsing
    // ──────────────────────────────────────────────────────────

    /// Sends the loaded text to the extraction service and builds the record.
    /// Allowed from `Loaded`, and from `Error` to retry without re-reading.
    pub async fn parse(&self, options: ParseOptions) -> Result<CanonicalResume, ImportError> {
        let (epoch, content, file_name) = {
            let mut inner = self.lock();
            let state = inner.state;
            if state.is_busy() {
                return Err(ImportError::Busy(state));
            }
            let document = match (&inner.document, state) {
                (Some(document), ImportState::Loaded | ImportState::Error) => document,
                _ => {
                    return Err(ImportError::InvalidTransition {
                        action: "parse",
                        state,
                    })
                }
            };
            if document.clean_text.is_empty() {
                return Err(ImportError::EmptyContent);
            }
            let content = document.clean_text.clone();
            let file_name = inner.file_name.clone().unwrap_or_default();

            inner.last_error = None;
            inner.transition(ImportState::Parsing);
            self.progress.begin(Phase::Parsing);
            (self.cancel.epoch(), content, file_name)
        };

        self.advance(epoch, Phase::Parsing, PARSE_STARTED);

        let signals = DeterministicSignals::from_text(&content);
        let tokens = estimate_tokens(&content);
        if self.config.development_mode {
            info!(session_id = %self.id, chars = content.len(), token_estimate = tokens, "Resume token estimate");
        } else {
            debug!(session_id = %self.id, chars = content.len(), token_estimate = tokens, "Resume token estimate");
        }

        let request = ExtractionRequest {
            user_id: if options.is_example {
                None
            } else {
                options.user_id
            },
            is_example: options.is_example,
            is_development: self.config.development_mode,
            extracted_email: signals.email.clone(),
            extracted_phone: signals.phone.clone(),
            ..ExtractionRequest::new(content, file_name)
        };

        info!(
            session_id = %self.id,
            backend = self.extractor.backend(),
            has_email = signals.email.is_some(),
            has_phone = signals.phone.is_some(),
            "Requesting structured extraction"
        );
        self.advance(epoch, Phase::Parsing, PARSE_REQUEST_SENT);

        let outcome = tokio::select! {
            outcome = self.extractor.extract(&request) => outcome,
            _ = self.cancel.cancelled(epoch) => {
                debug!(session_id = %self.id, "Parsing cancelled");
                return Err(ImportError::Cancelled);
            }
        };

        let candidate = match outcome {
            Ok(candidate) => candidate,
            Err(e) => {
                error!(
                    session_id = %self.id,
                    backend = self.extractor.backend(),
                    error = %e,
                    "Structured extraction failed"
                );
                return Err(self.fail(epoch, translate_service_error(&e)));
            }
        };

        let resume = build_resume(
            candidate.as_value(),
            signals.email.as_deref(),
            signals.phone.as_deref(),
        );

        {
            let mut inner = self.lock();
            if !self.cancel.is_current(epoch) {
                return Err(ImportError::Cancelled);
            }
            inner.result = Some(resume.clone());
            inner.transition(ImportState::Done);
            self.progress.advance(Phase::Parsing, PHASE_COMPLETE);
        }

        info!(
            session_id = %self.id,
            experience = resume.experience.len(),
            education = resume.education.len(),
            skills = resume.skills.len(),
            "Resume imported"
        );

        Ok(resume)
    }

    // ──────────────────────────────────────────────────────────
    // Reset & status
    // ──────────────────────────────────────────────────────────

    /// Returns to `Idle` from any state, cancelling in-flight work and
    /// discarding the document.
    pub fn reset(&self) {
        let mut inner = self.lock();
        let previous = inner.state;
        self.cancel.cancel();
        *inner = Inner::idle();
        self.progress.clear();
        info!(session_id = %self.id, %previous, "Import session reset");
    }

    pub fn status(&self) -> SessionStatus {
        let inner = self.lock();
        let clean_text = inner
            .document
            .as_ref()
            .map(|d| d.clean_text.as_str())
            .unwrap_or_default();
        SessionStatus {
            session_id: self.id,
            state: inner.state,
            file_name: inner.file_name.clone(),
            file_type: inner.document.as_ref().map(|d| d.file_type),
            progress: self.progress.current(),
            no_text: inner.document.is_some() && clean_text.is_empty(),
            degraded_reason: inner.degraded.clone(),
            token_estimate: estimate_tokens(clean_text),
            last_error: inner.last_error.as_ref().map(ErrorSummary::from),
            result: inner.result.clone(),
            created_at: self.created_at,
            updated_at: inner.updated_at,
        }
    }

    // ──────────────────────────────────────────────────────────
    // Helpers
    // ──────────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn advance(&self, epoch: u64, phase: Phase, fraction: f32) {
        let _inner = self.lock();
        if self.cancel.is_current(epoch) {
            self.progress.advance(phase, fraction);
        }
    }

    /// Records `err` as the session error, unless the phase was cancelled.
    fn fail(&self, epoch: u64, err: ImportError) -> ImportError {
        let mut inner = self.lock();
        if !self.cancel.is_current(epoch) {
            return ImportError::Cancelled;
        }
        inner.last_error = Some(err.clone());
        inner.transition(ImportState::Error);
        err
    }
}
