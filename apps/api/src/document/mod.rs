//! Document ingestion. Turns an uploaded binary resume into clean text.
//!
//! Flow: resolve_file_type → {pdf|docx}::extract → normalize (inside each extractor).
//! Extractors never fail: reader errors degrade to `TextLayer::Degraded`.

pub mod docx;
pub mod normalize;
pub mod pdf;
pub mod signals;

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Docx,
    Unknown,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Docx => "docx",
            FileType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lower-cased text after the last `.`; empty when the name has no dot.
pub fn file_extension(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Maps a file name to the reader that should handle it. `.doc` goes to the
/// DOCX reader; legacy binary Word files then degrade to empty text.
pub fn resolve_file_type(file_name: &str) -> FileType {
    match file_extension(file_name).as_str() {
        "pdf" => FileType::Pdf,
        "docx" | "doc" => FileType::Docx,
        _ => FileType::Unknown,
    }
}

/// Why a text layer could not be produced. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum DegradedReason {
    /// The third-party reader rejected the buffer.
    Unreadable(String),
    /// The third-party reader panicked while decoding.
    ReaderPanicked,
    /// The reader succeeded but nothing survived cleaning (e.g. scanned images).
    NoText,
    /// No reader exists for this file type.
    Unsupported,
}

impl fmt::Display for DegradedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegradedReason::Unreadable(e) => write!(f, "document could not be read: {e}"),
            DegradedReason::ReaderPanicked => f.write_str("document reader crashed while decoding"),
            DegradedReason::NoText => f.write_str("no text layer found in document"),
            DegradedReason::Unsupported => f.write_str("unsupported document type"),
        }
    }
}

/// Outcome of a text-layer extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextLayer {
    Text(String),
    Degraded(DegradedReason),
}

impl TextLayer {
    /// Wraps cleaned text, degrading to `NoText` when cleaning left nothing.
    pub fn from_clean(text: String) -> Self {
        if text.is_empty() {
            TextLayer::Degraded(DegradedReason::NoText)
        } else {
            TextLayer::Text(text)
        }
    }

    /// The cleaned text; `""` for a degraded extraction.
    pub fn clean_text(&self) -> &str {
        match self {
            TextLayer::Text(t) => t,
            TextLayer::Degraded(_) => "",
        }
    }

    pub fn degraded_reason(&self) -> Option<&DegradedReason> {
        match self {
            TextLayer::Text(_) => None,
            TextLayer::Degraded(reason) => Some(reason),
        }
    }
}

/// The cleaned text of one uploaded file. Session-local and immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentContent {
    pub clean_text: String,
    pub file_type: FileType,
}

/// Runs the reader matching `file_type`. Blocking; call from `spawn_blocking`.
pub fn extract_text_layer(file_type: FileType, bytes: &[u8]) -> TextLayer {
    match file_type {
        FileType::Pdf => pdf::extract(bytes),
        FileType::Docx => docx::extract(bytes),
        FileType::Unknown => TextLayer::Degraded(DegradedReason::Unsupported),
    }
}
