//! Deterministic signals pulled from cleaned text with plain pattern matching.
//! Used only to backfill contact fields the extraction service leaves empty.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid regex")
});

// Optional country code, optional parenthesized area code, `-` `.` or space separators.
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}").expect("valid regex")
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeterministicSignals {
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl DeterministicSignals {
    pub fn from_text(text: &str) -> Self {
        Self {
            email: extract_email(text),
            phone: extract_phone(text),
        }
    }
}

/// First `local@domain.tld` in the text.
pub fn extract_email(text: &str) -> Option<String> {
    EMAIL_RE.find(text).map(|m| m.as_str().to_string())
}

/// First phone-like number in the text.
pub fn extract_phone(text: &str) -> Option<String> {
    PHONE_RE.find(text).map(|m| m.as_str().to_string())
}

/// Rough token count (≈4 characters per token). Diagnostic only.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}
