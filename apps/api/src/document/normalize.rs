//! Text normalizer shared by the PDF and DOCX readers.
//!
//! One cleaning pass:
//! 1. byte noise (anything outside printable ASCII and line whitespace) → single space
//! 2. split into paragraphs: page markers (PDF) or newline runs (DOCX)
//! 3. collapse whitespace inside each paragraph, trim, drop empties
//! 4. drop repeated paragraphs (exact match, first occurrence wins, order kept)
//! 5. strip boilerplate from each paragraph, then drop paragraphs that are
//!    boilerplate as a whole line
//! 6. join with blank lines, final collapse + trim
//!
//! `normalize` repeats the pass until the text stops changing, so the result is a
//! fixed point: `normalize(normalize(x)) == normalize(x)`. A pass that changes
//! already-clean text always shortens it, which bounds the loop.
//!
//! Whole-line rules only drop lines that carry no content of their own: a
//! watermark word, a bare `Page N`, or a contents heading followed by nothing
//! but leaders and page numbers. A later pass sees the joined text as one line,
//! so a looser rule there could drop the whole document.
//!
//! The inline list is English-only and matches loosely: "10 of 12 engineers"
//! loses its count the same way "Page 1 of 3" does, and "(555)" area codes are
//! stripped as reference numbers.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Marker injected between PDF pages before cleaning.
pub fn page_marker(page_number: usize) -> String {
    format!("--- Page {page_number} ---")
}

/// Paragraph segmentation strategy for the reader that produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSource {
    /// Pages separated by `--- Page N ---` markers.
    Pdf,
    /// Paragraphs separated by newline runs.
    Docx,
}

static NOISE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\x20-\x7E\t\n\r]+").expect("valid regex"));
static PAGE_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*---\s*Page\s+\d+\s*---\s*").expect("valid regex"));
static NEWLINE_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\r\n]+").expect("valid regex"));

/// Substitutions applied inside every paragraph.
static INLINE_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // "1 of 10", "2 OF 3"
        r"(?i)\d+\s*of\s*\d+",
        // [1], [ 2 ]
        r"\[\s*\d+\s*\]",
        // (1), ( 2 )
        r"\(\s*\d+\s*\)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid regex"))
    .collect()
});

static WATERMARK_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:Draft|Confidential|Private|DRAFT|CONFIDENTIAL|PRIVATE)$")
        .expect("valid regex")
});

/// Word exports only: table-of-contents headings and bare page numbers.
static DOCX_LINE_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"^(?:Table of Contents|Contents)[^A-Za-z]*$", r"^Page \d+$"]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("valid regex"))
        .collect()
});

/// Cleans raw reader output into a single deduplicated line of text.
pub fn normalize(raw: &str, source: TextSource) -> String {
    let mut current = clean_pass(raw, source);
    loop {
        let next = clean_pass(&current, source);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn clean_pass(raw: &str, source: TextSource) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let denoised = NOISE_RE.replace_all(raw, " ");

    let paragraphs = split_paragraphs(&denoised, source)
        .into_iter()
        .map(collapse_whitespace)
        .filter(|p| !p.is_empty());

    let kept: Vec<String> = dedup_paragraphs(paragraphs)
        .iter()
        .map(|p| strip_boilerplate(p, source))
        .filter(|p| !p.is_empty())
        .collect();

    collapse_whitespace(&kept.join("\n\n"))
}

fn split_paragraphs(text: &str, source: TextSource) -> Vec<&str> {
    match source {
        TextSource::Pdf => PAGE_MARKER_RE.split(text).collect(),
        TextSource::Docx => NEWLINE_RUN_RE.split(text).collect(),
    }
}

/// Keeps the first occurrence of each paragraph, preserving order.
fn dedup_paragraphs(paragraphs: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    paragraphs
        .into_iter()
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

/// Strips inline boilerplate from one paragraph; `""` when what is left is a
/// boilerplate line.
fn strip_boilerplate(paragraph: &str, source: TextSource) -> String {
    let stripped = INLINE_RULES.iter().fold(paragraph.to_string(), |acc, rule| {
        rule.replace_all(&acc, "").into_owned()
    });
    let stripped = collapse_whitespace(&stripped);

    if is_boilerplate_line(&stripped, source) {
        String::new()
    } else {
        stripped
    }
}

fn is_boilerplate_line(line: &str, source: TextSource) -> bool {
    if WATERMARK_LINE_RE.is_match(line) {
        return true;
    }
    source == TextSource::Docx && DOCX_LINE_RULES.iter().any(|rule| rule.is_match(line))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
