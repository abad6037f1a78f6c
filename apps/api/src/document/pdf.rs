//! PDF text layer via the pdf-extract crate.
//!
//! Pages are read one by one and joined with `--- Page N ---` markers so the
//! normalizer can drop repeated pages; the markers never survive cleaning.

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use super::normalize::{normalize, page_marker, TextSource};
use super::{DegradedReason, TextLayer};

/// Extracts and cleans the text layer of a PDF buffer. Never fails.
pub fn extract(pdf_bytes: &[u8]) -> TextLayer {
    // pdf-extract can panic on malformed fonts and object streams.
    let pages = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
    }));

    let pages = match pages {
        Ok(Ok(pages)) => pages,
        Ok(Err(e)) => {
            warn!(error = %e, bytes = pdf_bytes.len(), "PDF text layer could not be read");
            return TextLayer::Degraded(DegradedReason::Unreadable(e.to_string()));
        }
        Err(_) => {
            warn!(bytes = pdf_bytes.len(), "PDF reader panicked; treating document as empty");
            return TextLayer::Degraded(DegradedReason::ReaderPanicked);
        }
    };

    debug!(pages = pages.len(), "PDF text layer extracted");

    let raw = join_pages(&pages);
    TextLayer::from_clean(normalize(&raw, TextSource::Pdf))
}

/// Concatenates page texts, each preceded by its 1-based page marker.
fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .enumerate()
        .map(|(i, text)| format!("{}\n{}\n\n", page_marker(i + 1), text))
        .collect()
}
