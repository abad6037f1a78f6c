//! DOCX text layer: reads `word/document.xml` out of the OOXML zip container and
//! keeps the raw run text, one blank line per paragraph.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use thiserror::Error;
use tracing::{debug, warn};

use super::normalize::{normalize, TextSource};
use super::{DegradedReason, TextLayer};

const DOCUMENT_PART: &str = "word/document.xml";
/// Decompressed size cap for the document part. Uploads are capped compressed,
/// so this bounds what a deflate bomb can expand to.
const MAX_DOCUMENT_XML_BYTES: u64 = 32 * 1024 * 1024;

#[derive(Debug, Error)]
enum DocxError {
    #[error("not a DOCX archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("failed to read {DOCUMENT_PART}: {0}")]
    Io(#[from] std::io::Error),

    #[error("{DOCUMENT_PART} expands beyond {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("{DOCUMENT_PART} is not UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("malformed document XML: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Extracts and cleans the text of a DOCX buffer. Never fails.
pub fn extract(docx_bytes: &[u8]) -> TextLayer {
    match read_raw_text(docx_bytes, MAX_DOCUMENT_XML_BYTES) {
        Ok(raw) => {
            debug!(raw_chars = raw.len(), "DOCX text extracted");
            TextLayer::from_clean(normalize(&raw, TextSource::Docx))
        }
        Err(e) => {
            warn!(error = %e, bytes = docx_bytes.len(), "DOCX text could not be read");
            TextLayer::Degraded(DegradedReason::Unreadable(e.to_string()))
        }
    }
}

fn read_raw_text(docx_bytes: &[u8], max_xml_bytes: u64) -> Result<String, DocxError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(docx_bytes))?;
    let mut part = archive.by_name(DOCUMENT_PART)?;
    if part.size() > max_xml_bytes {
        return Err(DocxError::TooLarge {
            limit: max_xml_bytes,
        });
    }

    // The declared size can lie; never read past the cap either way.
    let mut raw = Vec::new();
    part.by_ref().take(max_xml_bytes + 1).read_to_end(&mut raw)?;
    if raw.len() as u64 > max_xml_bytes {
        return Err(DocxError::TooLarge {
            limit: max_xml_bytes,
        });
    }

    let xml = String::from_utf8(raw)?;
    Ok(document_xml_to_text(&xml)?)
}

/// Walks the WordprocessingML body. Only `<w:t>` content is text; tabs and
/// breaks inside runs become whitespace; each paragraph ends with a blank line.
fn document_xml_to_text(xml: &str) -> Result<String, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut in_run = false;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"r" => in_run = true,
                b"t" => in_text = true,
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"r" => in_run = false,
                b"t" => in_text = false,
                b"p" => text.push_str("\n\n"),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" if in_run => text.push('\t'),
                b"br" | b"cr" if in_run => text.push('\n'),
                b"p" => text.push_str("\n\n"),
                _ => {}
            },
            Event::Text(e) if in_text => text.push_str(&e.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(text)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::{Cursor, Write};

    use zip::write::SimpleFileOptions;

    /// Builds a minimal DOCX whose body has one paragraph per line of `text`.
    /// Lines are inserted verbatim, so callers escape XML themselves.
    pub fn docx_from_text(text: &str) -> Vec<u8> {
        let body: String = text
            .split('\n')
            .map(|line| {
                if line.is_empty() {
                    "<w:p/>".to_string()
                } else {
                    format!("<w:p><w:r><w:t xml:space=\"preserve\">{line}</w:t></w:r></w:p>")
                }
            })
            .collect();
        let xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body>{body}</w:body></w:document>"
        );
        archive_with_part("word/document.xml", &xml)
    }

    pub fn archive_with_part(name: &str, contents: &str) -> Vec<u8> {
        write_archive(name, contents, zip::CompressionMethod::Stored)
    }

    pub fn deflated_archive_with_part(name: &str, contents: &str) -> Vec<u8> {
        write_archive(name, contents, zip::CompressionMethod::Deflated)
    }

    fn write_archive(name: &str, contents: &str, method: zip::CompressionMethod) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(method);
        writer.start_file(name, options).unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }
}
