//! Text extraction from `.docx` archives.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{Result, SheafError};

/// Extract the paragraph text from the bytes of a `.docx` archive.
///
/// Paragraphs are joined with newlines; formatting, tables, and embedded
/// media are ignored.
pub fn extract_text(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| SheafError::Docx(format!("failed to open archive: {e}")))?;

    let mut document_xml = archive
        .by_name("word/document.xml")
        .map_err(|e| SheafError::Docx(format!("missing word/document.xml: {e}")))?;

    let mut xml = String::new();
    document_xml
        .read_to_string(&mut xml)
        .map_err(|e| SheafError::Docx(format!("failed to read document.xml: {e}")))?;

    parse_document_xml(&xml)
}

/// Walk the WordprocessingML body, collecting the text runs of each
/// paragraph (`w:p` elements, text inside `w:t`).
fn parse_document_xml(xml: &str) -> Result<String> {
    // No trim_text: spaces at run boundaries inside w:t are significant.
    let mut reader = Reader::from_str(xml);

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text_element = false;
    let mut in_paragraph = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text_element = true,
                b"p" => in_paragraph = true,
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text_element = false,
                b"p" => {
                    if in_paragraph {
                        paragraphs.push(std::mem::take(&mut current));
                        in_paragraph = false;
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_text_element {
                    let text = e
                        .decode()
                        .ok()
                        .and_then(|d| {
                            quick_xml::escape::unescape(&d)
                                .ok()
                                .map(|u| u.into_owned())
                        })
                        .unwrap_or_default();
                    current.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(SheafError::Docx(format!("XML parsing error: {e}")));
            }
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}

/// Build a minimal in-memory docx archive. Test support.
#[cfg(test)]
pub(crate) fn sample_docx(document_xml: &str) -> Vec<u8> {
    use std::io::Write;
    use zip::write::{SimpleFileOptions, ZipWriter};

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("word/document.xml", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(document_xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}
