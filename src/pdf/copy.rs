//! Structural page copying with qpdf
//!
//! Pages are copied from the source document's object graph into a fresh
//! document. Attributes a page inherits from the page tree (MediaBox,
//! Resources, Rotate, CropBox) are pushed onto the page before copying.
//! qpdf keeps a per-source map of already copied foreign objects, so fonts,
//! images and other resources shared by several selected pages are copied
//! once and referenced from every page that uses them.

use super::PageAssembler;
use crate::error::{Error, Result};
use crate::selection::{check_page, PageSelection};
use qpdf::QPdf;

/// Copies selected pages into a new document, preserving vector content
#[derive(Debug, Clone, Copy, Default)]
pub struct PageCopier;

/// Open a source PDF from memory.
///
/// Password-protected documents are rejected; they surface from qpdf as an
/// invalid password since no password is ever supplied.
pub(crate) fn open_source(data: &[u8]) -> Result<QPdf> {
    if data.len() < 4 || &data[0..4] != b"%PDF" {
        return Err(Error::MalformedSource {
            reason: "missing %PDF header".to_string(),
        });
    }
    QPdf::read_from_memory(data).map_err(map_qpdf_error)
}

/// Map qpdf crate errors to our error types
pub(crate) fn map_qpdf_error(e: qpdf::QPdfError) -> Error {
    match e.error_code() {
        qpdf::QPdfErrorCode::InvalidPassword => Error::EncryptedSource,
        qpdf::QPdfErrorCode::InternalError | qpdf::QPdfErrorCode::SystemError => {
            Error::Internal {
                reason: e.to_string(),
            }
        }
        _ => Error::MalformedSource {
            reason: e.to_string(),
        },
    }
}

/// Get the page count of a PDF
pub fn page_count(data: &[u8]) -> Result<u32> {
    let qpdf = open_source(data)?;
    qpdf.get_num_pages().map_err(map_qpdf_error)
}

impl PageAssembler for PageCopier {
    fn assemble(&self, source: &[u8], selection: &PageSelection) -> Result<Vec<u8>> {
        let source = open_source(source)?;
        let total = source.get_num_pages().map_err(map_qpdf_error)?;

        let dest = QPdf::empty();

        // Validation is interleaved with copying; on failure `dest` is
        // dropped with whatever was appended so far.
        for &page in selection.pages() {
            let idx = check_page(page, total)?;
            let foreign = source
                .get_page(idx)
                .ok_or(Error::PageOutOfRange { page, total })?;
            // A foreign page gets its inherited attributes pushed down and is
            // copied through dest's foreign-object map; repeats become shallow copies.
            dest.add_page(&foreign, false).map_err(map_qpdf_error)?;
        }

        let mut writer = dest.writer();
        writer.preserve_encryption(false);
        let data = writer.write_to_memory().map_err(map_qpdf_error)?;

        tracing::debug!(
            pages = selection.len(),
            source_pages = total,
            bytes = data.len(),
            "copied pages"
        );

        Ok(data)
    }
}
