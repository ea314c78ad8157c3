//! PDF processing layer
//!
//! Structural page copying uses qpdf; the rasterized alternative renders
//! pages through a pluggable renderer (PDFium in production).

pub mod copy;
pub mod raster;

use crate::error::Result;
use crate::selection::PageSelection;

pub use copy::{page_count, PageCopier};
pub use raster::{PageRenderer, PdfiumRenderer, RasterAssembler, RenderSurface};

/// Strategy that turns a source PDF and a page selection into new PDF bytes.
///
/// Implementations validate every selected page against the source page
/// count, in selection order, and return nothing but an error on the first
/// failure.
pub trait PageAssembler {
    fn assemble(&self, source: &[u8], selection: &PageSelection) -> Result<Vec<u8>>;
}

impl<T: PageAssembler + ?Sized> PageAssembler for &T {
    fn assemble(&self, source: &[u8], selection: &PageSelection) -> Result<Vec<u8>> {
        (**self).assemble(source, selection)
    }
}
