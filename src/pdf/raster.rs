//! Rasterized page assembly
//!
//! Each selected page is rendered to a pixel buffer at a fixed scale and
//! re-embedded as a single JPEG image on a new page. Text stops being
//! selectable and vector content is flattened; the output page size is
//! derived from the rendered bitmap, not copied from the source geometry.

use super::copy::map_qpdf_error;
use super::PageAssembler;
use crate::error::{Error, Result};
use crate::selection::{check_page, PageSelection};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use pdfium_render::prelude::*;
use qpdf::{QPdf, QPdfObject, QPdfObjectLike};

/// Default render scale (pixels per PDF point)
pub const DEFAULT_SCALE: f32 = 2.0;

/// Default JPEG quality for embedded page images
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// An opened document that can render its pages
pub trait RenderSurface {
    /// Number of pages in the document
    fn page_count(&self) -> u32;

    /// Render the page at a 0-based index. `scale` is pixels per point.
    fn render_page(&self, index: u32, scale: f32) -> Result<RgbImage>;
}

/// Rendering backend capability
pub trait PageRenderer {
    fn open<'a>(&'a self, data: &'a [u8]) -> Result<Box<dyn RenderSurface + 'a>>;
}

/// Renderer backed by PDFium
pub struct PdfiumRenderer {
    pdfium: Pdfium,
}

impl PdfiumRenderer {
    /// Bind to the PDFium library. PDFium is not thread-safe, so create one
    /// renderer per blocking task.
    pub fn new() -> Result<Self> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                    "/opt/pdfium/lib",
                ))
            })
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| Error::Render {
                reason: format!("Failed to initialize PDFium: {}", e),
            })?;

        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

impl PageRenderer for PdfiumRenderer {
    fn open<'a>(&'a self, data: &'a [u8]) -> Result<Box<dyn RenderSurface + 'a>> {
        if data.len() < 4 || &data[0..4] != b"%PDF" {
            return Err(Error::MalformedSource {
                reason: "missing %PDF header".to_string(),
            });
        }

        let document = self
            .pdfium
            .load_pdf_from_byte_slice(data, None)
            .map_err(|e| match e {
                PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
                    Error::EncryptedSource
                }
                _ => Error::MalformedSource {
                    reason: format!("{}", e),
                },
            })?;

        Ok(Box::new(PdfiumSurface { document }))
    }
}

struct PdfiumSurface<'a> {
    document: PdfDocument<'a>,
}

impl RenderSurface for PdfiumSurface<'_> {
    fn page_count(&self) -> u32 {
        self.document.pages().len() as u32
    }

    fn render_page(&self, index: u32, scale: f32) -> Result<RgbImage> {
        let page = self
            .document
            .pages()
            .get(index as u16)
            .map_err(|e| Error::Render {
                reason: format!("Failed to get page {}: {}", index + 1, e),
            })?;

        let config = PdfRenderConfig::new()
            .scale_page_by_factor(scale)
            .render_form_data(true)
            .render_annotations(true);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| Error::Render {
                reason: format!("Failed to render page {}: {}", index + 1, e),
            })?;

        Ok(bitmap.as_image().to_rgb8())
    }
}

/// Builds a new document from rendered page images
pub struct RasterAssembler<R> {
    renderer: R,
    scale: f32,
    jpeg_quality: u8,
}

impl<R: PageRenderer> RasterAssembler<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            scale: DEFAULT_SCALE,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }
}

impl<R: PageRenderer> PageAssembler for RasterAssembler<R> {
    fn assemble(&self, source: &[u8], selection: &PageSelection) -> Result<Vec<u8>> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(Error::InvalidRequest {
                reason: format!("render scale must be positive, got {}", self.scale),
            });
        }

        let surface = self.renderer.open(source)?;
        let total = surface.page_count();

        let dest = QPdf::empty();

        for &page in selection.pages() {
            let idx = check_page(page, total)?;
            let bitmap = surface.render_page(idx, self.scale)?;
            let jpeg = encode_jpeg(&bitmap, self.jpeg_quality)?;
            add_image_page(&dest, &jpeg, bitmap.width(), bitmap.height(), self.scale)?;
        }

        let mut writer = dest.writer();
        writer.preserve_encryption(false);
        let data = writer.write_to_memory().map_err(map_qpdf_error)?;

        tracing::debug!(
            pages = selection.len(),
            scale = self.scale,
            bytes = data.len(),
            "rasterized pages"
        );

        Ok(data)
    }
}

fn encode_jpeg(bitmap: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality)
        .encode_image(bitmap)
        .map_err(|e| Error::Render {
            reason: format!("Failed to encode page image as JPEG: {}", e),
        })?;
    Ok(jpeg)
}

/// Append a page that shows `jpeg` stretched over the whole MediaBox.
fn add_image_page(dest: &QPdf, jpeg: &[u8], width: u32, height: u32, scale: f32) -> Result<()> {
    let page_width = width as f32 / scale;
    let page_height = height as f32 / scale;

    let image = dest.new_stream_with_dictionary(
        [
            ("/Type", dest.new_name("/XObject")),
            ("/Subtype", dest.new_name("/Image")),
            ("/Width", dest.new_integer(i64::from(width)).into()),
            ("/Height", dest.new_integer(i64::from(height)).into()),
            ("/ColorSpace", dest.new_name("/DeviceRGB")),
            ("/BitsPerComponent", dest.new_integer(8).into()),
            ("/Filter", dest.new_name("/DCTDecode")),
        ],
        jpeg,
    );

    let content = format!(
        "q\n{:.2} 0 0 {:.2} 0 0 cm\n/Im0 Do\nQ\n",
        page_width, page_height
    );
    let contents = dest.new_stream(content.as_bytes());

    let media_box = dest
        .parse_object(&format!("[0 0 {:.2} {:.2}]", page_width, page_height))
        .map_err(map_qpdf_error)?;
    let xobjects = dest.new_dictionary_from([("/Im0", QPdfObject::from(image))]);
    let resources = dest.new_dictionary_from([("/XObject", QPdfObject::from(xobjects))]);

    let page = dest.new_dictionary_from([
        ("/Type", dest.new_name("/Page")),
        ("/MediaBox", media_box),
        ("/Contents", QPdfObject::from(contents)),
        ("/Resources", QPdfObject::from(resources)),
    ]);

    dest.add_page(&page.into_indirect(), false)
        .map_err(map_qpdf_error)
}
