//! PDF page extraction library
//!
//! Builds a new PDF from an ordered selection of pages of an uploaded one.
//! Pages are either copied structurally (text and vectors preserved) or
//! rasterized to JPEG images.
//!
//! MCP tools exposed by [`PdfServer`]:
//! - `upload_pdf`: Store a base64 encoded PDF
//! - `get_pdf`: Fetch a stored PDF
//! - `extract_pages`: Extract selected pages into a new PDF
//! - `list_artifacts`: List download links recorded for an account

pub mod accounts;
pub mod error;
pub mod extract;
pub mod pdf;
pub mod selection;
pub mod server;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};
pub use extract::{extract, extract_with, Artifact};
pub use selection::PageSelection;
pub use server::{
    run_server, run_server_with_config, ExtractPagesParams, ExtractPagesResult, ExtractionMode,
    PdfServer, ServerConfig,
};
