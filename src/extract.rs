//! Page extraction
//!
//! `extract` is the whole core contract: source bytes and an ordered page
//! selection in, a named artifact out. It has no side effects; storing the
//! artifact is the caller's job.

use crate::error::Result;
use crate::pdf::{PageAssembler, PageCopier};
use crate::selection::PageSelection;
use crate::storage::ResolvedPdf;
use chrono::Utc;
use std::path::Path;
use uuid::Uuid;

/// Finalized output document plus its assigned name
#[derive(Debug, Clone)]
pub struct Artifact {
    pub name: String,
    pub data: Vec<u8>,
    pub page_count: u32,
}

/// Extract `selection` from `source` by copying page structure.
pub fn extract(
    source: &ResolvedPdf,
    selection: &PageSelection,
    output_name: Option<&str>,
) -> Result<Artifact> {
    extract_with(&PageCopier, source, selection, output_name)
}

/// Extract `selection` from `source` with the given assembly strategy.
pub fn extract_with<A: PageAssembler>(
    assembler: &A,
    source: &ResolvedPdf,
    selection: &PageSelection,
    output_name: Option<&str>,
) -> Result<Artifact> {
    let data = assembler.assemble(&source.data, selection)?;
    let name = resolve_output_name(output_name, &source.source_name);

    tracing::debug!(
        source = %source.source_name,
        output = %name,
        pages = selection.len(),
        "extracted pages"
    );

    Ok(Artifact {
        name,
        data,
        page_count: selection.len() as u32,
    })
}

/// Use the caller's name when given, otherwise
/// `extracted_<unix millis>_<random hex><ext>` where `<ext>` is the source's
/// extension including the dot.
pub fn resolve_output_name(output_name: Option<&str>, source_name: &str) -> String {
    match output_name.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            let extension = Path::new(source_name)
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| format!(".{}", ext))
                .unwrap_or_default();
            let id = Uuid::new_v4().simple().to_string();
            format!(
                "extracted_{}_{}{}",
                Utc::now().timestamp_millis(),
                &id[..8],
                extension
            )
        }
    }
}
