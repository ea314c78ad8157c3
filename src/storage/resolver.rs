//! Resolution of uploaded and stored PDF data

use super::ArtifactStore;
use crate::error::{Error, Result};
use base64::Engine;

/// PDF bytes plus the name they were loaded under
pub struct ResolvedPdf {
    pub data: Vec<u8>,
    pub source_name: String,
}

/// Decode a base64 upload and check it looks like a PDF.
pub fn decode_upload(base64_data: &str, max_bytes: u64) -> Result<Vec<u8>> {
    // base64 expands by 4/3; reject obviously oversized payloads before decoding
    let estimated = (base64_data.len() as u64 / 4) * 3;
    if estimated > max_bytes.saturating_add(3) {
        return Err(Error::UploadTooLarge {
            size: estimated,
            max_size: max_bytes,
        });
    }

    let engine = base64::engine::general_purpose::STANDARD;
    let data = engine.decode(base64_data.trim())?;

    if data.len() as u64 > max_bytes {
        return Err(Error::UploadTooLarge {
            size: data.len() as u64,
            max_size: max_bytes,
        });
    }

    if data.len() < 4 || &data[0..4] != b"%PDF" {
        return Err(Error::MalformedSource {
            reason: "Decoded data is not a valid PDF file".to_string(),
        });
    }

    Ok(data)
}

/// Load a stored PDF by name
pub fn resolve_stored(store: &dyn ArtifactStore, name: &str) -> Result<ResolvedPdf> {
    let data = store.load(name)?;
    Ok(ResolvedPdf {
        data,
        source_name: name.to_string(),
    })
}
