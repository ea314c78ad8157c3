//! Persistence for uploaded sources and extracted artifacts

pub mod fs;
pub mod memory;
pub mod resolver;

pub use fs::FsStore;
pub use memory::MemoryStore;
pub use resolver::{decode_upload, ResolvedPdf};

use crate::error::{Error, Result};

/// Named byte storage.
///
/// Names are plain file names; anything that could address outside the
/// store is rejected with `InvalidName`.
pub trait ArtifactStore: Send + Sync {
    /// Store `data` under `name`, replacing any previous content, and return
    /// the address the stored file can be fetched from.
    fn store(&self, name: &str, data: &[u8]) -> Result<String>;

    /// Load the bytes stored under `name`
    fn load(&self, name: &str) -> Result<Vec<u8>>;

    /// Check whether `name` is stored
    fn exists(&self, name: &str) -> bool;
}

/// Reject names that are empty or could escape the store.
pub fn validate_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains('/')
        || trimmed.contains('\\')
        || trimmed.contains('\0')
    {
        return Err(Error::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(trimmed)
}
