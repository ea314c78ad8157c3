//! Filesystem artifact store (uploads directory)

use super::{validate_name, ArtifactStore};
use crate::error::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Stores files flat inside one directory
pub struct FsStore {
    dir: PathBuf,
    public_base_url: Option<String>,
}

impl FsStore {
    /// The directory is created on first write.
    ///
    /// With a `public_base_url`, addresses take the form
    /// `<base>/download/<name>`; otherwise the file path is returned.
    pub fn new<P: AsRef<Path>>(dir: P, public_base_url: Option<String>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            public_base_url: public_base_url.map(|url| url.trim_end_matches('/').to_string()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        Ok(self.dir.join(validate_name(name)?))
    }

    fn address_for(&self, name: &str, path: &Path) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/download/{}", base, name),
            None => std::fs::canonicalize(path)
                .unwrap_or_else(|_| path.to_path_buf())
                .display()
                .to_string(),
        }
    }
}

impl ArtifactStore for FsStore {
    fn store(&self, name: &str, data: &[u8]) -> Result<String> {
        let name = validate_name(name)?;
        let path = self.dir.join(name);

        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir)?;
        }

        // Each write goes through its own temp file; readers never see partial data
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(data)?;
        tmp.persist(&path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!(path = %path.display(), bytes = data.len(), "stored file");
        Ok(self.address_for(name, &path))
    }

    fn load(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.path_for(name)?;
        match std::fs::read(&path) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::NotFound {
                name: name.to_string(),
            }),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn exists(&self, name: &str) -> bool {
        self.path_for(name).map(|p| p.is_file()).unwrap_or(false)
    }
}
