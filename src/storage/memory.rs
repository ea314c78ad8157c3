//! In-memory artifact store

use super::{validate_name, ArtifactStore};
use crate::error::{Error, Result};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

struct StoreInner {
    lru: LruCache<String, Vec<u8>>,
    total_bytes: usize,
}

/// Artifact store with entry count and byte budget limits.
///
/// Least recently used entries are evicted to make room. Eviction does not
/// distinguish uploads from extracted artifacts, so a `memory://` address
/// already handed out or recorded on an account can later resolve to
/// `NotFound`. Use [`FsStore`](super::FsStore) when links must stay valid.
pub struct MemoryStore {
    inner: Mutex<StoreInner>,
    max_bytes: usize,
}

impl MemoryStore {
    /// Create a new store with the specified entry capacity and byte budget
    pub fn new(capacity: usize, max_bytes: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(StoreInner {
                lru: LruCache::new(capacity),
                total_bytes: 0,
            }),
            max_bytes,
        }
    }

    /// Get the number of stored entries
    pub fn len(&self) -> usize {
        self.inner.lock().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().lru.is_empty()
    }

    /// Get total bytes currently stored
    pub fn total_bytes(&self) -> usize {
        self.inner.lock().total_bytes
    }
}

impl ArtifactStore for MemoryStore {
    fn store(&self, name: &str, data: &[u8]) -> Result<String> {
        let name = validate_name(name)?;
        let new_size = data.len();

        if new_size > self.max_bytes {
            return Err(Error::StorageFull {
                size: new_size,
                max_size: self.max_bytes,
            });
        }

        let mut inner = self.inner.lock();

        if let Some(old) = inner.lru.pop(name) {
            inner.total_bytes = inner.total_bytes.saturating_sub(old.len());
        }

        while inner.total_bytes + new_size > self.max_bytes {
            match inner.lru.pop_lru() {
                Some((evicted, evicted_val)) => {
                    tracing::debug!(name = %evicted, bytes = evicted_val.len(), "evicted");
                    inner.total_bytes = inner.total_bytes.saturating_sub(evicted_val.len());
                }
                None => break,
            }
        }

        if let Some((evicted, evicted_val)) = inner.lru.push(name.to_string(), data.to_vec()) {
            // capacity eviction of a different key
            if evicted != name {
                inner.total_bytes = inner.total_bytes.saturating_sub(evicted_val.len());
            }
        }
        inner.total_bytes += new_size;

        Ok(format!("memory://{}", name))
    }

    fn load(&self, name: &str) -> Result<Vec<u8>> {
        let name = validate_name(name)?;
        self.inner
            .lock()
            .lru
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NotFound {
                name: name.to_string(),
            })
    }

    fn exists(&self, name: &str) -> bool {
        match validate_name(name) {
            Ok(name) => self.inner.lock().lru.contains(name),
            Err(_) => false,
        }
    }
}
