use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::hash::Hasher;
use std::io::Read;
use std::path::Path;
use tracing::warn;

const READ_BUFFER_SIZE: usize = 8192;

/// Computes a non-cryptographic content digest of a file.
///
/// Reads in fixed-size chunks so arbitrarily large files never load into
/// memory at once.
///
/// # Errors
///
/// Returns an IO error if the file cannot be opened or read.
pub(crate) fn compute_digest(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut hasher = seahash::SeaHasher::new();
    let mut buffer = [0u8; READ_BUFFER_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer).map_err(|e| Error::io(path, e))?;
        if bytes_read == 0 {
            break;
        }
        hasher.write(&buffer[..bytes_read]);
    }

    Ok(format!("{:016x}", hasher.finish()))
}

/// Persisted map from repository-relative path to content digest.
///
/// The sole mechanism for skipping unchanged files across runs: loaded at
/// startup (missing or unreadable file means an empty index) and fully
/// rewritten at the end of a run.
#[derive(Debug, Default)]
pub(crate) struct HashIndex {
    entries: BTreeMap<String, String>,
}

impl HashIndex {
    /// Loads the index from disk, falling back to empty.
    pub(crate) fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(entries) => Self { entries },
                Err(e) => {
                    warn!("Ignoring corrupt hash index {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read hash index {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Writes the full index to disk as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or serialized.
    pub(crate) fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        serde_json::to_writer_pretty(file, &self.entries)?;
        Ok(())
    }

    /// Returns true if the stored digest for `relative_path` equals `digest`.
    pub(crate) fn matches(&self, relative_path: &str, digest: &str) -> bool {
        self.entries.get(relative_path).is_some_and(|stored| stored == digest)
    }

    /// Records the digest for a successfully processed file.
    pub(crate) fn insert(&mut self, relative_path: impl Into<String>, digest: impl Into<String>) {
        self.entries.insert(relative_path.into(), digest.into());
    }

    /// Returns true if the index has an entry for `relative_path`.
    pub(crate) fn contains(&self, relative_path: &str) -> bool {
        self.entries.contains_key(relative_path)
    }

    /// Number of indexed paths.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
