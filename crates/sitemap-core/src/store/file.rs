//! Directory-backed key-value store.
//!
//! ## Layout
//!
//! ```text
//! <root>/
//!   sitemap_generation_total.json
//!   sitemap_partition_2024-07-10.json
//!   ...
//! ```
//!
//! Each file holds the raw value as a JSON string. Keys are restricted to
//! `[A-Za-z0-9_.-]` so they map directly onto file names.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use super::{KeyValueStore, WriteHint};
use crate::{Error, Result};

const EXTENSION: &str = "json";
const MAX_KEY_LEN: usize = 191;

/// [`KeyValueStore`] persisting one file per key.
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the target, so readers observe either the old or the new value.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|e| Error::Storage(format!("Failed to create store directory: {e}")))?;
        Ok(Self { root })
    }

    /// Directory holding the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(format!("{key}.{EXTENSION}")))
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::Storage("Key cannot be empty".into()));
    }
    if key.len() > MAX_KEY_LEN {
        return Err(Error::Storage(format!(
            "Invalid key '{key}': exceeds maximum length of {MAX_KEY_LEN} characters"
        )));
    }
    if key.starts_with('.') {
        return Err(Error::Storage(format!(
            "Invalid key '{key}': cannot start with '.'"
        )));
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(Error::Storage(format!(
            "Invalid key '{key}': only [A-Za-z0-9_.-] are allowed"
        )));
    }
    Ok(())
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::Storage(format!("Failed to read '{key}': {e}")));
            },
        };
        let value: String = serde_json::from_str(&raw)?;
        Ok(Some(value))
    }

    fn set(&self, key: &str, value: &str, hint: WriteHint) -> Result<()> {
        let path = self.path_for(key)?;
        let json = serde_json::to_string(value)?;

        // Atomic write: temp file in the same directory + rename
        let mut tmp = NamedTempFile::new_in(&self.root)
            .map_err(|e| Error::Storage(format!("Failed to create temp file: {e}")))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| Error::Storage(format!("Failed to write temp file: {e}")))?;
        tmp.persist(&path)
            .map_err(|e| Error::Storage(format!("Failed to commit '{key}': {}", e.error)))?;

        debug!(key, ?hint, bytes = json.len(), "Stored value");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::Storage(format!("Failed to delete '{key}': {e}"))),
        }
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.root)
            .map_err(|e| Error::Storage(format!("Failed to list store directory: {e}")))?;

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                if stem.starts_with(prefix) && validate_key(stem).is_ok() {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}
