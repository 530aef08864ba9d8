//! Minimal key-value storage used for user preferences such as palettes.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("failed to encode record: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("failed to decode record: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

/// A flat byte store keyed by string.
pub trait KeyValueStore {
    /// Read the value under `key`. `Ok(None)` when nothing is stored.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError>;
}

/// In-memory store. Contents are lost when it is dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// Directory-backed store: one file per key.
///
/// Keys are sanitized into file names, so `PaletteStore:Default` lives at
/// `<root>/PaletteStore_Default.bin`.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{name}.bin"))
    }
}

impl KeyValueStore for DirStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match std::fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        std::fs::write(self.path_for(key), value)?;
        Ok(())
    }
}
