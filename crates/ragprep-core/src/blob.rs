//! Blob storage backends.
//!
//! `FsBlobStore` maps a location onto a directory and a key onto a relative
//! path below it. Writes go to a temp file in the destination directory and
//! are persisted with a rename, so an interrupted write never leaves a partial
//! object behind. `MemoryBlobStore` keeps objects in a map and counts writes.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

use crate::config::resolve_with_base;
use crate::traits::BlobStore;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for BlobError {
    fn from(e: std::io::Error) -> Self {
        BlobError::Io(e.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct FsBlobStore {
    base: PathBuf,
}

impl FsBlobStore {
    /// Relative locations are resolved against `base`.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn object_path(&self, location: &str, key: &str) -> Result<PathBuf, BlobError> {
        let rel = Path::new(key);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if key.is_empty() || escapes {
            return Err(BlobError::InvalidKey(key.to_string()));
        }
        Ok(resolve_with_base(&self.base, location).join(rel))
    }
}

impl BlobStore for FsBlobStore {
    fn get(&self, location: &str, key: &str) -> Result<Vec<u8>, BlobError> {
        let path = self.object_path(location, key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, location: &str, key: &str, body: &[u8], _content_type: &str) -> Result<(), BlobError> {
        let path = self.object_path(location, key)?;
        let dir = path
            .parent()
            .ok_or_else(|| BlobError::InvalidKey(key.to_string()))?;
        std::fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(body)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| BlobError::Io(e.error.to_string()))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<(String, String), StoredObject>>,
    puts: Mutex<usize>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without counting it as a write.
    pub fn insert(&self, location: &str, key: &str, body: impl Into<Vec<u8>>) {
        let mut objects = self.objects.lock().unwrap_or_else(|p| p.into_inner());
        objects.insert(
            (location.to_string(), key.to_string()),
            StoredObject { body: body.into(), content_type: "application/json".to_string() },
        );
    }

    pub fn object(&self, location: &str, key: &str) -> Option<StoredObject> {
        let objects = self.objects.lock().unwrap_or_else(|p| p.into_inner());
        objects.get(&(location.to_string(), key.to_string())).cloned()
    }

    pub fn keys(&self, location: &str) -> Vec<String> {
        let objects = self.objects.lock().unwrap_or_else(|p| p.into_inner());
        let mut keys: Vec<String> = objects
            .keys()
            .filter(|(loc, _)| loc == location)
            .map(|(_, key)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn put_count(&self) -> usize {
        *self.puts.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, location: &str, key: &str) -> Result<Vec<u8>, BlobError> {
        self.object(location, key)
            .map(|o| o.body)
            .ok_or_else(|| BlobError::NotFound(format!("{location}/{key}")))
    }

    fn put(&self, location: &str, key: &str, body: &[u8], content_type: &str) -> Result<(), BlobError> {
        let mut objects = self.objects.lock().unwrap_or_else(|p| p.into_inner());
        objects.insert(
            (location.to_string(), key.to_string()),
            StoredObject { body: body.to_vec(), content_type: content_type.to_string() },
        );
        *self.puts.lock().unwrap_or_else(|p| p.into_inner()) += 1;
        Ok(())
    }
}
