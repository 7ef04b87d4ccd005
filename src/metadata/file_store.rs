//! Metadata store persisted to a local JSON document.
//!
//! Used for local runs outside a CI agent. Every call re-reads the file so
//! separate invocations pointed at the same path observe each other's writes.
//! Writes hold an exclusive lock on `<path>.lock` from load to rename, so
//! parallel runs sharing one file never drop each other's keys.

use crate::error::{MetadataError, Result};
use crate::metadata::{AnnotationLevel, MetadataStore};
use log::debug;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// One published annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Severity
    pub level: AnnotationLevel,
    /// Context the body belongs to
    pub context: String,
    /// Markdown body
    pub body: String,
}

/// On-disk layout of the metadata file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataDocument {
    /// Key/value entries
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Annotations in publication order, one entry per context
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl MetadataDocument {
    /// Body published under `context`, if any
    pub fn annotation(&self, context: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.context == context)
    }
}

/// JSON file backed metadata store
#[derive(Debug, Clone)]
pub struct FileMetadataStore {
    path: PathBuf,
}

impl FileMetadataStore {
    /// Store entries in `path`, created on first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current document. A missing file is an empty document.
    pub fn load(&self) -> Result<MetadataDocument> {
        if !self.path.exists() {
            return Ok(MetadataDocument::default());
        }

        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(MetadataDocument::default());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn save_failed(&self, reason: String) -> MetadataError {
        MetadataError::SaveFailed {
            path: self.path.clone(),
            reason,
        }
    }

    /// Exclusive advisory lock on `<path>.lock`, released when the handle drops
    fn acquire_lock(&self) -> Result<fs::File> {
        if let Some(parent) = self.parent_dir() {
            fs::create_dir_all(parent)
                .map_err(|e| self.save_failed(format!("Failed to create directory: {}", e)))?;
        }

        let lock_path = self.path.with_extension("lock");
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| self.save_failed(format!("Failed to open lock file: {}", e)))?;
        lock_file
            .lock_exclusive()
            .map_err(|e| self.save_failed(format!("Failed to lock {}: {}", lock_path.display(), e)))?;
        Ok(lock_file)
    }

    fn parent_dir(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }

    /// Load, modify and save the document while holding the lock
    fn update(&self, modify: impl FnOnce(&mut MetadataDocument)) -> Result<()> {
        let _lock = self.acquire_lock()?;
        let mut document = self.load()?;
        modify(&mut document);
        self.save(&document)
    }

    /// Persist the document through a uniquely named temp file renamed into place.
    /// Callers hold the lock.
    fn save(&self, document: &MetadataDocument) -> Result<()> {
        let serialized = serde_json::to_string_pretty(document)
            .map_err(|e| self.save_failed(format!("Failed to serialize metadata: {}", e)))?;

        let dir = self.parent_dir().unwrap_or_else(|| Path::new("."));
        let mut temp_file = NamedTempFile::new_in(dir)
            .map_err(|e| self.save_failed(format!("Failed to create temp file: {}", e)))?;
        temp_file
            .write_all(serialized.as_bytes())
            .map_err(|e| self.save_failed(format!("Failed to write metadata: {}", e)))?;
        temp_file
            .as_file()
            .sync_all()
            .map_err(|e| self.save_failed(format!("Failed to sync file: {}", e)))?;

        temp_file
            .persist(&self.path)
            .map_err(|e| self.save_failed(format!("Failed to rename temp file: {}", e.error)))?;

        Ok(())
    }
}

impl MetadataStore for FileMetadataStore {
    async fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        self.update(|document| {
            document.metadata.insert(key.to_string(), value.to_string());
        })?;
        debug!("Stored metadata {} in {}", key, self.path.display());
        Ok(())
    }

    async fn get_metadata(&self, key: &str) -> Result<String> {
        self.load()?
            .metadata
            .remove(key)
            .ok_or_else(|| {
                MetadataError::KeyNotFound {
                    key: key.to_string(),
                }
                .into()
            })
    }

    async fn annotate(
        &self,
        level: AnnotationLevel,
        context: &str,
        body: &str,
        append: bool,
    ) -> Result<()> {
        self.update(|document| {
            match document.annotations.iter_mut().find(|a| a.context == context) {
                Some(existing) if append => {
                    existing.body.push_str(body);
                    existing.level = level;
                }
                Some(existing) => {
                    existing.body = body.to_string();
                    existing.level = level;
                }
                None => document.annotations.push(Annotation {
                    level,
                    context: context.to_string(),
                    body: body.to_string(),
                }),
            }
        })
    }
}
