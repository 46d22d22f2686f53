//! Overwrite-safe media storage.
//!
//! The [`MediaStore`] trait is the seam between the derivative pipeline and
//! the filesystem, so reconcile logic can be tested against a recording
//! in-memory store. The production implementation is [`OverwriteStore`]:
//! files live under a media root at slash-separated logical names, and
//! writing to an existing name **replaces** the file rather than renaming the
//! new one. Derivative names are derived deterministically from the source
//! filename plus a fixed suffix; without overwrite semantics every repeated
//! save would leave a `name-1`, `name-2`, … trail of garbage files behind.
//!
//! Deletion is idempotent: removing a name that does not exist is a no-op,
//! not an error, so lifecycle teardown never trips over files that are
//! already gone.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to write {name}: {source}")]
    Write { name: String, source: io::Error },
    #[error("failed to read {name}: {source}")]
    Read { name: String, source: io::Error },
    #[error("failed to delete {name}: {source}")]
    Delete { name: String, source: io::Error },
    #[error("invalid media name: {0}")]
    InvalidName(String),
}

/// Persistence contract for media files, keyed by logical name.
///
/// Names are relative, slash-separated paths like `paintings/small/dawn_small.webp`.
pub trait MediaStore {
    /// Write `bytes` at `name`, replacing any existing file of the same
    /// name. Returns the stored name (always equal to the logical name —
    /// there is no suffixing).
    fn put(&self, name: &str, bytes: &[u8]) -> Result<String, StorageError>;

    /// Read back the bytes stored at `name`.
    fn get(&self, name: &str) -> Result<Vec<u8>, StorageError>;

    /// Whether a file currently exists at `name`.
    fn exists(&self, name: &str) -> bool;

    /// Remove the file at `name`. Deleting a missing name is a no-op.
    fn delete(&self, name: &str) -> Result<(), StorageError>;
}

/// Filesystem store rooted at a media directory.
pub struct OverwriteStore {
    root: PathBuf,
}

impl OverwriteStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path a logical name resolves to.
    ///
    /// Rejects names that would escape the media root (absolute paths or
    /// `..` components) and empty names.
    fn resolve(&self, name: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(name);
        let plain = !name.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl MediaStore for OverwriteStore {
    fn put(&self, name: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let path = self.resolve(name)?;
        let write_err = |source| StorageError::Write {
            name: name.to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        // Replace, never rename: one current file per logical name.
        if path.exists() {
            fs::remove_file(&path).map_err(write_err)?;
        }
        fs::write(&path, bytes).map_err(write_err)?;
        Ok(name.to_string())
    }

    fn get(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(name)?;
        fs::read(&path).map_err(|source| StorageError::Read {
            name: name.to_string(),
            source,
        })
    }

    fn exists(&self, name: &str) -> bool {
        self.resolve(name).map(|p| p.is_file()).unwrap_or(false)
    }

    fn delete(&self, name: &str) -> Result<(), StorageError> {
        let path = self.resolve(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Delete {
                name: name.to_string(),
                source,
            }),
        }
    }
}
