//! Whole-collection persistence for user records.
//!
//! Every operation reads the full JSON array from disk and every mutation
//! writes the full array back. There is no locking: two requests racing a
//! load/modify/save cycle resolve as last-write-wins and one update is lost.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use roster_types::User;
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed user data in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to serialize users: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Whole-collection load and save, as used by the request handlers.
pub trait UserStore: Send + Sync {
    fn load(&self) -> Result<Vec<User>, StoreError>;
    fn save(&self, users: &[User]) -> Result<(), StoreError>;
}

impl UserStore for Store {
    fn load(&self) -> Result<Vec<User>, StoreError> {
        Store::load(self)
    }

    fn save(&self, users: &[User]) -> Result<(), StoreError> {
        Store::save(self, users)
    }
}

/// Handle on the JSON file holding the user collection.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the data file holding an empty collection if it does not exist.
    /// Returns whether a file was created. Existing files are left untouched.
    pub fn ensure_initialized(&self) -> Result<bool, StoreError> {
        if self.path.exists() {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        self.save(&[])?;
        info!("Initialized empty user store at {}", self.path.display());
        Ok(true)
    }

    /// Reads the entire collection. An absent, unreadable or malformed file is
    /// an error; it is never treated as an empty collection.
    pub fn load(&self) -> Result<Vec<User>, StoreError> {
        let content = fs::read(&self.path).map_err(|source| {
            error!("Failed to read {}: {}", self.path.display(), source);
            StoreError::Read {
                path: self.path.clone(),
                source,
            }
        })?;

        let users: Vec<User> = serde_json::from_slice(&content).map_err(|source| {
            error!("Failed to parse {}: {}", self.path.display(), source);
            StoreError::Parse {
                path: self.path.clone(),
                source,
            }
        })?;

        debug!("Loaded {} users from {}", users.len(), self.path.display());
        Ok(users)
    }

    /// Overwrites the file with `users`. The data goes to a uniquely named
    /// temporary file in the same directory and is renamed into place, so
    /// `load` sees either the old or the new collection, never a partial
    /// write, even while other saves are in flight.
    pub fn save(&self, users: &[User]) -> Result<(), StoreError> {
        let content = serde_json::to_vec_pretty(users)?;

        self.write_atomic(&content).map_err(|source| {
            error!("Failed to write {}: {}", self.path.display(), source);
            StoreError::Write {
                path: self.path.clone(),
                source,
            }
        })?;

        debug!("Saved {} users to {}", users.len(), self.path.display());
        Ok(())
    }

    fn write_atomic(&self, content: &[u8]) -> std::io::Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = tempfile::Builder::new()
            .prefix(".users-")
            .suffix(".tmp")
            .tempfile_in(dir)?;
        tmp.write_all(content)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}
