//! Cart persistence

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::items::CartItem;

/// Errors raised by cart storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be read or written.
    #[error("cart storage I/O failed: {0}")]
    Io(#[from] io::Error),

    /// Stored data could not be decoded or encoded.
    #[error("stored cart is not valid: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// Another user of the store panicked while holding it.
    #[error("cart storage lock was poisoned")]
    Poisoned,
}

/// Persisted form of a cart. Reorder context is never stored.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredCart {
    items: Vec<CartItem>,
}

fn decode(raw: &str) -> Result<Vec<CartItem>, StorageError> {
    Ok(serde_json::from_str::<StoredCart>(raw)?.items)
}

fn encode(items: &[CartItem]) -> Result<String, StorageError> {
    Ok(serde_json::to_string_pretty(&StoredCart {
        items: items.to_vec(),
    })?)
}

/// A place to keep cart lines between sessions.
pub trait CartStorage: Send + Sync {
    /// Read the stored lines, or `None` if nothing has been stored.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the backend fails or the data is corrupt.
    fn load(&self) -> Result<Option<Vec<CartItem>>, StorageError>;

    /// Replace the stored lines.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the backend fails.
    fn save(&self, items: &[CartItem]) -> Result<(), StorageError>;
}

impl<T: CartStorage + ?Sized> CartStorage for Box<T> {
    fn load(&self) -> Result<Option<Vec<CartItem>>, StorageError> {
        (**self).load()
    }

    fn save(&self, items: &[CartItem]) -> Result<(), StorageError> {
        (**self).save(items)
    }
}

/// Keeps the encoded cart in memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    raw: Mutex<Option<String>>,
}

impl MemoryStorage {
    /// Empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage already holding `raw`, which need not be valid.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
        }
    }

    /// The currently stored encoding.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Poisoned`] if the lock is poisoned.
    pub fn raw(&self) -> Result<Option<String>, StorageError> {
        Ok(self.raw.lock().map_err(|_err| StorageError::Poisoned)?.clone())
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self) -> Result<Option<Vec<CartItem>>, StorageError> {
        self.raw()?.as_deref().map(decode).transpose()
    }

    fn save(&self, items: &[CartItem]) -> Result<(), StorageError> {
        let encoded = encode(items)?;

        *self.raw.lock().map_err(|_err| StorageError::Poisoned)? = Some(encoded);

        Ok(())
    }
}

/// Keeps the cart in a JSON file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Storage backed by the file at `path`. The file is created on first save.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartStorage for FileStorage {
    fn load(&self) -> Result<Option<Vec<CartItem>>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => decode(&raw).map(Some),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, items: &[CartItem]) -> Result<(), StorageError> {
        fs::write(&self.path, encode(items)?)?;

        Ok(())
    }
}
