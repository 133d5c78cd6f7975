use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::debug;

use crate::errors::CheckoutError;

/// Key under which the serialized cart is mirrored.
pub const CART_STORAGE_KEY: &str = "storefront_cart";

/// Durable key-value sink used to survive client restarts.
///
/// The engine treats the store as a write-through mirror: read once at
/// startup, written after every cart mutation. The in-memory cart remains
/// the source of truth throughout, so write ordering relative to later
/// reads is immaterial.
pub trait DurableStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CheckoutError>;
    fn set(&self, key: &str, value: &str) -> Result<(), CheckoutError>;
}

/// Volatile store for tests and embedded use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, CheckoutError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| CheckoutError::Storage("store mutex poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CheckoutError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CheckoutError::Storage("store mutex poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// File-backed store: one JSON document per key under a base directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl DurableStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, CheckoutError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| CheckoutError::Storage(format!("read {}: {}", path.display(), e)))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CheckoutError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| CheckoutError::Storage(format!("create {}: {}", self.dir.display(), e)))?;
        let path = self.path_for(key);
        fs::write(&path, value)
            .map_err(|e| CheckoutError::Storage(format!("write {}: {}", path.display(), e)))?;
        debug!("Persisted {} bytes to {}", value.len(), path.display());
        Ok(())
    }
}
