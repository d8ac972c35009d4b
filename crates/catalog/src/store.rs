use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    StorageUnavailable,
    Corrupt(String),
    Io(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::StorageUnavailable => write!(f, "browser storage unavailable"),
            StoreError::Corrupt(msg) => write!(f, "stored value corrupt: {msg}"),
            StoreError::Io(msg) => write!(f, "storage error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// String key-value storage with localStorage semantics.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    entries: BTreeMap<String, String>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
mod wasm_storage {
    use super::{KeyValueStore, StoreError};

    /// `window.localStorage`, looked up on every access so a storage that
    /// disappears (private mode, quota policy) surfaces as an error.
    #[derive(Debug, Default)]
    pub struct LocalStorageStore;

    impl LocalStorageStore {
        pub fn new() -> Result<Self, StoreError> {
            window_local_storage()?;
            Ok(Self)
        }
    }

    impl KeyValueStore for LocalStorageStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            window_local_storage()?
                .get_item(key)
                .map_err(|e| StoreError::Io(format!("get_item({key}) failed: {:?}", e)))
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
            window_local_storage()?
                .set_item(key, value)
                .map_err(|e| StoreError::Io(format!("set_item({key}) failed: {:?}", e)))
        }

        fn remove(&mut self, key: &str) -> Result<(), StoreError> {
            window_local_storage()?
                .remove_item(key)
                .map_err(|e| StoreError::Io(format!("remove_item({key}) failed: {:?}", e)))
        }
    }

    fn window_local_storage() -> Result<web_sys::Storage, StoreError> {
        let win = web_sys::window().ok_or(StoreError::StorageUnavailable)?;
        win.local_storage()
            .map_err(|e| StoreError::Io(format!("localStorage error: {:?}", e)))?
            .ok_or(StoreError::StorageUnavailable)
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_storage::LocalStorageStore;

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct LocalStorageStore;

#[cfg(not(target_arch = "wasm32"))]
impl LocalStorageStore {
    pub fn new() -> Result<Self, StoreError> {
        Err(StoreError::StorageUnavailable)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl KeyValueStore for LocalStorageStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::StorageUnavailable)
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::StorageUnavailable)
    }

    fn remove(&mut self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::StorageUnavailable)
    }
}
