//! Persistent key-value storage for the server address and access token
//!
//! The host platform may back this with its own preferences API; the crate
//! ships a JSON file store and an in-memory store.

use crate::error::StoreError;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// Key holding the normalized server address
pub const SERVER_ADDRESS_KEY: &str = "server_address";
/// Key holding the optional access token
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// String key-value storage.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Store backed by a single JSON object on disk. Every write rewrites the file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = if path.exists() {
            let data = fs::read_to_string(&path)?;
            serde_json::from_str(&data)?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        self.flush()
    }
}

/// Volatile store, for hosts without persistence and for tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Saved form values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub server_address: Option<String>,
    pub access_token: Option<String>,
}

/// Read the saved address and token
pub fn load_credentials(store: &dyn KeyValueStore) -> Credentials {
    Credentials {
        server_address: store.get(SERVER_ADDRESS_KEY).filter(|s| !s.is_empty()),
        access_token: store.get(ACCESS_TOKEN_KEY).filter(|s| !s.is_empty()),
    }
}

/// Save the address, and the token only when one was entered.
///
/// An empty token leaves any previously saved token in place.
pub fn save_credentials(
    store: &mut dyn KeyValueStore,
    server_address: &str,
    access_token: &str,
) -> Result<(), StoreError> {
    store.set(SERVER_ADDRESS_KEY, server_address)?;
    if !access_token.is_empty() {
        store.set(ACCESS_TOKEN_KEY, access_token)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_credentials() {
        let mut store = MemoryStore::new();
        save_credentials(&mut store, "http://homeassistant.local:8123", "secret").unwrap();

        let creds = load_credentials(&store);
        assert_eq!(
            creds.server_address.as_deref(),
            Some("http://homeassistant.local:8123")
        );
        assert_eq!(creds.access_token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_empty_token_is_not_stored() {
        let mut store = MemoryStore::new();
        save_credentials(&mut store, "https://a.example:8123", "").unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY), None);

        // A previously saved token survives a submission without one
        save_credentials(&mut store, "https://a.example:8123", "t1").unwrap();
        save_credentials(&mut store, "https://b.example:8123", "").unwrap();
        let creds = load_credentials(&store);
        assert_eq!(creds.server_address.as_deref(), Some("https://b.example:8123"));
        assert_eq!(creds.access_token.as_deref(), Some("t1"));
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        assert!(store.get(SERVER_ADDRESS_KEY).is_none());
        save_credentials(&mut store, "https://myha.duckdns.org:8123", "tok").unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(
            load_credentials(&reopened),
            Credentials {
                server_address: Some("https://myha.duckdns.org:8123".into()),
                access_token: Some("tok".into()),
            }
        );
    }

    #[test]
    fn test_file_store_resubmit_overwrites_address() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        save_credentials(&mut store, "http://homeassistant.local:8123", "tok").unwrap();
        save_credentials(&mut store, "https://myha.duckdns.org:8123", "").unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get(SERVER_ADDRESS_KEY).as_deref(),
            Some("https://myha.duckdns.org:8123")
        );
        assert_eq!(reopened.get(ACCESS_TOKEN_KEY).as_deref(), Some("tok"));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(JsonFileStore::open(&path), Err(StoreError::Json(_))));
    }
}
