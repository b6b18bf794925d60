//! Session persistence.
//!
//! The session is two string values, `token` and `userId`, kept in a
//! key-value store. A host-provided store is preferred when one is configured
//! and reachable; otherwise a local JSON file under `$QRM_HOME` is used.

mod file;
mod memory;

use std::sync::Arc;

use anyhow::Result;
pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::config::{Config, paths};
use crate::models::StoredSession;

pub const TOKEN_KEY: &str = "token";
pub const USER_ID_KEY: &str = "userId";

/// A string key-value store.
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// Short backend name for display (`host`, `local`, `memory`).
    fn name(&self) -> &'static str;

    /// Human-readable location (a file path for file stores).
    fn location(&self) -> String;

    /// Whether the store can be used right now.
    fn is_available(&self) -> bool;

    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Writes all pairs in one update; either every pair lands or none does.
    fn set_items(&self, items: &[(&str, &str)]) -> Result<()>;

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.set_items(&[(key, value)])
    }
}

/// Reads and writes the persisted session through the selected backend.
#[derive(Debug, Clone)]
pub struct SessionStore {
    backend: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Picks the host store when it is available, else the local store.
    pub fn select(host: Option<Arc<dyn KeyValueStore>>, local: Arc<dyn KeyValueStore>) -> Self {
        match host {
            Some(host) if host.is_available() => {
                tracing::debug!(location = %host.location(), "Using host session store");
                Self::new(host)
            }
            Some(host) => {
                tracing::debug!(
                    location = %host.location(),
                    "Host session store unavailable, falling back to local store"
                );
                Self::new(local)
            }
            None => Self::new(local),
        }
    }

    /// Builds the store selection from config and the environment.
    pub fn from_config(config: &Config) -> Self {
        let host = config
            .host_storage_path()
            .map(|path| Arc::new(JsonFileStore::host(path)) as Arc<dyn KeyValueStore>);
        let local = Arc::new(JsonFileStore::local(paths::local_storage_path()));
        Self::select(host, local)
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn location(&self) -> String {
        self.backend.location()
    }

    /// Loads the stored session. Both values must be present and non-empty.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read.
    pub fn load(&self) -> Result<Option<StoredSession>> {
        let api_key = self.backend.get_item(TOKEN_KEY)?.filter(|v| !v.is_empty());
        let user_id = self
            .backend
            .get_item(USER_ID_KEY)?
            .filter(|v| !v.is_empty());

        Ok(match (api_key, user_id) {
            (Some(api_key), Some(user_id)) => Some(StoredSession { api_key, user_id }),
            _ => None,
        })
    }

    /// Persists both values in a single write, so a failure cannot leave a
    /// new token next to the previous user id.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be written.
    pub fn save(&self, session: &StoredSession) -> Result<()> {
        self.backend.set_items(&[
            (TOKEN_KEY, session.api_key.as_str()),
            (USER_ID_KEY, session.user_id.as_str()),
        ])?;
        tracing::debug!(backend = self.backend.name(), "Session saved");
        Ok(())
    }
}
