use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;

use super::KeyValueStore;

/// In-memory store for tests and embedding.
#[derive(Clone, Debug)]
pub struct MemoryStore {
    items: Arc<Mutex<HashMap<String, String>>>,
    available: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            items: Arc::default(),
            available: true,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that reports itself unavailable, to exercise fallback.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::default()
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn location(&self) -> String {
        "(in memory)".to_string()
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get(key).cloned())
    }

    fn set_items(&self, pairs: &[(&str, &str)]) -> Result<()> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in pairs {
            items.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }
}
