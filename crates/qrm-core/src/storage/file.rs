//! JSON object file store.
//!
//! Values live in a flat `{ "key": "value" }` object, written with
//! restricted permissions (0600) on Unix.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use super::KeyValueStore;
use crate::models::scalar_text;

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    name: &'static str,
    /// Host stores are provided by the environment; never create their directory.
    create_parent: bool,
}

impl JsonFileStore {
    /// A host-provided store. Available only when its directory exists.
    pub fn host(path: PathBuf) -> Self {
        Self {
            path,
            name: "host",
            create_parent: false,
        }
    }

    /// The local fallback store. Always available; the directory is created on write.
    pub fn local(path: PathBuf) -> Self {
        Self {
            path,
            name: "local",
            create_parent: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session store {}", self.path.display()))?;
        if contents.trim().is_empty() {
            return Ok(Map::new());
        }
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse session store {}", self.path.display()))
    }

    fn write_map(&self, map: &Map<String, Value>) -> Result<()> {
        if self.create_parent
            && let Some(parent) = self.path.parent()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(map).context("Failed to serialize session store")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        #[cfg(not(unix))]
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn name(&self) -> &'static str {
        self.name
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn is_available(&self) -> bool {
        if self.create_parent {
            return true;
        }
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.is_dir(),
            _ => true,
        }
    }

    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_map()?.get(key).and_then(scalar_text))
    }

    fn set_items(&self, items: &[(&str, &str)]) -> Result<()> {
        let mut map = self.read_map()?;
        for (key, value) in items {
            map.insert((*key).to_string(), Value::String((*value).to_string()));
        }
        self.write_map(&map)
    }
}
