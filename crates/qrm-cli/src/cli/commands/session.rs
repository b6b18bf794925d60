//! Session command handlers.

use anyhow::{Context, Result};
use qrm_core::config::Config;
use qrm_core::logging::mask_key;
use qrm_core::storage::SessionStore;

pub fn path(config: &Config) {
    let store = SessionStore::from_config(config);
    println!("{} ({})", store.location(), store.backend_name());
}

pub fn show(config: &Config) -> Result<()> {
    let store = SessionStore::from_config(config);
    let session = store
        .load()
        .with_context(|| format!("read session from {}", store.location()))?;
    match session {
        Some(session) => {
            println!("User ID: {}", session.user_id);
            println!("API key: {}", mask_key(&session.api_key));
        }
        None => println!("Not logged in."),
    }
    Ok(())
}
