//! CLI command handlers.

pub mod app;
pub mod config;
pub mod list;
pub mod login;
pub mod proxy;
pub mod session;

use anyhow::Result;
use qrm_core::config::Config;
use qrm_tui::state::{AppOptions, AppState};
use qrm_tui::{HeadlessRuntime, Services};

/// A reducer runtime for plain-text commands, bootstrapped from storage.
async fn bootstrapped_runtime(config: &Config) -> Result<HeadlessRuntime> {
    let services = Services::from_config(config)?;
    let options = AppOptions::from_config(config, services.client.base_url());
    tracing::debug!(
        image_base_url = %options.image_base_url,
        store = services.store.backend_name(),
        "Starting headless runtime"
    );
    let mut runtime = HeadlessRuntime::new(AppState::new(options), services);
    runtime.bootstrap().await;
    Ok(runtime)
}
