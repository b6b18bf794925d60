//! Terminal UI for QR Mini.
//!
//! Elm-style: `AppState` is changed only by `update::update`, which returns
//! `UiEffect`s for a runtime to execute. `TuiRuntime` draws a full-screen UI;
//! `HeadlessRuntime` drives the same reducer for the plain-text commands.

pub mod common;
pub mod effects;
pub mod events;
pub mod features;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod update;

use std::io::{IsTerminal, Write, stderr};

use anyhow::Result;
pub use features::{auth, qr_list};
use qrm_core::config::Config;
pub use runtime::{HeadlessRuntime, Services, TuiRuntime};
use state::{AppOptions, AppState};

/// Runs the interactive app until the user quits.
pub async fn run_app(config: &Config) -> Result<()> {
    if !stderr().is_terminal() {
        anyhow::bail!(
            "The interactive app requires a terminal.\n\
             Use `qrm login <API_KEY>` or `qrm list` for plain output."
        );
    }

    let services = Services::from_config(config)?;
    let options = AppOptions::from_config(config, services.client.base_url());
    tracing::info!(
        image_base_url = %options.image_base_url,
        mode = config.api.mode.display_name(),
        store = services.store.backend_name(),
        "Starting QR Mini"
    );

    let mut runtime = TuiRuntime::new(AppState::new(options), services)?;
    runtime.run()?;
    drop(runtime);

    writeln!(stderr(), "Goodbye!")?;
    Ok(())
}
