//! Interactive app.

use anyhow::Result;
use qrm_core::config::Config;

pub async fn run(config: &Config) -> Result<()> {
    qrm_tui::run_app(config).await
}
