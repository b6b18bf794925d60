//! `qrm login`: validate a key, persist the session, print the list.

use anyhow::Result;
use qrm_core::config::Config;
use qrm_tui::auth::SubmitOutcome;
use qrm_tui::events::UiEvent;
use qrm_tui::render::plain_text;

use super::bootstrapped_runtime;

pub async fn run(config: &Config, api_key: &str) -> Result<()> {
    let mut runtime = bootstrapped_runtime(config).await?;
    runtime
        .dispatch(UiEvent::SubmitKey {
            raw_key: api_key.to_string(),
        })
        .await;

    print!("{}", plain_text(&runtime.state));

    // a recovered session stays authenticated even when this key is refused
    if runtime.state.auth.last_outcome != Some(SubmitOutcome::Accepted) {
        anyhow::bail!("Login failed");
    }
    Ok(())
}
