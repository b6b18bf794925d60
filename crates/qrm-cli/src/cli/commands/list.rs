//! `qrm list`: print the codes of the saved session.

use anyhow::Result;
use comfy_table::{ContentArrangement, Table};
use qrm_core::config::Config;
use qrm_core::models::QrCode;
use qrm_tui::render::plain_text;

use super::bootstrapped_runtime;

pub async fn run(config: &Config, table: bool) -> Result<()> {
    let runtime = bootstrapped_runtime(config).await?;
    let state = &runtime.state;

    if !state.session.is_authenticated() {
        if let Some(error) = &state.error {
            anyhow::bail!("{error}");
        }
        anyhow::bail!("Not logged in. Run `qrm login <API_KEY>` first.");
    }

    if table {
        if let Some(error) = &state.error {
            anyhow::bail!("{error}");
        }
        let codes = state.qr_list.list.codes();
        print!("{}", codes_table(codes, &state.options.image_base_url));
        return Ok(());
    }

    print!("{}", plain_text(state));
    if let Some(error) = &state.error {
        anyhow::bail!("{error}");
    }
    Ok(())
}

fn codes_table(codes: &[QrCode], base_url: &str) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Name", "Type", "Content", "Short link", "Image"]);
    for code in codes {
        table.add_row(vec![
            code.id.clone(),
            code.name.clone(),
            code.kind.clone(),
            code.content.clone(),
            code.short_link.clone().unwrap_or_default(),
            code.image_url(base_url).unwrap_or_default(),
        ]);
    }
    format!("{table}\n")
}
