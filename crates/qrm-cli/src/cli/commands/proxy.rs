//! Development proxy.

use anyhow::Result;
use qrm_core::config::Config;
use qrm_proxy::ProxySettings;

pub async fn run(config: &Config, listen: Option<&str>, target: Option<&str>) -> Result<()> {
    let settings = ProxySettings::from_config(&config.proxy, listen, target)?;
    eprintln!(
        "Proxying http://{} -> {} (Ctrl+C to stop)",
        settings.listen, settings.target
    );
    qrm_proxy::run(settings).await
}
