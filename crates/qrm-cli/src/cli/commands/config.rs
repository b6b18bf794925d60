//! `qrm config`.

use std::io::{self, Write};

use anyhow::{Context, Result};
use qrm_core::config::{Config, paths};

pub fn path() {
    println!("{}", paths::config_path().display());
}

/// Writes the commented default config; refuses to overwrite.
pub fn init() -> Result<()> {
    let path = paths::config_path();
    Config::init(&path).with_context(|| format!("init config at {}", path.display()))?;
    println!("Created config at {}", path.display());
    Ok(())
}

/// Prints the template merged with the current defaults.
pub fn generate() -> Result<()> {
    let generated = Config::generate()?;
    io::stdout()
        .lock()
        .write_all(generated.as_bytes())
        .context("write generated config")
}
