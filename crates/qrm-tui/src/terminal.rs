//! Raw mode, alternate screen and bracketed paste for the full-screen app.
//!
//! `leave` runs from `TuiRuntime`'s Drop and from the panic hook; whichever
//! comes first does the work. Ctrl+C arrives as a key event while raw mode is on.

use std::io::{self, Stdout};
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

pub type AppTerminal = Terminal<CrosstermBackend<Stdout>>;

static ACTIVE: AtomicBool = AtomicBool::new(false);

/// Switches the terminal into app mode.
///
/// Bracketed paste is on so a pasted API key arrives as a single event.
///
/// # Errors
/// Returns an error if any mode switch fails; whatever was already switched
/// is undone by `leave`.
pub fn enter() -> Result<AppTerminal> {
    ACTIVE.store(true, Ordering::SeqCst);
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)
        .context("Failed to enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")
}

/// Restores the terminal. Only the first call after `enter` does anything.
///
/// # Errors
/// Returns an error if raw mode cannot be disabled.
pub fn leave() -> Result<()> {
    if !ACTIVE.swap(false, Ordering::SeqCst) {
        return Ok(());
    }
    // paste mode first: the sequence must be written while still in raw mode
    let _ = execute!(io::stdout(), DisableBracketedPaste, LeaveAlternateScreen);
    disable_raw_mode().context("Failed to disable raw mode")
}

/// Restores the terminal before the default hook prints the panic.
pub fn install_panic_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let _ = leave();
        previous(info);
    }));
}
