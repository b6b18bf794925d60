//! Runtimes: own the state, run the reducer, execute effects.
//!
//! This is the "Elm runtime" boundary: all side effects happen here.
//!
//! ## Inbox Pattern
//!
//! The terminal runtime spawns each request as a tokio task. Handlers return
//! a `UiEvent` which is sent to `inbox_tx`; the event loop drains `inbox_rx`
//! every frame and feeds the events to the reducer.
//!
//! Structure:
//! - `mod.rs`: `TuiRuntime` (event loop, effect dispatch) and `Services`
//! - `headless.rs`: `HeadlessRuntime` for the non-interactive commands
//! - `handlers.rs`: effect handler implementations

pub mod handlers;
mod headless;

use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
pub use headless::HeadlessRuntime;
use qrm_core::api::QrApiClient;
use qrm_core::config::Config;
use qrm_core::storage::SessionStore;
use tokio::sync::mpsc;

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::AppState;
use crate::terminal::{self, AppTerminal};
use crate::{render, update};

/// Tick cadence while a request is in flight (spinner animation).
pub const FRAME_DURATION: Duration = Duration::from_millis(80);

/// Poll duration when idle.
pub const IDLE_POLL_DURATION: Duration = Duration::from_millis(250);

/// What effects talk to: the API client and the session store.
#[derive(Debug, Clone)]
pub struct Services {
    pub client: QrApiClient,
    pub store: SessionStore,
}

impl Services {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            client: QrApiClient::from_config(&config.api)?,
            store: SessionStore::from_config(config),
        })
    }
}

/// Full-screen TUI runtime.
///
/// Owns the terminal and state. Terminal state is restored on drop and on
/// panic.
pub struct TuiRuntime {
    terminal: AppTerminal,
    pub state: AppState,
    services: Services,
    inbox_tx: mpsc::UnboundedSender<UiEvent>,
    inbox_rx: mpsc::UnboundedReceiver<UiEvent>,
    last_tick: Instant,
}

impl TuiRuntime {
    /// Enters the alternate screen and creates the runtime.
    pub fn new(state: AppState, services: Services) -> Result<Self> {
        terminal::install_panic_hook();
        let terminal = match terminal::enter() {
            Ok(terminal) => terminal,
            Err(err) => {
                let _ = terminal::leave();
                return Err(err).context("Failed to set up terminal");
            }
        };

        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        Ok(Self {
            terminal,
            state,
            services,
            inbox_tx,
            inbox_rx,
            last_tick: Instant::now(),
        })
    }

    /// Runs the main event loop until the user quits.
    pub fn run(&mut self) -> Result<()> {
        let effects = update::init(&mut self.state);
        self.execute_effects(effects);

        while !self.state.should_quit {
            self.terminal.draw(|frame| render::render(&self.state, frame))?;

            for event in self.collect_events()? {
                let effects = update::update(&mut self.state, event);
                self.execute_effects(effects);
                if self.state.should_quit {
                    break;
                }
            }
        }
        Ok(())
    }

    // ========================================================================
    // Event Collection
    // ========================================================================

    /// Collects events from the inbox and the terminal, then emits a Tick when due.
    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        let tick_interval = if self.state.tasks.is_any_running() {
            FRAME_DURATION
        } else {
            IDLE_POLL_DURATION
        };

        while let Ok(ev) = self.inbox_rx.try_recv() {
            events.push(ev);
        }

        let poll_duration = if events.is_empty() {
            tick_interval.saturating_sub(self.last_tick.elapsed())
        } else {
            Duration::ZERO
        };

        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            while event::poll(Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if self.last_tick.elapsed() >= tick_interval {
            events.push(UiEvent::Tick);
            self.last_tick = Instant::now();
        }

        Ok(events)
    }

    // ========================================================================
    // Effect Dispatch
    // ========================================================================

    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    fn dispatch_event(&mut self, event: UiEvent) {
        let effects = update::update(&mut self.state, event);
        if !effects.is_empty() {
            self.execute_effects(effects);
        }
    }

    /// Spawns an async handler and sends its event to the inbox when it finishes.
    fn spawn_effect<F, Fut>(&self, f: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = UiEvent> + Send + 'static,
    {
        let tx = self.inbox_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(f().await);
        });
    }

    fn execute_effect(&mut self, effect: UiEffect) {
        match effect {
            UiEffect::Quit => {
                self.state.should_quit = true;
            }
            UiEffect::OpenBrowser { url } => handlers::open_browser(&url),
            UiEffect::CancelTask { token } => token.cancel(),

            // Store access is a small local file; run it inline.
            UiEffect::LoadSession => {
                let event = handlers::load_session(&self.services.store);
                self.dispatch_event(event);
            }
            UiEffect::PersistSession { session } => {
                let event = handlers::persist_session(&self.services.store, &session);
                self.dispatch_event(event);
            }

            UiEffect::Validate {
                task,
                api_key,
                cancel,
            } => {
                let client = self.services.client.clone();
                self.spawn_effect(move || handlers::validate_key(client, task, api_key, cancel));
            }
            UiEffect::FetchList {
                task,
                api_key,
                cancel,
            } => {
                let client = self.services.client.clone();
                self.spawn_effect(move || handlers::fetch_list(client, task, api_key, cancel));
            }
        }
    }
}

impl Drop for TuiRuntime {
    fn drop(&mut self) {
        let _ = terminal::leave();
    }
}
