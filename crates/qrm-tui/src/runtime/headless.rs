//! Headless runtime: drives the reducer without a terminal.
//!
//! Effects run one at a time and each resulting event is fed back before the
//! next effect starts, so a call like `dispatch(SubmitKey)` returns only when
//! validation, persistence and the follow-up list fetch have all settled.

use std::collections::VecDeque;

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::runtime::{Services, handlers};
use crate::state::AppState;
use crate::update;

pub struct HeadlessRuntime {
    pub state: AppState,
    services: Services,
}

impl HeadlessRuntime {
    pub fn new(state: AppState, services: Services) -> Self {
        Self { state, services }
    }

    /// Loads the stored session and runs whatever it triggers.
    pub async fn bootstrap(&mut self) {
        let effects = update::init(&mut self.state);
        self.run_effects(effects).await;
    }

    /// Feeds one event through the reducer and runs its effects to completion.
    pub async fn dispatch(&mut self, event: UiEvent) {
        let effects = update::update(&mut self.state, event);
        self.run_effects(effects).await;
    }

    async fn run_effects(&mut self, effects: Vec<UiEffect>) {
        let mut pending: VecDeque<UiEffect> = effects.into();
        while let Some(effect) = pending.pop_front() {
            if let Some(event) = self.execute_effect(effect).await {
                pending.extend(update::update(&mut self.state, event));
            }
        }
    }

    async fn execute_effect(&mut self, effect: UiEffect) -> Option<UiEvent> {
        match effect {
            UiEffect::Quit => {
                self.state.should_quit = true;
                None
            }
            UiEffect::LoadSession => Some(handlers::load_session(&self.services.store)),
            UiEffect::PersistSession { session } => {
                Some(handlers::persist_session(&self.services.store, &session))
            }
            UiEffect::Validate {
                task,
                api_key,
                cancel,
            } => Some(
                handlers::validate_key(self.services.client.clone(), task, api_key, cancel).await,
            ),
            UiEffect::FetchList {
                task,
                api_key,
                cancel,
            } => Some(
                handlers::fetch_list(self.services.client.clone(), task, api_key, cancel).await,
            ),
            UiEffect::CancelTask { token } => {
                token.cancel();
                None
            }
            UiEffect::OpenBrowser { url } => {
                tracing::debug!(%url, "Ignoring browser request in headless mode");
                None
            }
        }
    }
}
