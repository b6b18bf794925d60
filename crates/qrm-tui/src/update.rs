//! Reducer (update function).
//!
//! All state mutations happen here. A runtime calls `update(app, event)` and
//! executes the returned effects.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use qrm_core::api::{ApiError, ListOutcome, ValidateOutcome};
use qrm_core::logging::mask_key;
use qrm_core::models::StoredSession;
use tokio_util::sync::CancellationToken;

use crate::auth::{self, FormAction, SubmitOutcome};
use crate::common::{TaskId, TaskKind};
use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::qr_list::{self, ListAction, QrList};
use crate::state::{AppState, SessionState};

pub const INVALID_TOKEN: &str = "Invalid token or server error";
pub const CONNECT_FAILED: &str = "Failed to connect to the API";
pub const LIST_MISSING: &str = "QR code list is missing from the response";
pub const LIST_FAILED: &str = "Failed to load QR codes";
pub const LIST_ERROR: &str = "Error while loading QR codes";

/// Effects to run when a runtime starts.
pub fn init(_app: &mut AppState) -> Vec<UiEffect> {
    vec![UiEffect::LoadSession]
}

/// The main reducer function.
pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => {
            app.spinner_frame = app.spinner_frame.wrapping_add(1);
            vec![]
        }
        UiEvent::Terminal(term_event) => handle_terminal_event(app, term_event),
        UiEvent::SessionLoaded { result } => handle_session_loaded(app, result),
        UiEvent::SubmitKey { raw_key } => submit(app, raw_key),
        UiEvent::Reload => reload(app),
        UiEvent::Validated {
            task,
            api_key,
            result,
        } => handle_validated(app, task, api_key, result),
        UiEvent::ListFetched { task, result } => handle_list_fetched(app, task, result),
        UiEvent::SessionPersisted { result } => {
            if let Err(err) = result {
                tracing::warn!(error = %err, "Failed to persist session");
                app.error = Some(format!("Could not save session: {err}"));
            }
            vec![]
        }
        UiEvent::TaskCancelled { kind, task } => {
            if app.tasks.state_mut(kind).finish_if_active(task) {
                tracing::debug!(?kind, task = task.0, "Active task reported cancelled");
            }
            vec![]
        }
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Allocates a task id for `kind`, superseding any request in flight.
fn start_task(app: &mut AppState, kind: TaskKind) -> (TaskId, CancellationToken, Vec<UiEffect>) {
    let task = app.task_seq.next_id();
    let cancel = CancellationToken::new();
    let mut effects = Vec::new();
    if let Some(previous) = app.tasks.state_mut(kind).start(task, cancel.clone()) {
        tracing::debug!(?kind, task = task.0, "Superseding request in flight");
        effects.push(UiEffect::CancelTask { token: previous });
    }
    (task, cancel, effects)
}

fn submit(app: &mut AppState, raw_key: String) -> Vec<UiEffect> {
    app.error = None;
    app.auth.last_outcome = None;
    tracing::info!(key = %mask_key(&raw_key), "Submitting API key");
    let (task, cancel, mut effects) = start_task(app, TaskKind::Validate);
    effects.push(UiEffect::Validate {
        task,
        api_key: raw_key,
        cancel,
    });
    effects
}

fn fetch_list(app: &mut AppState, api_key: String) -> Vec<UiEffect> {
    let (task, cancel, mut effects) = start_task(app, TaskKind::List);
    effects.push(UiEffect::FetchList {
        task,
        api_key,
        cancel,
    });
    effects
}

fn reload(app: &mut AppState) -> Vec<UiEffect> {
    let Some(api_key) = app.session.api_key().map(str::to_string) else {
        return vec![];
    };
    app.error = None;
    fetch_list(app, api_key)
}

// ============================================================================
// Results
// ============================================================================

fn handle_session_loaded(
    app: &mut AppState,
    result: Result<Option<StoredSession>, String>,
) -> Vec<UiEffect> {
    app.bootstrapped = true;
    match result {
        Ok(Some(stored)) if app.options.revalidate_on_startup => {
            tracing::info!("Revalidating stored API key");
            app.auth.input.set_text(&stored.api_key);
            submit(app, stored.api_key)
        }
        Ok(Some(stored)) => {
            tracing::info!(user_id = %stored.user_id, "Restored stored session");
            let api_key = stored.api_key.clone();
            app.session = SessionState::from(stored);
            fetch_list(app, api_key)
        }
        Ok(None) => vec![],
        Err(err) => {
            tracing::warn!(error = %err, "Failed to read stored session");
            app.error = Some(format!("Could not read saved session: {err}"));
            vec![]
        }
    }
}

fn handle_validated(
    app: &mut AppState,
    task: TaskId,
    api_key: String,
    result: Result<ValidateOutcome, ApiError>,
) -> Vec<UiEffect> {
    if !app.tasks.validate.finish_if_active(task) {
        tracing::debug!(task = task.0, "Discarding stale validation result");
        return vec![];
    }

    match result {
        Ok(ValidateOutcome::Accepted { user_id }) => {
            tracing::info!(%user_id, "API key accepted");
            app.auth.last_outcome = Some(SubmitOutcome::Accepted);
            if app.session.user_id() != Some(user_id.as_str()) {
                app.qr_list.replace(QrList::NotLoaded);
            }
            app.session = SessionState::Authenticated {
                api_key: api_key.clone(),
                user_id: user_id.clone(),
            };
            app.auth.editing = false;
            app.auth.input.clear();

            let mut effects = vec![UiEffect::PersistSession {
                session: StoredSession {
                    api_key: api_key.clone(),
                    user_id,
                },
            }];
            effects.extend(fetch_list(app, api_key));
            effects
        }
        Ok(ValidateOutcome::Rejected { message }) => {
            tracing::info!(?message, "API key rejected");
            app.auth.last_outcome = Some(SubmitOutcome::Rejected);
            app.error = Some(message.unwrap_or_else(|| INVALID_TOKEN.to_string()));
            vec![]
        }
        Err(err) => {
            tracing::warn!(error = %err, "Validation request failed");
            app.auth.last_outcome = Some(SubmitOutcome::Failed);
            app.error = Some(CONNECT_FAILED.to_string());
            vec![]
        }
    }
}

fn handle_list_fetched(
    app: &mut AppState,
    task: TaskId,
    result: Result<ListOutcome, ApiError>,
) -> Vec<UiEffect> {
    if !app.tasks.list.finish_if_active(task) {
        tracing::debug!(task = task.0, "Discarding stale list result");
        return vec![];
    }

    match result {
        Ok(ListOutcome::Loaded(codes)) => {
            tracing::debug!(count = codes.len(), "QR codes updated");
            app.qr_list.replace(QrList::from_codes(codes));
        }
        Ok(ListOutcome::MissingContent) => {
            app.qr_list.replace(QrList::Empty);
            app.error = Some(LIST_MISSING.to_string());
        }
        Ok(ListOutcome::Failed { status }) => {
            tracing::warn!(status, "List request was refused");
            app.error = Some(LIST_FAILED.to_string());
        }
        Err(err) => {
            tracing::warn!(error = %err, "List request failed");
            app.error = Some(LIST_ERROR.to_string());
        }
    }
    vec![]
}

// ============================================================================
// Terminal Event Handlers
// ============================================================================

fn handle_terminal_event(app: &mut AppState, event: Event) -> Vec<UiEffect> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(app, key),
        Event::Paste(text) => {
            if app.form_visible() {
                auth::handle_form_paste(&mut app.auth.input, &text);
            }
            vec![]
        }
        _ => vec![],
    }
}

fn handle_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return vec![UiEffect::Quit];
    }

    if app.form_visible() {
        return match auth::handle_form_key(&mut app.auth.input, key) {
            FormAction::Submit(raw_key) => submit(app, raw_key),
            FormAction::Cancel if app.session.is_authenticated() => {
                app.auth.editing = false;
                app.auth.input.clear();
                vec![]
            }
            FormAction::Cancel => vec![UiEffect::Quit],
            FormAction::None => vec![],
        };
    }

    match qr_list::handle_list_key(&mut app.qr_list, key) {
        ListAction::Open(url) => vec![UiEffect::OpenBrowser { url }],
        ListAction::Reload => reload(app),
        ListAction::EditKey => {
            app.auth.editing = true;
            app.auth.input.clear();
            vec![]
        }
        ListAction::Quit => vec![UiEffect::Quit],
        ListAction::None => vec![],
    }
}
