//! Effect handlers.
//!
//! Pure functions that perform the I/O an effect asks for and return the
//! resulting `UiEvent`. They never touch `AppState`; runtimes decide how to
//! schedule them (spawned for the terminal UI, awaited in sequence headless).

use qrm_core::api::QrApiClient;
use qrm_core::models::StoredSession;
use qrm_core::storage::SessionStore;
use tokio_util::sync::CancellationToken;

use crate::common::{TaskId, TaskKind};
use crate::events::UiEvent;

pub fn load_session(store: &SessionStore) -> UiEvent {
    let result = store.load().map_err(|err| format!("{err:#}"));
    UiEvent::SessionLoaded { result }
}

pub fn persist_session(store: &SessionStore, session: &StoredSession) -> UiEvent {
    let result = store.save(session).map_err(|err| format!("{err:#}"));
    UiEvent::SessionPersisted { result }
}

pub async fn validate_key(
    client: QrApiClient,
    task: TaskId,
    api_key: String,
    cancel: CancellationToken,
) -> UiEvent {
    tokio::select! {
        biased;
        () = cancel.cancelled() => UiEvent::TaskCancelled { kind: TaskKind::Validate, task },
        result = client.validate(&api_key) => UiEvent::Validated { task, api_key, result },
    }
}

pub async fn fetch_list(
    client: QrApiClient,
    task: TaskId,
    api_key: String,
    cancel: CancellationToken,
) -> UiEvent {
    tokio::select! {
        biased;
        () = cancel.cancelled() => UiEvent::TaskCancelled { kind: TaskKind::List, task },
        result = client.list(&api_key) => UiEvent::ListFetched { task, result },
    }
}

pub fn open_browser(url: &str) {
    if let Err(err) = open::that(url) {
        tracing::warn!(%url, error = %err, "Failed to open browser");
    }
}
