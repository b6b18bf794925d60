//! UI events.
//!
//! Everything that can change `AppState` arrives as a `UiEvent`: terminal
//! input, timer ticks, commands from headless callers, and the results of
//! effects executed by a runtime.

use crossterm::event::Event;
use qrm_core::api::{ApiError, ListOutcome, ValidateOutcome};
use qrm_core::models::StoredSession;

use crate::common::{TaskId, TaskKind};

#[derive(Debug)]
pub enum UiEvent {
    /// Animation tick.
    Tick,

    /// Raw terminal input.
    Terminal(Event),

    /// The stored session was read (or could not be).
    SessionLoaded {
        result: Result<Option<StoredSession>, String>,
    },

    /// Submit a key without going through the form (headless login).
    SubmitKey { raw_key: String },

    /// Reload the list for the current session.
    Reload,

    /// A validation request finished.
    Validated {
        task: TaskId,
        api_key: String,
        result: Result<ValidateOutcome, ApiError>,
    },

    /// A list request finished.
    ListFetched {
        task: TaskId,
        result: Result<ListOutcome, ApiError>,
    },

    /// Writing the session to the store finished.
    SessionPersisted { result: Result<(), String> },

    /// A request was abandoned because a newer one replaced it.
    TaskCancelled { kind: TaskKind, task: TaskId },
}
