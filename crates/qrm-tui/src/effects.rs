//! UI effect types.
//!
//! Effects are commands returned by the reducer that a runtime executes.
//! They represent I/O and task spawning only (no direct UI mutations).
//!
//! ## Cancellation
//!
//! The reducer creates the `CancellationToken` for each request and keeps a
//! clone in `Tasks`. When a newer request of the same kind starts, the
//! reducer emits `CancelTask` with the superseded token.

use qrm_core::models::StoredSession;
use tokio_util::sync::CancellationToken;

use crate::common::TaskId;

#[derive(Debug)]
pub enum UiEffect {
    /// Quit the application.
    Quit,

    /// Read the stored session.
    LoadSession,

    /// Validate an API key.
    Validate {
        task: TaskId,
        api_key: String,
        cancel: CancellationToken,
    },

    /// Fetch the QR code list.
    FetchList {
        task: TaskId,
        api_key: String,
        cancel: CancellationToken,
    },

    /// Write the session to the store.
    PersistSession { session: StoredSession },

    /// Open a URL in the system browser.
    OpenBrowser { url: String },

    /// Cancel a superseded request.
    CancelTask { token: CancellationToken },
}
