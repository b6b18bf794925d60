//! Application state.
//!
//! `AppState` is owned by a runtime and mutated only by the reducer in
//! `update.rs`.

use qrm_core::config::Config;
use qrm_core::models::StoredSession;

use crate::auth::AuthState;
use crate::common::{TaskSeq, Tasks};
use crate::qr_list::QrListState;

/// Whether a key has been accepted.
///
/// There is no transition back to `Unauthenticated`; a stored session is only
/// removed by clearing the store outside the app.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticated { api_key: String, user_id: String },
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }

    pub fn api_key(&self) -> Option<&str> {
        match self {
            SessionState::Authenticated { api_key, .. } => Some(api_key),
            SessionState::Unauthenticated => None,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            SessionState::Authenticated { user_id, .. } => Some(user_id),
            SessionState::Unauthenticated => None,
        }
    }
}

impl From<StoredSession> for SessionState {
    fn from(stored: StoredSession) -> Self {
        SessionState::Authenticated {
            api_key: stored.api_key,
            user_id: stored.user_id,
        }
    }
}

/// Startup options taken from config.
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Origin that serves QR images; relative `QR_IMAGE` paths resolve here.
    pub image_base_url: String,
    pub revalidate_on_startup: bool,
}

impl AppOptions {
    /// `api_base_url` is the client's base URL; see `Config::image_base_url`.
    pub fn from_config(config: &Config, api_base_url: &str) -> Self {
        Self {
            image_base_url: config.image_base_url(api_base_url),
            revalidate_on_startup: config.session.revalidate_on_startup,
        }
    }
}

#[derive(Debug)]
pub struct AppState {
    pub options: AppOptions,
    pub session: SessionState,
    pub auth: AuthState,
    pub qr_list: QrListState,
    /// The single error banner. A later error overwrites an earlier one.
    pub error: Option<String>,
    /// Set once the stored session has been read.
    pub bootstrapped: bool,
    pub tasks: Tasks,
    pub task_seq: TaskSeq,
    pub spinner_frame: usize,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(options: AppOptions) -> Self {
        Self {
            options,
            session: SessionState::Unauthenticated,
            auth: AuthState::default(),
            qr_list: QrListState::default(),
            error: None,
            bootstrapped: false,
            tasks: Tasks::default(),
            task_seq: TaskSeq::default(),
            spinner_frame: 0,
            should_quit: false,
        }
    }

    /// The key form is shown before login and after `e` on the list screen.
    pub fn form_visible(&self) -> bool {
        !self.session.is_authenticated() || self.auth.editing
    }
}

#[cfg(test)]
mod tests {
    use qrm_core::config::ApiMode;

    use super::*;

    #[test]
    fn test_authenticated_always_has_user_id() {
        let session = SessionState::from(StoredSession {
            api_key: "A".to_string(),
            user_id: "U".to_string(),
        });
        assert!(session.is_authenticated());
        assert_eq!(session.user_id(), Some("U"));
        assert_eq!(session.api_key(), Some("A"));
        assert_eq!(SessionState::Unauthenticated.user_id(), None);
    }

    #[test]
    fn test_proxy_mode_images_come_from_remote() {
        let mut config = Config::default();
        config.api.mode = ApiMode::Proxy;
        config.proxy.target = "https://qr.remote/".to_string();

        let options = AppOptions::from_config(&config, "http://127.0.0.1:5173");
        assert_eq!(options.image_base_url, "https://qr.remote");

        config.api.mode = ApiMode::Direct;
        let options = AppOptions::from_config(&config, "http://qr.direct");
        assert_eq!(options.image_base_url, "http://qr.direct");
    }
}
