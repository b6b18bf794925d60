//! API key form.

pub mod render;
pub mod state;
pub mod update;

pub use state::{AuthState, KeyInput, SubmitOutcome};
pub use update::{FormAction, handle_form_key, handle_form_paste};
