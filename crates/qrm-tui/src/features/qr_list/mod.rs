//! QR code list screen.

pub mod render;
pub mod state;
pub mod update;

pub use state::{QrList, QrListState};
pub use update::{ListAction, handle_list_key};
