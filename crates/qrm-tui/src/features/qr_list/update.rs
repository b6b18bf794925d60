//! List screen key handling.

use crossterm::event::{KeyCode, KeyEvent};

use super::state::QrListState;

/// What a key press on the list screen asks the reducer to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListAction {
    None,
    Open(String),
    Reload,
    EditKey,
    Quit,
}

pub fn handle_list_key(state: &mut QrListState, key: KeyEvent) -> ListAction {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            state.select_prev();
            ListAction::None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            state.select_next();
            ListAction::None
        }
        KeyCode::Home | KeyCode::Char('g') => {
            state.select_first();
            ListAction::None
        }
        KeyCode::End | KeyCode::Char('G') => {
            state.select_last();
            ListAction::None
        }
        KeyCode::Enter | KeyCode::Char('o') => state
            .selected_code()
            .map(|code| code.content.trim())
            .filter(|content| !content.is_empty())
            .map_or(ListAction::None, |content| {
                ListAction::Open(content.to_string())
            }),
        KeyCode::Char('r') => ListAction::Reload,
        KeyCode::Char('e') => ListAction::EditKey,
        KeyCode::Char('q') | KeyCode::Esc => ListAction::Quit,
        _ => ListAction::None,
    }
}
