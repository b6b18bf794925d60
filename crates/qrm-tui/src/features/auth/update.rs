//! Key form input handling.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::state::KeyInput;
use crate::common::single_line;

/// What a key press on the form asks the reducer to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormAction {
    None,
    Submit(String),
    Cancel,
}

pub fn handle_form_key(input: &mut KeyInput, key: KeyEvent) -> FormAction {
    match key.code {
        KeyCode::Enter => FormAction::Submit(input.text()),
        KeyCode::Esc => FormAction::Cancel,
        KeyCode::Backspace => {
            input.backspace();
            FormAction::None
        }
        KeyCode::Delete => {
            input.delete();
            FormAction::None
        }
        KeyCode::Left => {
            input.move_left();
            FormAction::None
        }
        KeyCode::Right => {
            input.move_right();
            FormAction::None
        }
        KeyCode::Home => {
            input.move_home();
            FormAction::None
        }
        KeyCode::End => {
            input.move_end();
            FormAction::None
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            input.clear();
            FormAction::None
        }
        KeyCode::Char(ch)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            input.insert_char(ch);
            FormAction::None
        }
        _ => FormAction::None,
    }
}

pub fn handle_form_paste(input: &mut KeyInput, text: &str) {
    input.insert_str(&single_line(text));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_typing_then_enter_submits_raw_text() {
        let mut input = KeyInput::default();
        for ch in " k1 ".chars() {
            assert_eq!(
                handle_form_key(&mut input, press(KeyCode::Char(ch))),
                FormAction::None
            );
        }
        assert_eq!(
            handle_form_key(&mut input, press(KeyCode::Enter)),
            FormAction::Submit(" k1 ".to_string())
        );
    }

    #[test]
    fn test_control_chords_do_not_insert() {
        let mut input = KeyInput::default();
        input.set_text("abc");
        handle_form_key(
            &mut input,
            KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL),
        );
        assert!(input.is_empty());

        handle_form_key(
            &mut input,
            KeyEvent::new(KeyCode::Char('x'), KeyModifiers::ALT),
        );
        assert!(input.is_empty());
    }

    #[test]
    fn test_paste_drops_newlines() {
        let mut input = KeyInput::default();
        handle_form_paste(&mut input, "5af7\n71cc\r\n");
        assert_eq!(input.text(), "5af771cc");
    }

    #[test]
    fn test_esc_cancels() {
        let mut input = KeyInput::default();
        assert_eq!(
            handle_form_key(&mut input, press(KeyCode::Esc)),
            FormAction::Cancel
        );
    }
}
