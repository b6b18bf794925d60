//! Key form view.

use qrm_core::logging::mask_key;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use super::state::AuthState;
use crate::render::{ViewMode, spinner};

pub const TITLE: &str = "QR Mini App";
pub const FORM_LABEL: &str = "Enter the token from the website";
pub const PLACEHOLDER: &str = "Your api_key (for example, 5af771cc3f31d07b66dae88f8cda14b0)";

/// Form lines: label, input field and submit hint.
pub fn form_lines(
    auth: &AuthState,
    validating: bool,
    mode: ViewMode,
    spinner_frame: usize,
) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        FORM_LABEL,
        Style::default().add_modifier(Modifier::BOLD),
    ))];

    let prompt = Span::styled("> ", Style::default().fg(Color::Cyan));
    let field = match mode {
        ViewMode::Interactive if auth.input.is_empty() => Line::from(vec![
            prompt,
            Span::styled("█", Style::default().fg(Color::Cyan)),
            Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)),
        ]),
        ViewMode::Interactive => {
            let (before, after) = auth.input.split_at_cursor();
            let mut after = after.chars();
            let under_cursor = after.next().map_or_else(|| " ".to_string(), String::from);
            Line::from(vec![
                prompt,
                Span::raw(before),
                Span::styled(
                    under_cursor,
                    Style::default().add_modifier(Modifier::REVERSED),
                ),
                Span::raw(after.collect::<String>()),
            ])
        }
        ViewMode::Plain if auth.input.is_empty() => Line::from(vec![prompt, Span::raw(PLACEHOLDER)]),
        ViewMode::Plain => Line::from(vec![prompt, Span::raw(mask_key(&auth.input.text()))]),
    };
    lines.push(field);

    if validating {
        lines.push(Line::from(Span::styled(
            format!("{} Checking key…", spinner(spinner_frame)),
            Style::default().fg(Color::Yellow),
        )));
    } else if mode == ViewMode::Interactive {
        lines.push(Line::from(vec![
            Span::styled("[Enter]", Style::default().fg(Color::Cyan)),
            Span::raw(" Sign in"),
        ]));
    }

    lines
}
