//! List screen view.

use qrm_core::models::QrCode;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use super::state::{QrList, QrListState};
use crate::common::single_line;
use crate::render::{ViewMode, spinner};

pub const LIST_HEADING: &str = "Your QR codes:";
pub const NO_CODES: &str = "No QR codes found.";

/// Rendered list plus the index of the selected item's first line.
pub struct ListView {
    pub lines: Vec<Line<'static>>,
    pub selected_line: Option<usize>,
}

pub fn list_lines(
    state: &QrListState,
    base_url: &str,
    loading: bool,
    mode: ViewMode,
    spinner_frame: usize,
) -> ListView {
    let mut lines = vec![Line::from(Span::styled(
        LIST_HEADING,
        Style::default().add_modifier(Modifier::BOLD),
    ))];

    let codes = match &state.list {
        QrList::Loaded(codes) => codes,
        QrList::NotLoaded if loading => {
            lines.push(Line::from(Span::styled(
                format!("{} Loading QR codes…", spinner(spinner_frame)),
                Style::default().fg(Color::Yellow),
            )));
            return ListView {
                lines,
                selected_line: None,
            };
        }
        QrList::NotLoaded | QrList::Empty => {
            lines.push(Line::from(Span::styled(
                NO_CODES,
                Style::default().fg(Color::DarkGray),
            )));
            return ListView {
                lines,
                selected_line: None,
            };
        }
    };

    if loading {
        lines.push(Line::from(Span::styled(
            format!("{} Refreshing…", spinner(spinner_frame)),
            Style::default().fg(Color::Yellow),
        )));
    }

    let mut selected_line = None;
    for (index, code) in codes.iter().enumerate() {
        let selected = mode == ViewMode::Interactive && index == state.selected;
        if selected {
            selected_line = Some(lines.len());
        }
        lines.extend(item_lines(code, base_url, selected, mode));
    }

    ListView {
        lines,
        selected_line,
    }
}

fn item_lines(code: &QrCode, base_url: &str, selected: bool, mode: ViewMode) -> Vec<Line<'static>> {
    let marker = match mode {
        ViewMode::Interactive if selected => "› ",
        ViewMode::Interactive => "  ",
        ViewMode::Plain => "- ",
    };
    let name_style = if selected {
        Style::default()
            .add_modifier(Modifier::BOLD)
            .add_modifier(Modifier::REVERSED)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let detail = Style::default().fg(Color::DarkGray);

    let mut lines = vec![Line::from(vec![
        Span::styled(marker, Style::default().fg(Color::Cyan)),
        Span::styled(single_line(&code.name), name_style),
        Span::raw(format!(" (Type: {})", single_line(&code.kind))),
    ])];
    lines.push(Line::from(vec![
        Span::raw("    "),
        Span::styled(
            single_line(&code.content),
            Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
        ),
    ]));
    if let Some(image) = code.image_url(base_url) {
        lines.push(Line::from(vec![
            Span::raw("    "),
            Span::styled(format!("Image: {}", single_line(&image)), detail),
        ]));
    }
    if let Some(short_link) = &code.short_link {
        lines.push(Line::from(vec![
            Span::raw("    "),
            Span::styled(format!("Short link: {}", single_line(short_link)), detail),
        ]));
    }
    if let Some(params) = code.params_json() {
        lines.push(Line::from(vec![
            Span::raw("    "),
            Span::styled(format!("Params: {params}"), detail),
        ]));
    }
    lines
}
