//! View: builds the screen from `AppState`.
//!
//! The same lines back the full-screen UI and the plain-text output of the
//! headless commands; `ViewMode` only changes decoration.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::auth::render as auth_view;
use crate::common::{single_line, truncate_with_ellipsis};
use crate::qr_list::render as list_view;
use crate::state::AppState;

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Horizontal margin inside the frame.
const MARGIN: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Full-screen UI: cursor, selection and key hints.
    Interactive,
    /// Plain text for stdout.
    Plain,
}

pub(crate) fn spinner(frame: usize) -> &'static str {
    SPINNER_FRAMES[frame % SPINNER_FRAMES.len()]
}

/// Screen lines plus the line to keep in view.
pub struct View {
    pub lines: Vec<Line<'static>>,
    pub focus_line: Option<usize>,
}

pub fn build_view(app: &AppState, mode: ViewMode) -> View {
    let mut lines = Vec::new();
    let mut focus_line = None;

    match app.session.user_id() {
        None => {
            lines.push(Line::from(Span::styled(
                auth_view::TITLE,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::default());
            lines.extend(auth_view::form_lines(
                &app.auth,
                app.tasks.validate.is_running(),
                mode,
                app.spinner_frame,
            ));
            push_error(&mut lines, app.error.as_deref(), mode);
        }
        Some(user_id) => {
            lines.push(Line::from(Span::styled(
                format!("Welcome, User ID: {}!", single_line(user_id)),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )));
            push_error(&mut lines, app.error.as_deref(), mode);
            lines.push(Line::default());

            if app.auth.editing {
                lines.extend(auth_view::form_lines(
                    &app.auth,
                    app.tasks.validate.is_running(),
                    mode,
                    app.spinner_frame,
                ));
            } else {
                let list = list_view::list_lines(
                    &app.qr_list,
                    &app.options.image_base_url,
                    app.tasks.list.is_running(),
                    mode,
                    app.spinner_frame,
                );
                let offset = lines.len();
                focus_line = list.selected_line.map(|line| line + offset);
                lines.extend(list.lines);
            }
        }
    }

    View { lines, focus_line }
}

fn push_error(lines: &mut Vec<Line<'static>>, error: Option<&str>, mode: ViewMode) {
    let Some(error) = error else {
        return;
    };
    let text = single_line(error);
    lines.push(match mode {
        ViewMode::Interactive => Line::from(vec![
            Span::styled(
                "✗ ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::styled(text, Style::default().fg(Color::Red)),
        ]),
        ViewMode::Plain => Line::from(format!("Error: {text}")),
    });
}

/// The view as plain text, one line per row.
pub fn plain_text(app: &AppState) -> String {
    let view = build_view(app, ViewMode::Plain);
    let mut out = String::new();
    for line in view.lines {
        for span in line.spans {
            out.push_str(&span.content);
        }
        out.push('\n');
    }
    out
}

fn key_hints(app: &AppState) -> Line<'static> {
    let hints: &[(&str, &str)] = if !app.session.is_authenticated() {
        &[("Enter", "sign in"), ("Esc", "quit")]
    } else if app.auth.editing {
        &[("Enter", "sign in"), ("Esc", "back")]
    } else {
        &[
            ("↑/↓", "select"),
            ("Enter", "open"),
            ("r", "reload"),
            ("e", "change key"),
            ("q", "quit"),
        ]
    };

    let mut spans = Vec::new();
    for (i, (key, action)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" · ", Style::default().fg(Color::DarkGray)));
        }
        spans.push(Span::styled(
            (*key).to_string(),
            Style::default().fg(Color::Cyan),
        ));
        spans.push(Span::styled(
            format!(" {action}"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

/// Scroll offset that keeps `focus` (and a few lines after it) on screen.
fn scroll_offset(focus: Option<usize>, total: usize, height: usize) -> usize {
    let Some(focus) = focus else {
        return 0;
    };
    if total <= height {
        return 0;
    }
    let lookahead = 4.min(height.saturating_sub(1));
    (focus + lookahead + 1).saturating_sub(height).min(total - height)
}

/// Renders the full-screen UI.
pub fn render(app: &AppState, frame: &mut Frame) {
    let area = frame.area();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" qrm ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [body, footer] = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);
    let body = Rect {
        x: body.x + MARGIN,
        width: body.width.saturating_sub(MARGIN * 2),
        ..body
    };

    let view = build_view(app, ViewMode::Interactive);
    let width = body.width as usize;
    let lines: Vec<Line<'static>> = view
        .lines
        .into_iter()
        .map(|line| fit_line(line, width))
        .collect();

    let offset = scroll_offset(view.focus_line, lines.len(), body.height as usize);
    let paragraph = Paragraph::new(lines).scroll((offset as u16, 0));
    frame.render_widget(paragraph, body);

    let footer = Rect {
        x: footer.x + MARGIN,
        width: footer.width.saturating_sub(MARGIN * 2),
        ..footer
    };
    frame.render_widget(Paragraph::new(key_hints(app)), footer);
}

/// Truncates a styled line to `width` columns, keeping span styles.
fn fit_line(line: Line<'static>, width: usize) -> Line<'static> {
    if line.width() <= width {
        return line;
    }
    let mut remaining = width;
    let mut spans = Vec::new();
    for span in line.spans {
        if remaining == 0 {
            break;
        }
        let span_width = span.width();
        if span_width <= remaining {
            remaining -= span_width;
            spans.push(span);
        } else {
            spans.push(Span::styled(
                truncate_with_ellipsis(&span.content, remaining),
                span.style,
            ));
            remaining = 0;
        }
    }
    Line::from(spans).style(line.style)
}

#[cfg(test)]
mod tests {
    use qrm_core::models::{QrCode, StoredSession};

    use super::*;
    use crate::qr_list::QrList;
    use crate::state::{AppOptions, SessionState};

    fn app() -> AppState {
        AppState::new(AppOptions {
            image_base_url: "https://qr.test".to_string(),
            revalidate_on_startup: false,
        })
    }

    fn signed_in() -> AppState {
        let mut app = app();
        app.session = SessionState::from(StoredSession {
            api_key: "A".to_string(),
            user_id: "42".to_string(),
        });
        app
    }

    #[test]
    fn test_unauthenticated_view() {
        let mut app = app();
        app.error = Some("nope".to_string());
        let text = plain_text(&app);

        assert!(text.starts_with("QR Mini App\n"));
        assert!(text.contains(auth_view::FORM_LABEL));
        assert!(text.contains(auth_view::PLACEHOLDER));
        assert!(text.contains("Error: nope"));
    }

    #[test]
    fn test_plain_view_masks_typed_key() {
        let mut app = app();
        app.auth.input.set_text("5af771cc3f31d07b");
        let text = plain_text(&app);
        assert!(text.contains("> 5af7…"));
        assert!(!text.contains("5af771cc"));
    }

    #[test]
    fn test_empty_and_not_loaded_render_no_codes() {
        let mut app = signed_in();
        assert!(plain_text(&app).contains(list_view::NO_CODES));

        app.qr_list.replace(QrList::Empty);
        assert!(plain_text(&app).contains(list_view::NO_CODES));
    }

    #[test]
    fn test_loading_indicator_before_first_fetch() {
        let mut app = signed_in();
        app.tasks.list.start(
            crate::common::TaskId(0),
            tokio_util::sync::CancellationToken::new(),
        );
        let text = plain_text(&app);
        assert!(text.contains("Loading QR codes…"));
        assert!(!text.contains(list_view::NO_CODES));
    }

    #[test]
    fn test_item_details() {
        let mut app = signed_in();
        let code: QrCode = serde_json::from_value(serde_json::json!({
            "ID": 5, "NAME": "Menu", "TYPE": "url", "CONTENT": "https://cafe.test",
            "QR_IMAGE": "/upload/5.png", "SHORT_LINK": "https://qr.test/s/5",
            "PARAMS": {"color": "red"}
        }))
        .unwrap();
        app.qr_list.replace(QrList::from_codes(vec![code]));

        let text = plain_text(&app);
        assert!(text.contains("Welcome, User ID: 42!"));
        assert!(text.contains("Your QR codes:"));
        assert!(text.contains("- Menu (Type: url)"));
        assert!(text.contains("https://cafe.test"));
        assert!(text.contains("Image: https://qr.test/upload/5.png"));
        assert!(text.contains("Short link: https://qr.test/s/5"));
        assert!(text.contains(r#"Params: {"color":"red"}"#));
    }

    #[test]
    fn test_proxy_mode_image_points_at_remote() {
        let mut config = qrm_core::config::Config::default();
        config.api.mode = qrm_core::config::ApiMode::Proxy;
        config.proxy.target = "https://qr.remote".to_string();

        let mut app = AppState::new(AppOptions::from_config(&config, "http://127.0.0.1:5173"));
        app.session = SessionState::from(StoredSession {
            api_key: "A".to_string(),
            user_id: "42".to_string(),
        });
        let code: QrCode = serde_json::from_value(serde_json::json!({
            "ID": 2, "NAME": "Card", "TYPE": "vcard", "CONTENT": "BEGIN:VCARD",
            "QR_IMAGE": "/upload/2.png"
        }))
        .unwrap();
        app.qr_list.replace(QrList::from_codes(vec![code]));

        let text = plain_text(&app);
        assert!(text.contains("Image: https://qr.remote/upload/2.png"));
        assert!(!text.contains("127.0.0.1:5173"));
    }

    #[test]
    fn test_optional_details_omitted() {
        let mut app = signed_in();
        let code: QrCode = serde_json::from_value(serde_json::json!({
            "ID": 1, "NAME": "x", "TYPE": "text", "CONTENT": "hi", "PARAMS": []
        }))
        .unwrap();
        app.qr_list.replace(QrList::from_codes(vec![code]));

        let text = plain_text(&app);
        assert!(!text.contains("Image:"));
        assert!(!text.contains("Short link:"));
        assert!(!text.contains("Params:"));
    }

    #[test]
    fn test_focus_follows_selection() {
        let mut app = signed_in();
        let codes = (0..3)
            .map(|i| QrCode {
                id: i.to_string(),
                name: format!("n{i}"),
                kind: "url".to_string(),
                content: "c".to_string(),
                qr_image: None,
                short_link: None,
                params: Default::default(),
            })
            .collect();
        app.qr_list.replace(QrList::from_codes(codes));
        app.qr_list.selected = 2;

        let view = build_view(&app, ViewMode::Interactive);
        let focus = view.focus_line.unwrap();
        let text: String = view.lines[focus]
            .spans
            .iter()
            .map(|s| s.content.as_ref())
            .collect();
        assert!(text.contains("n2"));
    }

    #[test]
    fn test_scroll_offset() {
        assert_eq!(scroll_offset(None, 100, 10), 0);
        assert_eq!(scroll_offset(Some(50), 20, 30), 0);
        assert_eq!(scroll_offset(Some(2), 100, 10), 0);
        assert_eq!(scroll_offset(Some(20), 100, 10), 15);
        assert_eq!(scroll_offset(Some(99), 100, 10), 90);
    }

    #[test]
    fn test_fit_line_truncates() {
        let line = Line::from(vec![Span::raw("abc"), Span::raw("defgh")]);
        let fitted = fit_line(line, 5);
        let text: String = fitted.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "abcd…");
    }
}
