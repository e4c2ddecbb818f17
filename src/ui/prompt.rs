//! Login and upload forms, drawn as centered modals.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::common::centered;
use crate::app::{App, LoginField, LoginForm, Prompt, UploadField, UploadForm};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    match &app.prompt {
        Some(Prompt::Login(form)) => render_login(frame, app, form, area),
        Some(Prompt::Upload(form)) => render_upload(frame, app, form, area),
        None => {}
    }
}

/// One labelled input line; the focused field shows a cursor.
fn input_line(app: &App, label: &'static str, value: String, focused: bool) -> Line<'static> {
    let dim = Style::default().add_modifier(Modifier::DIM);
    let (value, style) = if focused {
        (format!("{}_", value), app.theme.input_focused)
    } else {
        (value, Style::default())
    };
    Line::from(vec![Span::styled(format!("  {:<10}", label), dim), Span::styled(value, style)])
}

fn status_line(app: &App, error: Option<&str>, submitting: bool, busy: &'static str) -> Line<'static> {
    match (submitting, error) {
        (true, _) => Line::from(Span::styled(
            format!("  {}", busy),
            Style::default().add_modifier(Modifier::DIM),
        )),
        (false, Some(err)) => Line::from(Span::styled(format!("  {}", err), app.theme.error_style())),
        (false, None) => Line::from(""),
    }
}

fn modal_block(app: &App, title: &'static str) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight))
}

fn render_login(frame: &mut Frame, app: &App, form: &LoginForm, area: Rect) {
    let masked = "•".repeat(form.password.chars().count());
    let lines = vec![
        Line::from(vec![Span::styled("Sign in to the landslide dashboard", app.theme.header)]),
        Line::from(""),
        input_line(app, "Username", form.username.clone(), form.focus == LoginField::Username),
        input_line(app, "Password", masked, form.focus == LoginField::Password),
        Line::from(""),
        status_line(app, form.error.as_deref(), form.submitting, "Signing in..."),
        Line::from(""),
        Line::from(Span::styled(
            "Tab:switch field  Enter:submit  Ctrl-C:quit",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];

    let login_area = centered(area, 52, 11);
    frame.render_widget(Clear, login_area);
    frame.render_widget(Paragraph::new(lines).block(modal_block(app, " Login ")), login_area);
}

fn render_upload(frame: &mut Frame, app: &App, form: &UploadForm, area: Rect) {
    let dim = Style::default().add_modifier(Modifier::DIM);

    let kind = form.kind();
    let kind_text = match kind {
        Some(k) if form.kinds.len() > 1 => format!("◀ {} ▶", k.label()),
        Some(k) => k.label().to_string(),
        None => "-".to_string(),
    };

    let mut lines = vec![
        Line::from(vec![Span::styled("Upload a file to the backend", app.theme.header)]),
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("  {:<10}", "Type"), dim),
            Span::styled(kind_text, Style::default().add_modifier(Modifier::BOLD)),
        ]),
        input_line(app, "File", form.path.clone(), form.focus == UploadField::Path),
    ];
    if kind.is_some_and(|k| k.takes_note()) {
        lines.push(input_line(app, "Note", form.note.clone(), form.focus == UploadField::Note));
    }
    lines.extend([
        Line::from(""),
        status_line(app, form.error.as_deref(), form.submitting, "Uploading..."),
        Line::from(""),
        Line::from(Span::styled(
            "←/→:type  Tab:field  Enter:upload  Esc:cancel",
            dim,
        )),
    ]);

    let upload_area = centered(area, 64, lines.len() as u16 + 2);
    frame.render_widget(Clear, upload_area);
    frame.render_widget(Paragraph::new(lines).block(modal_block(app, " Upload ")), upload_area);
}
