//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, help overlay
//! and the helpers the table views share.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, Session, View};
use crate::data::ColorTier;

const TAB_DIVIDER: &str = "|";

/// Render the header bar with the signed-in user and risk overview.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = Span::styled(
        " LANDSLIDE WATCH ",
        Style::default().add_modifier(Modifier::BOLD),
    );

    let user = match &app.session {
        Session::Active(user) => user.label().to_string(),
        Session::Checking => "Checking session...".to_string(),
        Session::SignedOut => "Signed out".to_string(),
    };

    let mut spans = vec![title, Span::raw("│ "), Span::raw(user)];

    if let Some(date) = app.risk_map.date {
        spans.push(Span::raw(" │ "));
        spans.push(Span::raw(date.format("%Y-%m-%d").to_string()));
    }

    if !app.risk_map.districts.is_empty() {
        let counts = app.risk_map.tier_counts();
        let tier_count = |n: usize, tier: ColorTier| {
            if n > 0 {
                Span::styled(n.to_string(), app.theme.tier_style(tier))
            } else {
                Span::styled("0", Style::default().add_modifier(Modifier::DIM))
            }
        };
        spans.extend([
            Span::raw(" │ "),
            tier_count(counts.high, ColorTier::High),
            Span::raw(" high "),
            tier_count(counts.medium, ColorTier::Medium),
            Span::raw(" medium "),
            tier_count(counts.low, ColorTier::Low),
            Span::raw(" low"),
        ]);
    }

    if app.is_loading() {
        spans.push(Span::styled(
            " │ Loading...",
            Style::default().add_modifier(Modifier::DIM),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Tab titles in view order.
pub fn tab_titles() -> Vec<String> {
    View::ALL
        .iter()
        .enumerate()
        .map(|(i, v)| format!(" {}:{} ", i + 1, v.label()))
        .collect()
}

/// The view whose tab covers `column`, if any.
pub fn tab_at(column: u16) -> Option<View> {
    let mut start = 0u16;
    for (title, view) in tab_titles().iter().zip(View::ALL) {
        let end = start + title.chars().count() as u16;
        if column >= start && column < end {
            return Some(view);
        }
        start = end + TAB_DIVIDER.len() as u16;
    }
    None
}

/// Render the tab bar showing available views.
///
/// Highlights the currently active view.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = tab_titles().into_iter().map(Line::from).collect();

    let tabs = Tabs::new(titles)
        .select(app.current_view.index())
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .padding("", "")
        .divider(TAB_DIVIDER);

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows the backend, time since last update and available controls.
/// Also displays temporary status messages and errors.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    // Check for temporary status message first
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    if let Some(ref err) = app.load_error {
        let paragraph = Paragraph::new(format!(" Error: {} | r:retry q:quit", err))
            .style(app.theme.error_style());
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = if app.prompt.is_some() {
        "Tab:next field Enter:submit Ctrl-C:quit"
    } else if app.filter_active {
        "Type to search | Enter:apply Esc:cancel"
    } else {
        match app.current_view {
            View::RiskMap => "[ ]:date /:search s:sort Enter:detail e:export ?:help q:quit",
            View::Rain => "[ ]:date X:all dates P/D:filter n/p:page s:sort u:upload ?:help q:quit",
            View::RiskArea => "P/D/v:filter n/p:page z:size s:sort u:upload ?:help q:quit",
            View::Statistics => "Enter:preview u:upload r:reload ?:help q:quit",
            View::ProvinceDistrict => "P/D:filter n/p:page z:size s:sort ?:help q:quit",
        }
    };

    let updated = match app.last_updated {
        Some(at) => format!("Updated {:.1}s ago", at.elapsed().as_secs_f64()),
        None => "Waiting for data".to_string(),
    };

    let status = format!(" {} | {} | {}", app.source_description(), updated, controls);
    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));

    frame.render_widget(paragraph, area);
}

/// Title suffix describing the local search filter.
pub fn filter_info(app: &App) -> String {
    if app.filter_active {
        format!(" /{}_", app.filter_text)
    } else if !app.filter_text.is_empty() {
        format!(" /{}/ [c:clear]", app.filter_text)
    } else {
        String::new()
    }
}

/// Column header with a sort arrow when it is the active sort column.
pub fn format_header(name: &str, active: bool, ascending: bool) -> Span<'static> {
    if active {
        let arrow = if ascending { "↑" } else { "↓" };
        Span::raw(format!("{}{}", name, arrow))
    } else {
        Span::raw(name.to_string())
    }
}

/// Centered rectangle of at most `width` x `height` inside `area`.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  ←/→ h/l 1-5 Switch views"),
        Line::from("  ↑/↓ j/k     Navigate list"),
        Line::from("  PgUp/PgDn   Jump 10 items"),
        Line::from("  Home/End    Jump to first/last"),
        Line::from("  Enter       District detail / preview"),
        Line::from("  Esc         Go back"),
        Line::from(""),
        section(" Tables"),
        Line::from("  /           Search this page"),
        Line::from("  c           Clear search"),
        Line::from("  s / S / x   Sort column / direction / reset"),
        Line::from("  n / p       Next / previous page"),
        Line::from("  z           Page size"),
        Line::from("  P / D / v   Province / district / risk level"),
        Line::from("  [ / ]       Previous / next date"),
        Line::from("  X           Show all dates (rain)"),
        Line::from(""),
        section(" General"),
        Line::from("  u           Upload file"),
        Line::from("  r           Reload data"),
        Line::from("  e           Export to JSON"),
        Line::from("  L           Log out"),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    // Center the help overlay - responsive to terminal size
    let help_area = centered(area, 50, 31);

    // Clear the area behind the help
    frame.render_widget(ratatui::widgets::Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_hit_testing() {
        let titles = tab_titles();
        assert_eq!(titles[0], " 1:Risk map ");
        assert_eq!(tab_at(0), Some(View::RiskMap));

        let first = titles[0].chars().count() as u16;
        assert_eq!(tab_at(first - 1), Some(View::RiskMap));
        // The divider belongs to no tab
        assert_eq!(tab_at(first), None);
        assert_eq!(tab_at(first + 1), Some(View::Rain));
        assert_eq!(tab_at(500), None);
    }

    #[test]
    fn test_centered_fits_area() {
        let area = Rect::new(0, 0, 40, 20);
        let rect = centered(area, 100, 100);
        assert_eq!(rect.width, 36);
        assert_eq!(rect.height, 18);
        assert_eq!(rect.x, 2);
    }
}
