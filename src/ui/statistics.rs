//! Statistics view rendering.
//!
//! Lists uploaded disaster statistics files (selectable, with a preview in
//! the detail overlay) above the ingested rain datasets.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use super::common::filter_info;
use crate::app::App;
use crate::data::format::{format_bytes, format_thousands};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Percentage(50),
        Constraint::Min(4),
    ])
    .split(area);

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let summary = Line::from(vec![
        Span::raw(" Statistics files: "),
        Span::styled(app.stats.len().to_string(), bold),
        Span::raw("   Rain datasets: "),
        Span::styled(app.datasets.len().to_string(), bold),
    ]);
    frame.render_widget(Paragraph::new(summary), chunks[0]);

    render_stats(frame, app, chunks[1]);
    render_datasets(frame, app, chunks[2]);
}

fn render_stats(frame: &mut Frame, app: &App, area: Rect) {
    let stats = app.visible_stats();

    let header = Row::new(vec!["File", "Size", "Rows", "Cols", "Uploaded"])
        .height(1)
        .style(app.theme.header);

    let rows: Vec<Row> = stats
        .iter()
        .map(|s| {
            Row::new(vec![
                Cell::from(s.filename.clone()),
                Cell::from(s.size_bytes.map(format_bytes).unwrap_or_else(|| "-".into())),
                Cell::from(s.rows.map(format_thousands).unwrap_or_else(|| "-".into())),
                Cell::from(s.cols.map(format_thousands).unwrap_or_else(|| "-".into())),
                Cell::from(s.created_at.clone().unwrap_or_else(|| "-".into())),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(3),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(6),
        Constraint::Length(20),
    ];

    let selected = app.selected_index.min(stats.len().saturating_sub(1));
    let title = format!(
        " Disaster statistics ({}/{}){} [Enter:preview] ",
        stats.len(),
        app.stats.len(),
        filter_info(app)
    );

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if stats.is_empty() {
        render_empty(frame, block, app.statistics_loading, "No statistics uploaded", area);
        return;
    }

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default()
        .with_offset(app.scroll_offset.get())
        .with_selected(Some(selected));
    frame.render_stateful_widget(table, area, &mut state);
    app.scroll_offset.set(state.offset());
}

fn render_datasets(frame: &mut Frame, app: &App, area: Rect) {
    let datasets = app.visible_datasets();

    let header = Row::new(vec!["File", "Size", "Coverage", "Note", "Uploaded"])
        .height(1)
        .style(app.theme.header);

    let rows: Vec<Row> = datasets
        .iter()
        .map(|d| {
            let coverage = match (&d.time_coverage_start, &d.time_coverage_end) {
                (Some(start), Some(end)) => format!("{} .. {}", start, end),
                (Some(start), None) => format!("{} ..", start),
                (None, Some(end)) => format!(".. {}", end),
                (None, None) => "-".to_string(),
            };
            Row::new(vec![
                Cell::from(d.filename.clone()),
                Cell::from(d.size_bytes.map(format_bytes).unwrap_or_else(|| "-".into())),
                Cell::from(coverage),
                Cell::from(d.note.clone().unwrap_or_default()),
                Cell::from(d.created_at.clone().unwrap_or_else(|| "-".into())),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(2),
        Constraint::Length(10),
        Constraint::Length(26),
        Constraint::Fill(2),
        Constraint::Length(20),
    ];

    let block = Block::default()
        .title(format!(" Rain datasets ({}) ", datasets.len()))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if datasets.is_empty() {
        render_empty(frame, block, app.statistics_loading, "No NetCDF uploaded", area);
        return;
    }

    frame.render_widget(Table::new(rows, widths).header(header).block(block), area);
}

fn render_empty(frame: &mut Frame, block: Block, loading: bool, message: &str, area: Rect) {
    let text = if loading { "Loading..." } else { message };
    let empty = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  {}", text),
            Style::default().add_modifier(Modifier::DIM),
        )),
    ])
    .block(block);
    frame.render_widget(empty, area);
}
