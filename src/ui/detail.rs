//! Detail overlay rendering.
//!
//! On the risk map this is the district tooltip: names, rain, risk level,
//! disaster history and the derived probability. On the statistics view it
//! previews the first rows of the selected file.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};

use crate::api::StatRecord;
use crate::app::{App, View};
use crate::data::format::{format_bytes, format_rain, format_thousands, probability_bar, risk_level_label};
use crate::data::risk::{DISASTER_FLOOR, HIGH_THRESHOLD, MEDIUM_THRESHOLD};
use crate::data::ClassifiedDistrict;

/// Minimum width required for the detail overlay to render properly.
const MIN_OVERLAY_WIDTH: u16 = 50;
/// Minimum height required for the detail overlay to render properly.
const MIN_OVERLAY_HEIGHT: u16 = 16;
/// Preview columns shown before the rest are elided.
const MAX_PREVIEW_COLUMNS: usize = 8;

/// Render the detail of the selected row as a modal overlay.
pub fn render_overlay(frame: &mut Frame, app: &App, area: Rect) {
    // Skip rendering if terminal is too small for the overlay
    if area.width < MIN_OVERLAY_WIDTH || area.height < MIN_OVERLAY_HEIGHT {
        return;
    }

    match app.current_view {
        View::RiskMap => {
            if let Some(district) = app.selected_district() {
                let overlay_area = overlay_rect(area, 70, 18);
                frame.render_widget(Clear, overlay_area);
                render_district(frame, app, district, overlay_area);
            }
        }
        View::Statistics => {
            if let Some(stat) = app.selected_stat() {
                let overlay_area = overlay_rect(area, 140, 50);
                frame.render_widget(Clear, overlay_area);
                render_preview(frame, app, stat, overlay_area);
            }
        }
        _ => {}
    }
}

/// Overlay size: 95% x 90% of the screen, clamped to the minimum and `max`.
fn overlay_rect(area: Rect, max_width: u16, max_height: u16) -> Rect {
    let width = (area.width * 95 / 100).clamp(MIN_OVERLAY_WIDTH, max_width.max(MIN_OVERLAY_WIDTH));
    let height =
        (area.height * 90 / 100).clamp(MIN_OVERLAY_HEIGHT, max_height.max(MIN_OVERLAY_HEIGHT));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn render_district(frame: &mut Frame, app: &App, district: &ClassifiedDistrict, area: Rect) {
    let obs = &district.record.observation;
    let class = &district.classification;
    let tier_style = app.theme.tier_style(class.tier);
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let field = |name: &'static str, value: Span<'static>| {
        Line::from(vec![Span::styled(format!("  {:<20}", name), dim), value])
    };

    let bar_width = (area.width as usize).saturating_sub(36).clamp(10, 40);

    let lines = vec![
        Line::from(vec![Span::styled(format!(" {} ", district.district_label()), bold)]),
        Line::from(Span::styled(format!(" {}", district.province_label()), dim)),
        Line::from(""),
        field("Date", Span::raw(
            app.risk_map.date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
        )),
        field("Rain (mm)", Span::raw(format_rain(obs.rain_mm_wmean))),
        field(
            "Risk level",
            Span::styled(
                format!("{} ({})", risk_level_label(obs.risk_level), obs.risk_level),
                app.theme.risk_level_style(obs.risk_level),
            ),
        ),
        field("Recorded disasters", Span::raw(format_thousands(u64::from(obs.count_of_disasters)))),
        Line::from(""),
        field(
            "Probability",
            Span::styled(
                format!("{} {:.1}%", probability_bar(class.probability, bar_width), class.probability),
                tier_style,
            ),
        ),
        field(
            "Tier",
            Span::styled(class.tier.label(), tier_style.add_modifier(Modifier::BOLD)),
        ),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                "  Medium from {:.0}, high from {:.0}. Any recorded disaster scores at least {:.0}.",
                MEDIUM_THRESHOLD, HIGH_THRESHOLD, DISASTER_FLOOR
            ),
            dim,
        )),
    ];

    let chunks = Layout::vertical([Constraint::Min(5), Constraint::Length(1)]).split(area);

    let block = Block::default()
        .title(" District Detail ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));
    frame.render_widget(Paragraph::new(lines).block(block), chunks[0]);

    render_footer(frame, chunks[1]);
}

fn render_preview(frame: &mut Frame, app: &App, stat: &StatRecord, area: Rect) {
    let chunks = Layout::vertical([
        Constraint::Length(4), // File info
        Constraint::Min(5),    // Preview table
        Constraint::Length(1), // Footer
    ])
    .split(area);

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let info = vec![
        Line::from(vec![Span::styled(format!(" {} ", stat.filename), bold)]),
        Line::from(format!(
            " {} · {} rows · {} columns · {}",
            stat.size_bytes.map(format_bytes).unwrap_or_else(|| "-".into()),
            stat.rows.map(format_thousands).unwrap_or_else(|| "-".into()),
            stat.cols.map(format_thousands).unwrap_or_else(|| "-".into()),
            stat.content_type.as_deref().unwrap_or("-"),
        )),
    ];
    let info_block = Block::default()
        .title(" Statistics Preview ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));
    frame.render_widget(Paragraph::new(info).block(info_block), chunks[0]);

    let preview = stat.preview.as_deref().unwrap_or_default();
    let table_block = Block::default()
        .title(format!(" First {} rows ", preview.len()))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    let columns = preview_columns(preview);
    if columns.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "  No preview available",
                Style::default().add_modifier(Modifier::DIM),
            )),
        ])
        .block(table_block);
        frame.render_widget(empty, chunks[1]);
    } else {
        let header = Row::new(columns.iter().map(|c| Cell::from(c.clone())))
            .height(1)
            .style(app.theme.header);
        let rows: Vec<Row> = preview
            .iter()
            .map(|record| {
                Row::new(columns.iter().map(|c| {
                    Cell::from(record.get(c).map(cell_text).unwrap_or_default())
                }))
            })
            .collect();
        let widths = vec![Constraint::Fill(1); columns.len()];
        frame.render_widget(Table::new(rows, widths).header(header).block(table_block), chunks[1]);
    }

    render_footer(frame, chunks[2]);
}

/// Column names in order of appearance, capped at [`MAX_PREVIEW_COLUMNS`].
fn preview_columns(preview: &[serde_json::Map<String, serde_json::Value>]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in preview {
        for key in record.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    columns.truncate(MAX_PREVIEW_COLUMNS);
    columns
}

fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let footer = Paragraph::new(Line::from(vec![Span::styled(
        " Press Esc to close ",
        Style::default().add_modifier(Modifier::DIM),
    )]));
    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_preview_columns_first_seen_order() {
        let rows: Vec<serde_json::Map<String, serde_json::Value>> = vec![
            json!({ "province": "Nan", "events": 3 }).as_object().unwrap().clone(),
            json!({ "province": "Phrae", "deaths": 1 }).as_object().unwrap().clone(),
        ];
        let columns = preview_columns(&rows);
        assert_eq!(columns.len(), 3);
        assert!(columns.contains(&"deaths".to_string()));
        assert_eq!(cell_text(&json!(null)), "");
        assert_eq!(cell_text(&json!("x")), "x");
        assert_eq!(cell_text(&json!(2.5)), "2.5");
    }

    #[test]
    fn test_overlay_rect_clamped() {
        let rect = overlay_rect(Rect::new(0, 0, 200, 60), 70, 18);
        assert_eq!(rect.width, 70);
        assert_eq!(rect.height, 18);
        assert_eq!(rect.x, 65);
    }
}
