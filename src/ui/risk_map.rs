//! Risk map view rendering.
//!
//! A terminal choropleth: one row per district for the selected date,
//! colored by risk tier with a probability bar.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use super::common::{filter_info, format_header};
use crate::app::App;
use crate::data::format::{format_rain, probability_bar, risk_level_label};
use crate::data::{ColorTier, RiskMapSort};

const BAR_WIDTH: usize = 12;

/// Render the risk map view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::vertical([Constraint::Length(1), Constraint::Min(3)]).split(area);

    render_date_bar(frame, app, chunks[0]);

    let map = &app.risk_map;
    let rows_data = map.visible(&app.filter_text);

    let header = Row::new(vec![
        Cell::from(format_header(
            "District",
            map.sort == RiskMapSort::District,
            map.sort_ascending,
        )),
        Cell::from("Province"),
        Cell::from(format_header("Rain (mm)", map.sort == RiskMapSort::Rain, map.sort_ascending)),
        Cell::from("Risk level"),
        Cell::from("Disasters"),
        Cell::from(format_header(
            "Probability",
            map.sort == RiskMapSort::Probability,
            map.sort_ascending,
        )),
        Cell::from("Tier"),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = rows_data
        .iter()
        .map(|d| {
            let tier_style = app.theme.tier_style(d.classification.tier);
            let obs = &d.record.observation;
            Row::new(vec![
                Cell::from(d.district_label()),
                Cell::from(d.province_label()),
                Cell::from(format_rain(obs.rain_mm_wmean)),
                Cell::from(risk_level_label(obs.risk_level))
                    .style(app.theme.risk_level_style(obs.risk_level)),
                Cell::from(if obs.count_of_disasters > 0 {
                    obs.count_of_disasters.to_string()
                } else {
                    "-".to_string()
                }),
                Cell::from(format!(
                    "{} {:>5.1}",
                    probability_bar(d.classification.probability, BAR_WIDTH),
                    d.classification.probability
                ))
                .style(tier_style),
                Cell::from(d.classification.tier.symbol()).style(tier_style),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(3),
        Constraint::Fill(2),
        Constraint::Length(10),
        Constraint::Length(12),
        Constraint::Length(10),
        Constraint::Length(BAR_WIDTH as u16 + 7),
        Constraint::Length(5),
    ];

    let selected = app.selected_index.min(rows_data.len().saturating_sub(1));

    let position_info = if !rows_data.is_empty() {
        format!(" [{}/{}]", selected + 1, rows_data.len())
    } else {
        String::new()
    };

    let sort_dir = if map.sort_ascending { "↑" } else { "↓" };
    let title = format!(
        " Districts ({}/{}) [s:sort {}{}]{}{} ",
        rows_data.len(),
        map.districts.len(),
        map.sort.label().to_lowercase(),
        sort_dir,
        filter_info(app),
        position_info
    );

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if rows_data.is_empty() {
        let message = if map.loading {
            "  Loading risk map..."
        } else if map.date.is_none() {
            "  No rain data available yet"
        } else {
            "  No districts for this date"
        };
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(message, Style::default().add_modifier(Modifier::DIM))),
        ])
        .block(block);
        frame.render_widget(empty, chunks[1]);
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
    frame.render_stateful_widget(table, chunks[1], &mut state);
    app.scroll_offset.set(state.offset());
}

/// Selected date, its bounds and the tier legend.
fn render_date_bar(frame: &mut Frame, app: &App, area: Rect) {
    let map = &app.risk_map;
    let date = map
        .date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string());

    let mut spans = vec![
        Span::raw(" Date: "),
        Span::styled(date, Style::default().add_modifier(Modifier::BOLD)),
    ];

    if let Some(limit) = map.limit {
        let bound = |d: Option<chrono::NaiveDate>| {
            d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_else(|| "?".to_string())
        };
        spans.push(Span::styled(
            format!("  ({} .. {})", bound(limit.date_start), bound(limit.date_end)),
            Style::default().add_modifier(Modifier::DIM),
        ));
    }

    spans.push(Span::raw("   "));
    for tier in [ColorTier::High, ColorTier::Medium, ColorTier::Low] {
        spans.push(Span::styled("■ ", app.theme.tier_style(tier)));
        spans.push(Span::raw(format!("{}  ", tier.label())));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
    use ratatui::{backend::TestBackend, Terminal};

    use super::*;
    use crate::api::GraphRecord;
    use crate::app::AppOptions;
    use crate::data::Observation;
    use crate::events::handle_mouse_event;
    use crate::source::ChannelSource;

    fn record(id: i64) -> GraphRecord {
        GraphRecord {
            district_id: Some(id),
            district_name: Some(format!("district {}", id)),
            district_name_en: None,
            province_name: None,
            province_name_en: None,
            observation: Observation {
                rain_mm_wmean: Some(id as f64),
                risk_level: 1,
                count_of_disasters: 0,
            },
        }
    }

    #[test]
    fn test_click_after_scrolling_selects_row_on_screen() {
        let (_backend, source) = ChannelSource::create("test");
        let mut app = App::new(Box::new(source), AppOptions::default());
        app.risk_map.load((0..30).map(record).collect());
        app.select_last();

        // Date bar, table borders and header leave 8 rows for districts
        let mut terminal = Terminal::new(TestBackend::new(80, 12)).unwrap();
        terminal.draw(|frame| render(frame, &app, frame.area())).unwrap();
        assert_eq!(app.scroll_offset.get(), 22);

        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 10,
            row: 3,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse_event(&mut app, click, 0);
        assert_eq!(app.selected_index, 22);

        // Moving back above the window scrolls up on the next frame
        app.select_first();
        terminal.draw(|frame| render(frame, &app, frame.area())).unwrap();
        assert_eq!(app.scroll_offset.get(), 0);
    }
}
