//! Server-paginated table views: rain, risk areas and province/district.
//!
//! All three share one layout: a filter bar, the table for the current page
//! and a pagination footer.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use super::common::{filter_info, format_header};
use crate::api::{IdFilter, ProvinceDistrict, RainPoint, RiskArea, SortOrder};
use crate::app::App;
use crate::data::format::{bilingual, format_rain, format_thousands, risk_level_label};
use crate::data::{filter_rows, Listing, Searchable};

/// A table column and the server sort field it maps to, if sortable.
struct Column {
    title: &'static str,
    sort_field: Option<&'static str>,
    width: Constraint,
}

const fn column(title: &'static str, sort_field: Option<&'static str>, width: Constraint) -> Column {
    Column {
        title,
        sort_field,
        width,
    }
}

const RISK_AREA_COLUMNS: [Column; 4] = [
    column("Province", Some("province_name"), Constraint::Fill(2)),
    column("District", Some("district_name"), Constraint::Fill(2)),
    column("Risk level", Some("risk_level"), Constraint::Length(12)),
    column("Level", None, Constraint::Length(6)),
];

const RAIN_COLUMNS: [Column; 4] = [
    column("Date", Some("date"), Constraint::Length(12)),
    column("Province", Some("province_name"), Constraint::Fill(2)),
    column("District", Some("district_name"), Constraint::Fill(2)),
    column("Rain (mm)", Some("rain_mm_wmean"), Constraint::Length(11)),
];

const PROVINCE_DISTRICT_COLUMNS: [Column; 4] = [
    column("Province ID", Some("province_id"), Constraint::Length(12)),
    column("Province", Some("province_name"), Constraint::Fill(2)),
    column("District ID", None, Constraint::Length(12)),
    column("District", Some("district_name"), Constraint::Fill(2)),
];

pub fn render_risk_areas(frame: &mut Frame, app: &App, area: Rect) {
    render_listing(
        frame,
        app,
        area,
        "Risk areas",
        &app.risk_areas,
        &RISK_AREA_COLUMNS,
        |row: &RiskArea| {
            let style = app.theme.risk_level_style(row.risk_level);
            vec![
                Cell::from(bilingual(row.province_name.as_deref(), row.province_name_en.as_deref())),
                Cell::from(bilingual(row.district_name.as_deref(), row.district_name_en.as_deref())),
                Cell::from(risk_level_label(row.risk_level)).style(style),
                Cell::from(row.risk_level.to_string()).style(style),
            ]
        },
    );
}

pub fn render_rain(frame: &mut Frame, app: &App, area: Rect) {
    render_listing(frame, app, area, "Rain", &app.rain, &RAIN_COLUMNS, |row: &RainPoint| {
        vec![
            Cell::from(row.date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()),
            Cell::from(bilingual(row.province_name.as_deref(), row.province_name_en.as_deref())),
            Cell::from(bilingual(row.district_name.as_deref(), row.district_name_en.as_deref())),
            Cell::from(format_rain(row.rain_mm_wmean)),
        ]
    });
}

pub fn render_province_districts(frame: &mut Frame, app: &App, area: Rect) {
    render_listing(
        frame,
        app,
        area,
        "Provinces and districts",
        &app.province_districts,
        &PROVINCE_DISTRICT_COLUMNS,
        |row: &ProvinceDistrict| {
            vec![
                Cell::from(row.province_id.to_string()),
                Cell::from(bilingual(row.province_name.as_deref(), row.province_name_en.as_deref())),
                Cell::from(row.district_id.to_string()),
                Cell::from(bilingual(row.district_name.as_deref(), row.district_name_en.as_deref())),
            ]
        },
    );
}

fn render_listing<T: Searchable>(
    frame: &mut Frame,
    app: &App,
    area: Rect,
    name: &str,
    listing: &Listing<T>,
    columns: &[Column],
    cells: impl Fn(&T) -> Vec<Cell<'static>>,
) {
    let chunks = Layout::vertical([
        Constraint::Length(1), // Filter bar
        Constraint::Min(3),    // Table
        Constraint::Length(1), // Pagination
    ])
    .split(area);

    render_filter_bar(frame, app, listing, chunks[0]);

    let query = &listing.query;
    let ascending = query.order_type == SortOrder::Asc;
    let visible = filter_rows(&listing.rows, &app.filter_text);

    let mut header_cells = vec![Cell::from("#")];
    header_cells.extend(columns.iter().map(|c| {
        let active = c.sort_field == Some(query.order_by.as_str());
        Cell::from(format_header(c.title, active, ascending))
    }));
    let header = Row::new(header_cells).height(1).style(app.theme.header);

    let rows: Vec<Row> = visible
        .iter()
        .map(|(index, row)| {
            let mut row_cells =
                vec![Cell::from(format_thousands(listing.pagination.row_number(*index)))];
            row_cells.extend(cells(*row));
            Row::new(row_cells)
        })
        .collect();

    let mut widths = vec![Constraint::Length(8)];
    widths.extend(columns.iter().map(|c| c.width));

    let selected = app.selected_index.min(visible.len().saturating_sub(1));

    let sort_info = if listing.is_default_sort() {
        String::new()
    } else {
        format!(" [s:sort {}{}]", query.order_by, query.order_type.arrow())
    };

    let title = format!(
        " {} · Total {} items{}{} ",
        name,
        format_thousands(listing.pagination.total),
        sort_info,
        filter_info(app),
    );

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if visible.is_empty() {
        let message = if listing.loading {
            "  Loading..."
        } else if listing.rows.is_empty() {
            "  No data"
        } else {
            "  No rows on this page match the search"
        };
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(message, Style::default().add_modifier(Modifier::DIM))),
        ])
        .block(block);
        frame.render_widget(empty, chunks[1]);
    } else {
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

    render_pagination(frame, app, listing, chunks[2]);
}

/// Active server-side filters of a listing.
fn render_filter_bar<T>(frame: &mut Frame, app: &App, listing: &Listing<T>, area: Rect) {
    let query = &listing.query;
    let label = |text: &'static str| Span::styled(text, Style::default().add_modifier(Modifier::DIM));
    let value = |text: String| Span::styled(text, Style::default().add_modifier(Modifier::BOLD));

    let mut spans = vec![
        label(" Province [P]: "),
        value(listing.province_label(&app.provinces)),
        label("  District [D]: "),
        value(listing.district_label()),
    ];

    if let Some(level) = query.risk_level {
        let text = match level {
            IdFilter::All => "All".to_string(),
            IdFilter::Id(id) => risk_level_label(u8::try_from(id).unwrap_or(u8::MAX)).to_string(),
        };
        spans.push(label("  Risk level [v]: "));
        spans.push(value(text));
    }

    if let (Some(start), Some(end)) = (query.date_start, query.date_end) {
        let text = if start == end {
            start.format("%Y-%m-%d").to_string()
        } else {
            format!("{} .. {}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d"))
        };
        spans.push(label("  Date [ ]: "));
        spans.push(value(text));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_pagination<T>(frame: &mut Frame, app: &App, listing: &Listing<T>, area: Rect) {
    let p = &listing.pagination;
    let nav_style = |enabled: bool| {
        if enabled {
            Style::default().fg(app.theme.highlight)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        }
    };

    let line = Line::from(vec![
        Span::styled(" ◀ p ", nav_style(p.has_prev())),
        Span::raw(format!(
            "Page {} of {} ",
            format_thousands(u64::from(p.page)),
            format_thousands(u64::from(p.page_count))
        )),
        Span::styled("n ▶", nav_style(p.has_next())),
        Span::styled(
            format!("   {} per page [z]", listing.query.page_size),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}
