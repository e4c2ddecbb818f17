// Binary includes library modules - some public API items are only for library consumers
#![allow(unused)]

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    Terminal,
};
use tracing::{info, warn};

mod api;
mod app;
mod config;
mod data;
mod events;
mod export;
mod logging;
mod source;
mod ui;

use api::{ApiClient, ApiError, SessionStore, UploadKind};
use app::{App, AppOptions, Session, View};
use config::{Overrides, Settings};
use data::RiskMap;
use logging::LogTarget;
use source::{DataSource, HttpSource};

#[derive(Parser, Debug)]
#[command(name = "landslide-watch")]
#[command(about = "Terminal dashboard for landslide risk, rainfall and district data")]
struct Args {
    /// Settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL (e.g., http://localhost:8000)
    #[arg(long)]
    api_base: Option<String>,

    /// Rows per page in the table views
    #[arg(long)]
    page_size: Option<u32>,

    /// Reload the current view every N seconds (0 disables)
    #[arg(short, long)]
    refresh: Option<u64>,

    /// Where the session cookie is kept between runs
    #[arg(long)]
    session_file: Option<PathBuf>,

    /// Log file for the interactive dashboard
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Upload a landslide risk area table (.dbf) and exit
    #[arg(long, group = "command")]
    upload_dbf: Option<PathBuf>,

    /// Upload a rain NetCDF file (.nc) and exit
    #[arg(long, group = "command")]
    upload_netcdf: Option<PathBuf>,

    /// Note attached to the NetCDF upload
    #[arg(long, requires = "upload_netcdf")]
    note: Option<String>,

    /// Upload a disaster statistics file (.csv, .xlsx, .xls) and exit
    #[arg(long, group = "command")]
    upload_stats: Option<PathBuf>,

    /// Export the classified risk map to a JSON file and exit
    #[arg(short, long, group = "command")]
    export: Option<PathBuf>,

    /// Date to export (YYYY-MM-DD); defaults to the latest available date
    #[arg(long, requires = "export", value_parser = parse_date)]
    date: Option<NaiveDate>,
}

/// A non-interactive run.
#[derive(Debug)]
enum Command {
    Upload { kind: UploadKind, path: PathBuf },
    Export { path: PathBuf, date: Option<NaiveDate> },
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            api_base: self.api_base.clone(),
            page_size: self.page_size,
            refresh_secs: self.refresh,
            session_file: self.session_file.clone(),
            log_file: self.log_file.clone(),
            note: self.note.clone(),
        }
    }

    fn command(&self) -> Option<Command> {
        let upload = |kind, path: &Option<PathBuf>| {
            path.clone().map(|path| Command::Upload { kind, path })
        };
        upload(UploadKind::RiskAreaDbf, &self.upload_dbf)
            .or_else(|| upload(UploadKind::RainNetCdf, &self.upload_netcdf))
            .or_else(|| upload(UploadKind::DisasterStats, &self.upload_stats))
            .or_else(|| {
                self.export.clone().map(|path| Command::Export {
                    path,
                    date: self.date,
                })
            })
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref(), &args.overrides())?;
    let command = args.command();

    let log_target = if command.is_some() {
        LogTarget::Stderr
    } else {
        LogTarget::File(settings.log_file.clone())
    };
    logging::init(log_target, &settings.log_filter)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let store = SessionStore::new(&settings.session_file);
    let credential = store.load().unwrap_or_else(|e| {
        warn!("Ignoring unreadable session file {}: {}", store.path().display(), e);
        None
    });
    let client = ApiClient::builder()
        .base_url(settings.api_base.clone())
        .timeout(Duration::from_secs(settings.timeout_secs))
        .credential(credential)
        .build()?;

    // Handle non-interactive commands
    if let Some(command) = command {
        return runtime.block_on(run_command(command, client, &store, &settings));
    }

    // The HTTP worker needs the runtime; the TUI runs on this thread
    let _guard = runtime.enter();
    let source = HttpSource::spawn(client, Some(store));
    run_tui(Box::new(source), &settings)
}

/// Make sure `client` carries a valid session, logging in with the
/// configured credentials when the stored one is missing or expired.
async fn ensure_session(
    client: &mut ApiClient,
    store: &SessionStore,
    settings: &Settings,
) -> Result<()> {
    match client.me().await {
        Ok(user) => {
            info!("Using stored session for {}", user.username);
            return Ok(());
        }
        Err(ApiError::Unauthorized(_)) => {}
        Err(e) => return Err(e).context("Session check failed"),
    }

    if !settings.has_credentials() {
        bail!("Not logged in: set username and password (LANDSLIDE_USERNAME, LANDSLIDE_PASSWORD)");
    }
    client.login(&settings.username, &settings.password).await.context("Login failed")?;
    if let Some(credential) = client.credential() {
        if let Err(e) = store.save(credential) {
            warn!("Failed to save session: {}", e);
        }
    }
    Ok(())
}

async fn run_command(
    command: Command,
    mut client: ApiClient,
    store: &SessionStore,
    settings: &Settings,
) -> Result<()> {
    ensure_session(&mut client, store, settings).await?;

    match command {
        Command::Upload { kind, path } => {
            let note = kind.takes_note().then_some(settings.note.as_str());
            let receipt = client
                .upload(kind, &path, note)
                .await
                .with_context(|| format!("Failed to upload {}", path.display()))?;
            println!("{}: {}", kind.success_message(), path.display());
            println!("{}", serde_json::to_string_pretty(&receipt)?);
        }
        Command::Export { path, date } => {
            let limit = client.date_limit().await.context("Failed to load date range")?;
            let Some(date) = date.or(limit.date_end).or(limit.date_start) else {
                bail!("No data to export: the backend has no rain dates yet");
            };

            let mut map = RiskMap::new();
            map.set_limit(limit);
            map.select_date(Some(date));
            map.load(client.list_data_graph(date).await.context("Failed to load risk map")?);

            export::write_json(&path, &export::risk_map_json(&map))?;
            println!(
                "Exported risk map for {} ({} districts) to: {}",
                date,
                map.districts.len(),
                path.display()
            );
        }
    }
    Ok(())
}

/// Run the TUI with the given data source
fn run_tui(source: Box<dyn DataSource>, settings: &Settings) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    // Create app and start the session check
    let mut app = App::new(
        source,
        AppOptions {
            page_size: settings.page_size,
            note: settings.note.clone(),
            username: settings.username.clone(),
        },
    );
    app.sync();

    let refresh_interval = (settings.refresh_secs > 0).then(|| Duration::from_secs(settings.refresh_secs));

    // Run the main loop
    let result = run_app(&mut terminal, &mut app, refresh_interval);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

// Minimum terminal size for usable display
const MIN_WIDTH: u16 = 60;
const MIN_HEIGHT: u16 = 12;

/// Five rows around the vertical middle of `area`, kept inside it.
fn too_small_message_area(area: Rect) -> Rect {
    let y = area.y + (area.height / 2).saturating_sub(2);
    let height = 5.min(area.bottom() - y);
    Rect::new(area.x, y, area.width, height)
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    refresh_interval: Option<Duration>,
) -> Result<()> {
    let mut last_refresh = Instant::now();

    while app.running {
        // Draw UI
        terminal.draw(|frame| {
            let area = frame.area();

            // Check for minimum terminal size
            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                frame.render_widget(paragraph, too_small_message_area(area));
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Length(1), // Tabs
                Constraint::Min(8),    // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            // Render header with user and tier counts
            ui::common::render_header(frame, app, chunks[0]);

            // Render tabs
            ui::common::render_tabs(frame, app, chunks[1]);

            // Render current view
            match app.current_view {
                View::RiskMap => ui::risk_map::render(frame, app, chunks[2]),
                View::Rain => ui::tables::render_rain(frame, app, chunks[2]),
                View::RiskArea => ui::tables::render_risk_areas(frame, app, chunks[2]),
                View::Statistics => ui::statistics::render(frame, app, chunks[2]),
                View::ProvinceDistrict => {
                    ui::tables::render_province_districts(frame, app, chunks[2])
                }
            }

            // Render status bar
            ui::common::render_status_bar(frame, app, chunks[3]);

            // Render detail overlay if active
            if app.show_detail_overlay {
                ui::detail::render_overlay(frame, app, area);
            }

            // Login and upload forms
            if app.prompt.is_some() {
                ui::prompt::render(frame, app, area);
            }

            // Render help overlay if active
            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        // Poll for events with a short timeout
        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => {
                    // Content starts after header (1) + tabs (1)
                    events::handle_mouse_event(app, mouse, 2);
                }
                Event::Resize(_, _) => {
                    // Terminal will redraw on next iteration
                }
                _ => {}
            }
        }

        // Apply replies and issue whatever the state now needs
        app.tick();

        // Auto-refresh data periodically
        if let Some(interval) = refresh_interval {
            if last_refresh.elapsed() >= interval {
                if matches!(app.session, Session::Active(_)) {
                    app.reload();
                }
                last_refresh = Instant::now();
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_commands_are_exclusive() {
        let result = Args::try_parse_from([
            "landslide-watch",
            "--upload-dbf",
            "a.dbf",
            "--upload-stats",
            "b.csv",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_note_requires_netcdf() {
        assert!(Args::try_parse_from(["landslide-watch", "--note", "x"]).is_err());
        let args =
            Args::try_parse_from(["landslide-watch", "--upload-netcdf", "r.nc", "--note", "CHIRPS"])
                .unwrap();
        assert!(matches!(
            args.command(),
            Some(Command::Upload {
                kind: UploadKind::RainNetCdf,
                ..
            })
        ));
        assert_eq!(args.overrides().note.as_deref(), Some("CHIRPS"));
    }

    #[test]
    fn test_export_with_date() {
        let args = Args::try_parse_from([
            "landslide-watch",
            "--export",
            "map.json",
            "--date",
            "2024-08-20",
        ])
        .unwrap();
        match args.command() {
            Some(Command::Export { path, date }) => {
                assert_eq!(path, PathBuf::from("map.json"));
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 8, 20));
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(Args::try_parse_from(["landslide-watch", "--export", "m.json", "--date", "20/08/2024"])
            .is_err());
    }

    #[test]
    fn test_too_small_message_fits_tiny_terminals() {
        for height in 0..MIN_HEIGHT {
            let area = Rect::new(0, 0, 40, height);
            let rect = too_small_message_area(area);
            assert_eq!(rect.intersection(area), rect);
        }
        assert_eq!(
            too_small_message_area(Rect::new(0, 0, 40, 11)),
            Rect::new(0, 3, 40, 5)
        );
    }

    #[test]
    fn test_no_command_runs_dashboard() {
        let args = Args::try_parse_from(["landslide-watch", "--page-size", "20"]).unwrap();
        assert!(args.command().is_none());
        assert_eq!(args.overrides().page_size, Some(20));
    }
}
