//! Application state and navigation logic.
//!
//! The app never waits on the network. Actions change local state and mark
//! the affected data dirty; [`App::sync`] then submits the requests that
//! bring the views up to date. Each request carries a fresh ticket and only
//! the latest ticket per slot is accepted, so a slow reply for an old query
//! can never overwrite a newer one.

use std::cell::Cell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::api::{
    ApiError, Dataset, ProvinceDistrict, Province, RainPoint, RiskArea, StatRecord, UploadKind,
    User,
};
use crate::data::{filter_rows, step_date, ClassifiedDistrict, Listing, RiskMap};
use crate::export;
use crate::source::{DataSource, Payload, Reply, Request, Ticket};
use crate::ui::Theme;

/// Server-side sort fields of the risk area listing.
pub const RISK_AREA_SORTS: &[&str] = &["province_name", "district_name", "risk_level"];
/// Server-side sort fields of the rain listing.
pub const RAIN_SORTS: &[&str] = &["date", "rain_mm_wmean", "province_name", "district_name"];
/// Server-side sort fields of the province/district listing.
pub const PROVINCE_DISTRICT_SORTS: &[&str] = &["province_id", "province_name", "district_name"];

/// How long a status message stays visible.
const STATUS_TTL: Duration = Duration::from_secs(3);

/// The current view/tab in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    /// Choropleth of classified districts for one date.
    RiskMap,
    /// Rainfall per district and date.
    Rain,
    /// Pre-assigned landslide risk areas.
    RiskArea,
    /// Ingested rain datasets and disaster statistics.
    Statistics,
    /// Province/district reference table.
    ProvinceDistrict,
}

impl View {
    /// Views in tab order.
    pub const ALL: [View; 5] = [
        View::RiskMap,
        View::Rain,
        View::RiskArea,
        View::Statistics,
        View::ProvinceDistrict,
    ];

    pub fn index(self) -> usize {
        View::ALL.iter().position(|v| *v == self).unwrap_or(0)
    }

    /// Cycle to the next view.
    pub fn next(self) -> Self {
        View::ALL[(self.index() + 1) % View::ALL.len()]
    }

    /// Cycle to the previous view.
    pub fn prev(self) -> Self {
        View::ALL[(self.index() + View::ALL.len() - 1) % View::ALL.len()]
    }

    /// Returns the display label for this view.
    pub fn label(&self) -> &'static str {
        match self {
            View::RiskMap => "Risk map",
            View::Rain => "Rain",
            View::RiskArea => "Risk area",
            View::Statistics => "Statistics",
            View::ProvinceDistrict => "Province/District",
        }
    }

    /// File name stem used by the in-app export.
    pub fn slug(&self) -> &'static str {
        match self {
            View::RiskMap => "risk_map",
            View::Rain => "rain",
            View::RiskArea => "risk_area",
            View::Statistics => "statistics",
            View::ProvinceDistrict => "province_district",
        }
    }

    /// Files that can be uploaded from this view, preferred kind first.
    pub fn upload_kinds(&self) -> &'static [UploadKind] {
        match self {
            View::RiskMap | View::ProvinceDistrict => &[],
            View::Rain => &[UploadKind::RainNetCdf],
            View::RiskArea => &[UploadKind::RiskAreaDbf],
            View::Statistics => &[UploadKind::DisasterStats, UploadKind::RainNetCdf],
        }
    }

    /// Whether the view is a server-paginated listing.
    pub fn is_listing(&self) -> bool {
        matches!(self, View::Rain | View::RiskArea | View::ProvinceDistrict)
    }
}

/// Authentication state.
#[derive(Debug, Clone, PartialEq)]
pub enum Session {
    /// Waiting for `/me`.
    Checking,
    Active(User),
    SignedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    Username,
    Password,
}

/// The login form shown whenever the session is missing or expired.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub focus: LoginField,
    pub error: Option<String>,
    pub submitting: bool,
}

impl LoginForm {
    pub fn new(username: String) -> Self {
        let focus = if username.is_empty() {
            LoginField::Username
        } else {
            LoginField::Password
        };
        Self {
            username,
            focus,
            ..Self::default()
        }
    }

    fn field_mut(&mut self) -> &mut String {
        match self.focus {
            LoginField::Username => &mut self.username,
            LoginField::Password => &mut self.password,
        }
    }

    pub fn push(&mut self, c: char) {
        self.field_mut().push(c);
    }

    pub fn pop(&mut self) {
        self.field_mut().pop();
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Username,
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadField {
    #[default]
    Path,
    Note,
}

/// The upload form: file kind, path and (for NetCDF) a note.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadForm {
    pub kinds: Vec<UploadKind>,
    pub kind_index: usize,
    pub path: String,
    pub note: String,
    pub focus: UploadField,
    pub error: Option<String>,
    pub submitting: bool,
}

impl UploadForm {
    pub fn new(kinds: Vec<UploadKind>, note: String) -> Self {
        Self {
            kinds,
            kind_index: 0,
            path: String::new(),
            note,
            focus: UploadField::Path,
            error: None,
            submitting: false,
        }
    }

    pub fn kind(&self) -> Option<UploadKind> {
        self.kinds.get(self.kind_index).copied()
    }

    pub fn cycle_kind(&mut self) {
        if !self.kinds.is_empty() {
            self.kind_index = (self.kind_index + 1) % self.kinds.len();
            self.error = None;
            if !self.kind().is_some_and(|k| k.takes_note()) {
                self.focus = UploadField::Path;
            }
        }
    }

    /// Switch between path and note; the note only exists for NetCDF.
    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            UploadField::Path if self.kind().is_some_and(|k| k.takes_note()) => UploadField::Note,
            _ => UploadField::Path,
        };
    }

    fn field_mut(&mut self) -> &mut String {
        match self.focus {
            UploadField::Path => &mut self.path,
            UploadField::Note => &mut self.note,
        }
    }

    pub fn push(&mut self, c: char) {
        self.field_mut().push(c);
    }

    pub fn pop(&mut self) {
        self.field_mut().pop();
    }
}

/// Modal input forms.
#[derive(Debug, Clone, PartialEq)]
pub enum Prompt {
    Login(LoginForm),
    Upload(UploadForm),
}

/// What a request feeds. Only the latest ticket per slot is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Slot {
    Session,
    Login,
    Logout,
    Provinces,
    Districts(View),
    DateLimit,
    Observations,
    Listing(View),
    Datasets,
    Stats,
    Upload,
}

/// Startup options for [`App`].
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub page_size: u32,
    /// Prefilled note for NetCDF uploads.
    pub note: String,
    /// Prefilled login username.
    pub username: String,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            page_size: 10,
            note: String::new(),
            username: String::new(),
        }
    }
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,
    pub show_detail_overlay: bool,
    pub prompt: Option<Prompt>,

    // Data source
    source: Box<dyn DataSource>,
    next_ticket: Ticket,
    pending: HashMap<Slot, Ticket>,
    pub load_error: Option<String>,
    pub last_updated: Option<Instant>,

    // Session
    pub session: Session,
    username: String,
    note: String,

    // Data
    pub provinces: Vec<Province>,
    provinces_dirty: bool,
    pub risk_map: RiskMap,
    date_limit_dirty: bool,
    pub risk_areas: Listing<RiskArea>,
    pub rain: Listing<RainPoint>,
    pub province_districts: Listing<ProvinceDistrict>,
    pub datasets: Vec<Dataset>,
    pub stats: Vec<StatRecord>,
    statistics_dirty: bool,
    pub statistics_loading: bool,

    // Navigation state
    pub selected_index: usize,
    /// First table row on screen; kept by the renderer as it scrolls.
    pub scroll_offset: Cell<usize>,

    // Search/filter
    pub filter_text: String,
    pub filter_active: bool,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App talking to the given data source.
    ///
    /// Nothing is requested until the first [`App::sync`] (or [`App::tick`]).
    pub fn new(source: Box<dyn DataSource>, options: AppOptions) -> Self {
        let page_size = options.page_size;
        Self {
            running: true,
            current_view: View::RiskMap,
            show_help: false,
            show_detail_overlay: false,
            prompt: None,
            source,
            next_ticket: 0,
            pending: HashMap::new(),
            load_error: None,
            last_updated: None,
            session: Session::Checking,
            username: options.username,
            note: options.note,
            provinces: Vec::new(),
            provinces_dirty: true,
            risk_map: RiskMap::new(),
            date_limit_dirty: true,
            risk_areas: Listing::new("date", RISK_AREA_SORTS, page_size).with_risk_level(),
            rain: Listing::new("date", RAIN_SORTS, page_size),
            province_districts: Listing::new(
                "province_id",
                PROVINCE_DISTRICT_SORTS,
                page_size,
            ),
            datasets: Vec::new(),
            stats: Vec::new(),
            statistics_dirty: true,
            statistics_loading: false,
            selected_index: 0,
            scroll_offset: Cell::new(0),
            filter_text: String::new(),
            filter_active: false,
            theme: Theme::auto_detect(),
            status_message: None,
        }
    }

    /// Returns a description of the current data source.
    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < STATUS_TTL {
                return Some(msg);
            }
        }
        None
    }

    pub fn user(&self) -> Option<&User> {
        match &self.session {
            Session::Active(user) => Some(user),
            _ => None,
        }
    }

    /// Whether a request for the current view is in flight.
    pub fn is_loading(&self) -> bool {
        match self.current_view {
            View::RiskMap => self.risk_map.loading,
            View::Rain => self.rain.loading,
            View::RiskArea => self.risk_areas.loading,
            View::ProvinceDistrict => self.province_districts.loading,
            View::Statistics => self.statistics_loading,
        }
    }

    // ----- request plumbing -----

    fn issue(&mut self, slot: Slot, request: Request) -> Ticket {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        debug!(ticket, ?slot, request = request.name(), "Issuing request");
        self.pending.insert(slot, ticket);
        self.source.submit(ticket, request);
        ticket
    }

    /// Drain available replies, then sync. Called once per frame.
    pub fn tick(&mut self) {
        while let Some(reply) = self.source.poll() {
            self.handle_reply(reply);
        }
        self.load_error = self.source.error().map(str::to_string);
        self.sync();
    }

    /// Submit requests for whatever the session and current view need.
    pub fn sync(&mut self) {
        match self.session {
            Session::Checking => {
                if !self.pending.contains_key(&Slot::Session) {
                    self.issue(Slot::Session, Request::CheckSession);
                }
                return;
            }
            Session::SignedOut => return,
            Session::Active(_) => {}
        }

        if self.provinces_dirty {
            self.provinces_dirty = false;
            self.issue(Slot::Provinces, Request::Provinces);
        }

        match self.current_view {
            View::RiskMap => {
                self.sync_date_limit();
                if let (Some(date), true) = (self.risk_map.date, self.risk_map.dirty) {
                    self.risk_map.dirty = false;
                    self.risk_map.loading = true;
                    self.issue(Slot::Observations, Request::Observations(date));
                }
            }
            View::Rain => {
                self.sync_date_limit();
                self.sync_listing(View::Rain);
            }
            View::RiskArea | View::ProvinceDistrict => self.sync_listing(self.current_view),
            View::Statistics => {
                if self.statistics_dirty {
                    self.statistics_dirty = false;
                    self.statistics_loading = true;
                    self.issue(Slot::Datasets, Request::Datasets);
                    self.issue(Slot::Stats, Request::Stats);
                }
            }
        }
    }

    fn sync_date_limit(&mut self) {
        if self.date_limit_dirty {
            self.date_limit_dirty = false;
            self.issue(Slot::DateLimit, Request::DateLimit);
        }
    }

    fn sync_listing(&mut self, view: View) {
        let (list, districts) = match view {
            View::RiskArea => take_listing_requests(&mut self.risk_areas, Request::RiskAreas),
            View::Rain => take_listing_requests(&mut self.rain, Request::Rain),
            View::ProvinceDistrict => {
                take_listing_requests(&mut self.province_districts, Request::ProvinceDistricts)
            }
            View::RiskMap | View::Statistics => return,
        };
        if let Some(request) = list {
            self.issue(Slot::Listing(view), request);
        }
        if let Some(request) = districts {
            self.issue(Slot::Districts(view), request);
        }
    }

    /// Apply a reply if it answers the latest request of its slot.
    pub fn handle_reply(&mut self, reply: Reply) {
        let slot = self.pending.iter().find(|(_, t)| **t == reply.ticket).map(|(s, _)| *s);
        let Some(slot) = slot else {
            debug!(ticket = reply.ticket, "Dropping stale reply");
            return;
        };
        self.pending.remove(&slot);
        match reply.outcome {
            Ok(payload) => self.apply(slot, payload),
            Err(error) => self.fail(slot, error),
        }
    }

    fn apply(&mut self, slot: Slot, payload: Payload) {
        match payload {
            Payload::Session(user) => {
                if slot == Slot::Login {
                    info!("Login succeeded for {}", user.username);
                    self.username = user.username;
                    self.prompt = None;
                    self.set_status_message("Login success");
                    // Re-run the session check before loading anything.
                    self.session = Session::Checking;
                } else {
                    debug!("Session active for {}", user.username);
                    if matches!(self.prompt, Some(Prompt::Login(_))) {
                        self.prompt = None;
                    }
                    self.session = Session::Active(user);
                    self.invalidate_all();
                }
            }
            Payload::LoggedOut => {
                self.sign_out();
                self.set_status_message("Logged out");
            }
            Payload::Provinces(lookup) => self.provinces = lookup.items,
            Payload::Districts(lookup) => {
                if let Slot::Districts(view) = slot {
                    match view {
                        View::RiskArea => self.risk_areas.set_district_options(lookup.items),
                        View::Rain => self.rain.set_district_options(lookup.items),
                        View::ProvinceDistrict => {
                            self.province_districts.set_district_options(lookup.items)
                        }
                        View::RiskMap | View::Statistics => {}
                    }
                }
            }
            Payload::DateLimit(limit) => self.risk_map.set_limit(limit),
            Payload::Observations(records) => {
                self.risk_map.load(records);
                self.touch();
            }
            Payload::RiskAreas(page) => {
                self.risk_areas.apply(page);
                self.touch();
            }
            Payload::Rain(page) => {
                self.rain.apply(page);
                self.touch();
            }
            Payload::ProvinceDistricts(page) => {
                self.province_districts.apply(page);
                self.touch();
            }
            Payload::Datasets(datasets) => {
                self.datasets = datasets;
                self.statistics_loading = self.pending.contains_key(&Slot::Stats);
                self.touch();
            }
            Payload::Stats(stats) => {
                self.stats = stats;
                self.statistics_loading = self.pending.contains_key(&Slot::Datasets);
                self.touch();
            }
            Payload::Uploaded { kind, .. } => {
                if matches!(self.prompt, Some(Prompt::Upload(_))) {
                    self.prompt = None;
                }
                self.set_status_message(kind.success_message());
                self.after_upload(kind);
            }
        }
    }

    fn fail(&mut self, slot: Slot, error: ApiError) {
        if error.is_unauthorized() && slot != Slot::Login {
            info!("Session expired, showing login");
            self.sign_out();
            return;
        }

        match slot {
            Slot::Session => {
                warn!("Session check failed: {}", error);
                self.sign_out();
                if let Some(Prompt::Login(form)) = &mut self.prompt {
                    form.error = Some(error.to_string());
                }
            }
            Slot::Login => {
                if let Some(Prompt::Login(form)) = &mut self.prompt {
                    form.submitting = false;
                    form.error = Some(login_failure_message(&error));
                }
            }
            Slot::Logout => self.sign_out(),
            Slot::Provinces => self.provinces.clear(),
            Slot::Districts(view) => match view {
                View::RiskArea => self.risk_areas.set_district_options(Vec::new()),
                View::Rain => self.rain.set_district_options(Vec::new()),
                View::ProvinceDistrict => self.province_districts.set_district_options(Vec::new()),
                View::RiskMap | View::Statistics => {}
            },
            Slot::DateLimit => {
                self.set_status_message(format!("Failed to load date range: {}", error));
            }
            Slot::Observations => {
                self.risk_map.fail();
                self.set_status_message(format!("Failed to load risk map: {}", error));
            }
            Slot::Listing(view) => {
                match view {
                    View::RiskArea => self.risk_areas.fail(),
                    View::Rain => self.rain.fail(),
                    View::ProvinceDistrict => self.province_districts.fail(),
                    View::RiskMap | View::Statistics => {}
                }
                self.set_status_message(format!("Failed to load {}: {}", view.label(), error));
            }
            Slot::Datasets | Slot::Stats => {
                if slot == Slot::Datasets {
                    self.datasets.clear();
                } else {
                    self.stats.clear();
                }
                self.statistics_loading =
                    self.pending.contains_key(&Slot::Datasets) || self.pending.contains_key(&Slot::Stats);
                self.set_status_message(format!("Failed to load statistics: {}", error));
            }
            Slot::Upload => {
                warn!("Upload failed: {}", error);
                match &mut self.prompt {
                    Some(Prompt::Upload(form)) => {
                        form.submitting = false;
                        form.error = Some(error.to_string());
                    }
                    _ => self.set_status_message(format!("Upload failed: {}", error)),
                }
            }
        }
        self.clamp_selection();
    }

    fn touch(&mut self) {
        self.last_updated = Some(Instant::now());
        self.clamp_selection();
    }

    /// Drop the session and all loaded data, then show the login form.
    fn sign_out(&mut self) {
        self.session = Session::SignedOut;
        self.pending.clear();
        self.show_detail_overlay = false;
        self.filter_active = false;

        self.risk_map.districts.clear();
        self.risk_map.loading = false;
        self.risk_areas.fail();
        self.rain.fail();
        self.province_districts.fail();
        self.datasets.clear();
        self.stats.clear();
        self.statistics_loading = false;
        self.selected_index = 0;

        let username = match self.prompt.take() {
            Some(Prompt::Login(form)) => form.username,
            _ => self.username.clone(),
        };
        self.prompt = Some(Prompt::Login(LoginForm::new(username)));
    }

    /// Mark every view for re-fetch.
    fn invalidate_all(&mut self) {
        self.provinces_dirty = true;
        self.date_limit_dirty = true;
        self.risk_map.invalidate();
        self.risk_areas.invalidate();
        self.risk_areas.districts_dirty = true;
        self.rain.invalidate();
        self.rain.districts_dirty = true;
        self.province_districts.invalidate();
        self.province_districts.districts_dirty = true;
        self.statistics_dirty = true;
    }

    fn after_upload(&mut self, kind: UploadKind) {
        match kind {
            UploadKind::RiskAreaDbf => self.risk_areas.invalidate(),
            UploadKind::RainNetCdf => {
                // New rain can extend the available dates.
                self.date_limit_dirty = true;
                self.risk_map.invalidate();
                self.rain.invalidate();
                self.statistics_dirty = true;
            }
            UploadKind::DisasterStats => self.statistics_dirty = true,
        }
    }

    /// Re-fetch the current view.
    pub fn reload(&mut self) {
        match self.current_view {
            View::RiskMap => {
                self.date_limit_dirty = true;
                self.risk_map.invalidate();
            }
            View::Rain => self.rain.invalidate(),
            View::RiskArea => self.risk_areas.invalidate(),
            View::ProvinceDistrict => self.province_districts.invalidate(),
            View::Statistics => self.statistics_dirty = true,
        }
    }

    // ----- session -----

    /// Submit the login form.
    pub fn submit_login(&mut self) {
        let request = {
            let Some(Prompt::Login(form)) = &mut self.prompt else {
                return;
            };
            if form.submitting {
                return;
            }
            if form.username.trim().is_empty() || form.password.is_empty() {
                form.error = Some("Please enter username and password".to_string());
                return;
            }
            form.submitting = true;
            form.error = None;
            Request::Login {
                username: form.username.trim().to_string(),
                password: form.password.clone(),
            }
        };
        self.issue(Slot::Login, request);
    }

    pub fn logout(&mut self) {
        if matches!(self.session, Session::Active(_)) {
            self.issue(Slot::Logout, Request::Logout);
        }
    }

    // ----- uploads -----

    /// Open the upload form for the current view.
    pub fn open_upload(&mut self) {
        let kinds = self.current_view.upload_kinds();
        if kinds.is_empty() {
            self.set_status_message(format!("Nothing to upload on {}", self.current_view.label()));
            return;
        }
        self.prompt = Some(Prompt::Upload(UploadForm::new(kinds.to_vec(), self.note.clone())));
    }

    /// Validate and submit the upload form.
    pub fn submit_upload(&mut self) {
        let request = {
            let Some(Prompt::Upload(form)) = &mut self.prompt else {
                return;
            };
            if form.submitting {
                return;
            }
            let Some(kind) = form.kind() else {
                return;
            };
            let path = PathBuf::from(form.path.trim());
            if form.path.trim().is_empty() {
                form.error = Some("Please choose a file".to_string());
                return;
            }
            if !kind.accepts(&path) {
                form.error = Some(format!(
                    "Only .{} files are accepted",
                    kind.extensions().join(", .")
                ));
                return;
            }
            form.submitting = true;
            form.error = None;
            Request::Upload {
                kind,
                path,
                note: kind.takes_note().then(|| form.note.clone()),
            }
        };
        self.issue(Slot::Upload, request);
    }

    /// Close the upload form. The login form cannot be dismissed.
    pub fn cancel_prompt(&mut self) {
        if matches!(self.prompt, Some(Prompt::Upload(_))) {
            self.prompt = None;
        }
    }

    // ----- views and selection -----

    /// Switch to the next view.
    pub fn next_view(&mut self) {
        self.set_view(self.current_view.next());
    }

    /// Switch to the previous view.
    pub fn prev_view(&mut self) {
        self.set_view(self.current_view.prev());
    }

    /// Switch to a specific view.
    pub fn set_view(&mut self, view: View) {
        if view != self.current_view {
            self.current_view = view;
            self.selected_index = 0;
            self.scroll_offset.set(0);
            self.show_detail_overlay = false;
        }
    }

    /// Number of rows the current view shows after the local filter.
    pub fn visible_count(&self) -> usize {
        match self.current_view {
            View::RiskMap => self.risk_map.visible(&self.filter_text).len(),
            View::Rain => filter_rows(&self.rain.rows, &self.filter_text).len(),
            View::RiskArea => filter_rows(&self.risk_areas.rows, &self.filter_text).len(),
            View::ProvinceDistrict => {
                filter_rows(&self.province_districts.rows, &self.filter_text).len()
            }
            View::Statistics => self.visible_stats().len(),
        }
    }

    /// Stat records matching the local filter (by file name).
    pub fn visible_stats(&self) -> Vec<&StatRecord> {
        self.stats.iter().filter(|s| self.matches_filter(&s.filename)).collect()
    }

    /// Datasets matching the local filter (by file name or note).
    pub fn visible_datasets(&self) -> Vec<&Dataset> {
        self.datasets
            .iter()
            .filter(|d| {
                self.matches_filter(&d.filename)
                    || d.note.as_deref().is_some_and(|n| self.matches_filter(n))
            })
            .collect()
    }

    /// The district under the cursor on the risk map.
    pub fn selected_district(&self) -> Option<&ClassifiedDistrict> {
        self.risk_map.visible(&self.filter_text).get(self.selected_index).copied()
    }

    /// The statistics file under the cursor.
    pub fn selected_stat(&self) -> Option<&StatRecord> {
        self.visible_stats().get(self.selected_index).copied()
    }

    fn clamp_selection(&mut self) {
        let max = self.visible_count().saturating_sub(1);
        self.selected_index = self.selected_index.min(max);
    }

    /// Move selection down by one item.
    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    /// Move selection up by one item.
    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    /// Move selection down by n items.
    pub fn select_next_n(&mut self, n: usize) {
        let max = self.visible_count().saturating_sub(1);
        self.selected_index = (self.selected_index + n).min(max);
    }

    /// Move selection up by n items.
    pub fn select_prev_n(&mut self, n: usize) {
        self.selected_index = self.selected_index.saturating_sub(n);
    }

    /// Jump to the first item in the list.
    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    /// Jump to the last item in the list.
    pub fn select_last(&mut self) {
        self.selected_index = self.visible_count().saturating_sub(1);
    }

    /// Select a row by its position on screen, if it exists.
    pub fn select_row(&mut self, row: usize) {
        let index = self.scroll_offset.get() + row;
        if index < self.visible_count() {
            self.selected_index = index;
        }
    }

    /// Open the detail overlay for the selected district or statistics file.
    pub fn enter_detail(&mut self) {
        let has_selection = match self.current_view {
            View::RiskMap => self.selected_district().is_some(),
            View::Statistics => self.selected_stat().is_some(),
            _ => false,
        };
        if has_selection {
            self.show_detail_overlay = true;
        }
    }

    /// Navigate back: close the overlay first, then return to the risk map.
    pub fn go_back(&mut self) {
        if self.show_detail_overlay {
            self.show_detail_overlay = false;
            return;
        }
        self.set_view(View::RiskMap);
    }

    /// Close the detail overlay if open.
    pub fn close_overlay(&mut self) {
        self.show_detail_overlay = false;
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    // ----- sorting, paging, filters -----

    /// Cycle to the next sort column for the current view.
    pub fn cycle_sort(&mut self) {
        match self.current_view {
            View::RiskMap => self.risk_map.cycle_sort(),
            View::Rain => self.rain.cycle_sort(),
            View::RiskArea => self.risk_areas.cycle_sort(),
            View::ProvinceDistrict => self.province_districts.cycle_sort(),
            View::Statistics => return,
        }
        self.selected_index = 0;
    }

    /// Toggle sort direction between ascending and descending.
    pub fn toggle_sort_direction(&mut self) {
        match self.current_view {
            View::RiskMap => self.risk_map.toggle_sort_direction(),
            View::Rain => self.rain.toggle_sort_direction(),
            View::RiskArea => self.risk_areas.toggle_sort_direction(),
            View::ProvinceDistrict => self.province_districts.toggle_sort_direction(),
            View::Statistics => return,
        }
        self.selected_index = 0;
    }

    /// Return to the view's default sort.
    pub fn clear_sort(&mut self) {
        match self.current_view {
            View::RiskMap => {
                self.risk_map.sort = Default::default();
                self.risk_map.sort_ascending = false;
            }
            View::Rain => self.rain.clear_sort(),
            View::RiskArea => self.risk_areas.clear_sort(),
            View::ProvinceDistrict => self.province_districts.clear_sort(),
            View::Statistics => return,
        }
        self.selected_index = 0;
    }

    pub fn next_page(&mut self) {
        let moved = match self.current_view {
            View::Rain => self.rain.next_page(),
            View::RiskArea => self.risk_areas.next_page(),
            View::ProvinceDistrict => self.province_districts.next_page(),
            View::RiskMap | View::Statistics => false,
        };
        if moved {
            self.selected_index = 0;
        }
    }

    pub fn prev_page(&mut self) {
        let moved = match self.current_view {
            View::Rain => self.rain.prev_page(),
            View::RiskArea => self.risk_areas.prev_page(),
            View::ProvinceDistrict => self.province_districts.prev_page(),
            View::RiskMap | View::Statistics => false,
        };
        if moved {
            self.selected_index = 0;
        }
    }

    pub fn cycle_page_size(&mut self) {
        match self.current_view {
            View::Rain => self.rain.cycle_page_size(),
            View::RiskArea => self.risk_areas.cycle_page_size(),
            View::ProvinceDistrict => self.province_districts.cycle_page_size(),
            View::RiskMap | View::Statistics => return,
        }
        self.selected_index = 0;
    }

    pub fn cycle_province(&mut self) {
        let provinces = &self.provinces;
        match self.current_view {
            View::Rain => self.rain.cycle_province(provinces),
            View::RiskArea => self.risk_areas.cycle_province(provinces),
            View::ProvinceDistrict => self.province_districts.cycle_province(provinces),
            View::RiskMap | View::Statistics => return,
        }
        self.selected_index = 0;
    }

    pub fn cycle_district(&mut self) {
        match self.current_view {
            View::Rain => self.rain.cycle_district(),
            View::RiskArea => self.risk_areas.cycle_district(),
            View::ProvinceDistrict => self.province_districts.cycle_district(),
            View::RiskMap | View::Statistics => return,
        }
        self.selected_index = 0;
    }

    pub fn cycle_risk_level(&mut self) {
        if self.current_view == View::RiskArea {
            self.risk_areas.cycle_risk_level();
            self.selected_index = 0;
        }
    }

    /// Step the date on the risk map, or the rain date filter.
    ///
    /// The first step on the rain view starts the filter at the latest date.
    pub fn shift_date(&mut self, days: i64) {
        match self.current_view {
            View::RiskMap => {
                if self.risk_map.shift_date(days) {
                    self.selected_index = 0;
                }
            }
            View::Rain => {
                let limit = self.risk_map.limit;
                let date = match self.rain.query.date_start {
                    Some(current) => Some(step_date(current, days, limit.as_ref())),
                    None => limit.and_then(|l| l.date_end),
                };
                match date {
                    Some(date) => {
                        self.rain.set_date_range(Some(date), Some(date));
                        self.selected_index = 0;
                    }
                    None => self.set_status_message("Date range not loaded yet"),
                }
            }
            _ => {}
        }
    }

    /// Remove the rain date filter.
    pub fn clear_date_filter(&mut self) {
        if self.current_view == View::Rain {
            self.rain.set_date_range(None, None);
        }
    }

    /// The date shown for the current view, if it has one.
    pub fn current_date(&self) -> Option<NaiveDate> {
        match self.current_view {
            View::RiskMap => self.risk_map.date,
            View::Rain => self.rain.query.date_start,
            _ => None,
        }
    }

    /// Enter filter input mode (starts capturing keystrokes for search).
    pub fn start_filter(&mut self) {
        self.filter_active = true;
    }

    /// Exit filter input mode without clearing the filter text.
    pub fn cancel_filter(&mut self) {
        self.filter_active = false;
    }

    /// Clear the filter text and exit filter mode.
    pub fn clear_filter(&mut self) {
        self.filter_text.clear();
        self.filter_active = false;
        self.clamp_selection();
    }

    /// Append a character to the filter text.
    pub fn filter_push(&mut self, c: char) {
        self.filter_text.push(c);
        self.selected_index = 0;
    }

    /// Remove the last character from the filter text.
    pub fn filter_pop(&mut self) {
        self.filter_text.pop();
        self.clamp_selection();
    }

    /// Check if a name matches the current filter.
    pub fn matches_filter(&self, name: &str) -> bool {
        if self.filter_text.is_empty() {
            return true;
        }
        name.to_lowercase().contains(&self.filter_text.to_lowercase())
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Default export file for the current view.
    pub fn export_path(&self) -> PathBuf {
        PathBuf::from(format!("{}_export.json", self.current_view.slug()))
    }

    /// Export the current view to a JSON file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        let value = match self.current_view {
            View::RiskMap => {
                if self.risk_map.date.is_none() {
                    anyhow::bail!("No data to export");
                }
                export::risk_map_json(&self.risk_map)
            }
            View::Rain => export::listing_json(View::Rain.label(), &self.rain),
            View::RiskArea => export::listing_json(View::RiskArea.label(), &self.risk_areas),
            View::ProvinceDistrict => {
                export::listing_json(View::ProvinceDistrict.label(), &self.province_districts)
            }
            View::Statistics => export::statistics_json(&self.datasets, &self.stats),
        };
        export::write_json(path, &value)
    }
}

/// Take the pending list and district requests of a listing.
fn take_listing_requests<T>(
    listing: &mut Listing<T>,
    make: fn(crate::api::ListQuery) -> Request,
) -> (Option<Request>, Option<Request>) {
    let list = if listing.dirty {
        listing.dirty = false;
        listing.loading = true;
        Some(make(listing.query.clone()))
    } else {
        None
    };
    let districts = if listing.districts_dirty {
        listing.districts_dirty = false;
        Some(Request::Districts(listing.query.province_id))
    } else {
        None
    };
    (list, districts)
}

/// The backend's own message when it gave one, otherwise a generic failure.
fn login_failure_message(error: &ApiError) -> String {
    let detail = match error {
        ApiError::Unauthorized(message) | ApiError::Http { message, .. } => message.trim(),
        _ => "",
    };
    if detail.is_empty() {
        "Login failed".to_string()
    } else {
        detail.to_string()
    }
}
