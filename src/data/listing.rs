//! State of a paginated, server-sorted listing view.

use chrono::NaiveDate;

use super::format::bilingual;
use super::pagination::{next_page_size, Pagination};
use crate::api::{
    District, IdFilter, ListQuery, Page, Province, ProvinceDistrict, RainPoint, RiskArea, SortOrder,
};

/// Risk levels offered by the risk level filter.
pub const RISK_LEVELS: [i64; 3] = [1, 2, 3];

/// Text a row is matched against by the local `/` search.
pub trait Searchable {
    fn search_text(&self) -> String;
}

impl Searchable for RiskArea {
    fn search_text(&self) -> String {
        format!(
            "{} {}",
            bilingual(self.province_name.as_deref(), self.province_name_en.as_deref()),
            bilingual(self.district_name.as_deref(), self.district_name_en.as_deref())
        )
    }
}

impl Searchable for RainPoint {
    fn search_text(&self) -> String {
        format!(
            "{} {} {}",
            self.date.map(|d| d.to_string()).unwrap_or_default(),
            bilingual(self.province_name.as_deref(), self.province_name_en.as_deref()),
            bilingual(self.district_name.as_deref(), self.district_name_en.as_deref())
        )
    }
}

impl Searchable for ProvinceDistrict {
    fn search_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.province_id,
            self.district_id,
            bilingual(self.province_name.as_deref(), self.province_name_en.as_deref()),
            bilingual(self.district_name.as_deref(), self.district_name_en.as_deref())
        )
    }
}

/// Rows whose search text contains `filter` (case-insensitive), with their
/// index on the page.
pub fn filter_rows<'a, T: Searchable>(rows: &'a [T], filter: &str) -> Vec<(usize, &'a T)> {
    if filter.is_empty() {
        return rows.iter().enumerate().collect();
    }
    let needle = filter.to_lowercase();
    rows.iter()
        .enumerate()
        .filter(|(_, row)| row.search_text().to_lowercase().contains(&needle))
        .collect()
}

/// Query, pagination and rows of one listing view.
///
/// Every mutation of the query marks the listing dirty. The app issues the
/// request on its next sync and clears the flag.
#[derive(Debug, Clone)]
pub struct Listing<T> {
    pub query: ListQuery,
    pub pagination: Pagination,
    pub rows: Vec<T>,
    pub loading: bool,
    pub dirty: bool,
    /// District choices for the selected province.
    pub district_options: Vec<District>,
    pub districts_dirty: bool,
    default_order_by: &'static str,
    sortable: &'static [&'static str],
}

impl<T> Listing<T> {
    pub fn new(default_order_by: &'static str, sortable: &'static [&'static str], page_size: u32) -> Self {
        let pagination = Pagination::new(page_size);
        Self {
            query: ListQuery::new(default_order_by, pagination.page_size),
            pagination,
            rows: Vec::new(),
            loading: false,
            dirty: true,
            district_options: Vec::new(),
            districts_dirty: true,
            default_order_by,
            sortable,
        }
    }

    /// Enable the risk level filter.
    pub fn with_risk_level(mut self) -> Self {
        self.query = self.query.with_risk_level();
        self
    }

    /// Whether the listing is sorted by its default field, ascending.
    pub fn is_default_sort(&self) -> bool {
        self.query.order_by == self.default_order_by && self.query.order_type == SortOrder::Asc
    }

    pub fn sortable(&self) -> &'static [&'static str] {
        self.sortable
    }

    /// Mark for re-fetch without changing the query.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    fn first_page(&mut self) {
        self.query.page = 1;
        self.dirty = true;
    }

    pub fn next_page(&mut self) -> bool {
        if !self.pagination.has_next() {
            return false;
        }
        self.query.page = self.pagination.page + 1;
        self.dirty = true;
        true
    }

    pub fn prev_page(&mut self) -> bool {
        if !self.pagination.has_prev() {
            return false;
        }
        self.query.page = self.pagination.page - 1;
        self.dirty = true;
        true
    }

    pub fn cycle_page_size(&mut self) {
        self.query.page_size = next_page_size(self.query.page_size);
        self.first_page();
    }

    /// Sort ascending by the next sortable field.
    pub fn cycle_sort(&mut self) {
        let next = match self.sortable.iter().position(|f| *f == self.query.order_by) {
            Some(i) => self.sortable[(i + 1) % self.sortable.len()],
            None => match self.sortable.first() {
                Some(first) => first,
                None => return,
            },
        };
        self.query.order_by = next.to_string();
        self.query.order_type = SortOrder::Asc;
        self.first_page();
    }

    pub fn toggle_sort_direction(&mut self) {
        self.query.order_type = self.query.order_type.toggled();
        self.first_page();
    }

    /// Back to the default field, ascending.
    pub fn clear_sort(&mut self) {
        self.query.order_by = self.default_order_by.to_string();
        self.query.order_type = SortOrder::Asc;
        self.first_page();
    }

    /// Choosing a specific province resets the district filter.
    pub fn set_province(&mut self, province: IdFilter) {
        if province == self.query.province_id {
            return;
        }
        self.query.province_id = province;
        if !province.is_all() {
            self.query.district_id = IdFilter::All;
        }
        self.districts_dirty = true;
        self.first_page();
    }

    pub fn set_district(&mut self, district: IdFilter) {
        if district == self.query.district_id {
            return;
        }
        self.query.district_id = district;
        self.first_page();
    }

    /// No-op for listings without a risk level filter.
    pub fn set_risk_level(&mut self, level: IdFilter) {
        if self.query.risk_level.is_none() || self.query.risk_level == Some(level) {
            return;
        }
        self.query.risk_level = Some(level);
        self.first_page();
    }

    /// Step the province filter through `all` and each province.
    pub fn cycle_province(&mut self, provinces: &[Province]) {
        let ids: Vec<i64> = provinces.iter().map(|p| p.province_id).collect();
        self.set_province(cycle_filter(self.query.province_id, &ids));
    }

    pub fn cycle_district(&mut self) {
        let ids: Vec<i64> = self.district_options.iter().map(|d| d.district_id).collect();
        self.set_district(cycle_filter(self.query.district_id, &ids));
    }

    pub fn cycle_risk_level(&mut self) {
        if let Some(current) = self.query.risk_level {
            self.set_risk_level(cycle_filter(current, &RISK_LEVELS));
        }
    }

    /// Restrict to a date range; `None` on both ends removes the restriction.
    pub fn set_date_range(&mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) {
        if self.query.date_start == start && self.query.date_end == end {
            return;
        }
        self.query.date_start = start;
        self.query.date_end = end;
        self.first_page();
    }

    /// Take a served page. The query follows the page the server actually
    /// returned so a clamped page number does not trigger another fetch.
    pub fn apply(&mut self, page: Page<T>) {
        self.pagination = Pagination::from_page(&page);
        self.query.page = self.pagination.page;
        self.rows = page.items;
        self.loading = false;
    }

    /// A failed fetch leaves the view empty.
    pub fn fail(&mut self) {
        self.rows.clear();
        self.pagination = Pagination::new(self.query.page_size);
        self.loading = false;
    }

    pub fn set_district_options(&mut self, districts: Vec<District>) {
        self.district_options = districts;
    }

    /// Label of the selected province, given the loaded provinces.
    pub fn province_label(&self, provinces: &[Province]) -> String {
        match self.query.province_id {
            IdFilter::All => "All".to_string(),
            IdFilter::Id(id) => provinces
                .iter()
                .find(|p| p.province_id == id)
                .map(|p| bilingual(Some(&p.province_name), Some(&p.province_name_en)))
                .unwrap_or_else(|| id.to_string()),
        }
    }

    pub fn district_label(&self) -> String {
        match self.query.district_id {
            IdFilter::All => "All".to_string(),
            IdFilter::Id(id) => self
                .district_options
                .iter()
                .find(|d| d.district_id == id)
                .map(|d| bilingual(Some(&d.district_name), Some(&d.district_name_en)))
                .unwrap_or_else(|| id.to_string()),
        }
    }
}

/// `all` -> first -> ... -> last -> `all`. An id no longer offered restarts
/// the cycle at `all`.
fn cycle_filter(current: IdFilter, ids: &[i64]) -> IdFilter {
    match current {
        IdFilter::All => ids.first().map_or(IdFilter::All, |id| IdFilter::Id(*id)),
        IdFilter::Id(id) => match ids.iter().position(|i| *i == id) {
            Some(pos) if pos + 1 < ids.len() => IdFilter::Id(ids[pos + 1]),
            _ => IdFilter::All,
        },
    }
}
