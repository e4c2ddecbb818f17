//! Classified districts for one date of the risk map.

use std::cmp::Ordering;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use super::format::bilingual;
use super::listing::Searchable;
use super::risk::{classify, Classification, ColorTier};
use crate::api::{DateLimit, GraphRecord};

/// A district observation together with its derived risk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedDistrict {
    pub record: GraphRecord,
    pub classification: Classification,
}

impl ClassifiedDistrict {
    pub fn new(record: GraphRecord) -> Self {
        let classification = classify(&record.observation);
        Self {
            record,
            classification,
        }
    }

    pub fn district_label(&self) -> String {
        bilingual(
            self.record.district_name.as_deref(),
            self.record.district_name_en.as_deref(),
        )
    }

    pub fn province_label(&self) -> String {
        bilingual(
            self.record.province_name.as_deref(),
            self.record.province_name_en.as_deref(),
        )
    }
}

impl Searchable for ClassifiedDistrict {
    fn search_text(&self) -> String {
        format!("{} {}", self.district_label(), self.province_label())
    }
}

/// Number of districts in each color tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl TierCounts {
    pub fn total(&self) -> usize {
        self.low + self.medium + self.high
    }
}

/// Column the risk map table is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RiskMapSort {
    #[default]
    Probability,
    District,
    Rain,
}

impl RiskMapSort {
    pub fn next(self) -> Self {
        match self {
            RiskMapSort::Probability => RiskMapSort::District,
            RiskMapSort::District => RiskMapSort::Rain,
            RiskMapSort::Rain => RiskMapSort::Probability,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskMapSort::Probability => "Probability",
            RiskMapSort::District => "District",
            RiskMapSort::Rain => "Rain",
        }
    }
}

/// The risk map: selected date, its bounds and the classified districts.
#[derive(Debug, Clone)]
pub struct RiskMap {
    pub date: Option<NaiveDate>,
    /// `None` until the date limits have been fetched.
    pub limit: Option<DateLimit>,
    pub districts: Vec<ClassifiedDistrict>,
    pub sort: RiskMapSort,
    pub sort_ascending: bool,
    pub loading: bool,
    pub dirty: bool,
}

impl Default for RiskMap {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskMap {
    pub fn new() -> Self {
        Self {
            date: None,
            limit: None,
            districts: Vec::new(),
            sort: RiskMapSort::default(),
            sort_ascending: false,
            loading: false,
            dirty: true,
        }
    }

    /// Install the date limits. Without a selected date the latest available
    /// date is chosen; an existing date is clamped into the new range.
    pub fn set_limit(&mut self, limit: DateLimit) {
        self.limit = Some(limit);
        let date = match self.date {
            Some(date) => Some(limit.clamp(date)),
            None => limit.date_end.or(limit.date_start),
        };
        self.select_date(date);
    }

    /// Select a date; marks the map dirty when it changes.
    pub fn select_date(&mut self, date: Option<NaiveDate>) {
        if date != self.date {
            self.date = date;
            self.dirty = true;
        }
    }

    /// Move the selected date by `days`, clamped to the limits. Returns
    /// whether the date changed.
    pub fn shift_date(&mut self, days: i64) -> bool {
        let Some(date) = self.date else {
            return false;
        };
        let shifted = step_date(date, days, self.limit.as_ref());
        let changed = shifted != date;
        self.select_date(Some(shifted));
        changed
    }

    /// Classify and keep the records served for the selected date.
    pub fn load(&mut self, records: Vec<GraphRecord>) {
        self.districts = records.into_iter().map(ClassifiedDistrict::new).collect();
        self.loading = false;
    }

    pub fn fail(&mut self) {
        self.districts.clear();
        self.loading = false;
    }

    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn tier_counts(&self) -> TierCounts {
        self.districts.iter().fold(TierCounts::default(), |mut counts, d| {
            match d.classification.tier {
                ColorTier::Low => counts.low += 1,
                ColorTier::Medium => counts.medium += 1,
                ColorTier::High => counts.high += 1,
            }
            counts
        })
    }

    pub fn cycle_sort(&mut self) {
        self.sort = self.sort.next();
        // Names read best A-Z, numbers highest first.
        self.sort_ascending = self.sort == RiskMapSort::District;
    }

    pub fn toggle_sort_direction(&mut self) {
        self.sort_ascending = !self.sort_ascending;
    }

    /// Districts matching `filter`, in table order.
    pub fn visible(&self, filter: &str) -> Vec<&ClassifiedDistrict> {
        let needle = filter.to_lowercase();
        let mut rows: Vec<&ClassifiedDistrict> = self
            .districts
            .iter()
            .filter(|d| needle.is_empty() || d.search_text().to_lowercase().contains(&needle))
            .collect();
        sort_districts(&mut rows, self.sort, self.sort_ascending);
        rows
    }
}

/// Move `date` by `days`, clamped to `limit` when given. Out-of-range
/// calendar arithmetic leaves the date unchanged.
pub fn step_date(date: NaiveDate, days: i64, limit: Option<&DateLimit>) -> NaiveDate {
    let shifted = if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }
    .unwrap_or(date);
    limit.map_or(shifted, |l| l.clamp(shifted))
}

/// Sort classified districts by `column`.
pub fn sort_districts(rows: &mut [&ClassifiedDistrict], column: RiskMapSort, ascending: bool) {
    rows.sort_by(|a, b| {
        let cmp = match column {
            RiskMapSort::Probability => a
                .classification
                .probability
                .total_cmp(&b.classification.probability),
            RiskMapSort::District => a.district_label().cmp(&b.district_label()),
            RiskMapSort::Rain => {
                let rain =
                    |d: &ClassifiedDistrict| d.record.observation.rain_mm_wmean.unwrap_or(0.0);
                rain(*a).total_cmp(&rain(*b))
            }
        };
        let cmp = if cmp == Ordering::Equal {
            a.district_label().cmp(&b.district_label())
        } else {
            cmp
        };
        if ascending {
            cmp
        } else {
            cmp.reverse()
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::risk::Observation;

    fn record(name: &str, rain: Option<f64>, level: u8, disasters: u32) -> GraphRecord {
        GraphRecord {
            district_id: None,
            district_name: Some(name.to_string()),
            district_name_en: None,
            province_name: Some("น่าน".to_string()),
            province_name_en: Some("Nan".to_string()),
            observation: Observation {
                rain_mm_wmean: rain,
                risk_level: level,
                count_of_disasters: disasters,
            },
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, d).unwrap()
    }

    fn limit() -> DateLimit {
        DateLimit {
            date_start: Some(day(1)),
            date_end: Some(day(20)),
        }
    }

    #[test]
    fn test_limit_selects_latest_date() {
        let mut map = RiskMap::new();
        map.dirty = false;
        map.set_limit(limit());
        assert_eq!(map.date, Some(day(20)));
        assert!(map.dirty);
    }

    #[test]
    fn test_limit_clamps_existing_date() {
        let mut map = RiskMap::new();
        map.date = Some(day(25));
        map.set_limit(limit());
        assert_eq!(map.date, Some(day(20)));

        map.dirty = false;
        map.set_limit(limit());
        assert!(!map.dirty);
    }

    #[test]
    fn test_shift_date_is_clamped() {
        let mut map = RiskMap::new();
        map.set_limit(limit());
        map.dirty = false;

        assert!(!map.shift_date(1));
        assert!(!map.dirty);

        assert!(map.shift_date(-3));
        assert_eq!(map.date, Some(day(17)));
        assert!(map.dirty);

        assert!(map.shift_date(-100));
        assert_eq!(map.date, Some(day(1)));
    }

    #[test]
    fn test_step_date_unbounded() {
        assert_eq!(step_date(day(30), 2, None), NaiveDate::from_ymd_opt(2024, 9, 1).unwrap());
        assert_eq!(step_date(day(3), -1, Some(&limit())), day(2));
    }

    #[test]
    fn test_shift_without_date() {
        let mut map = RiskMap::new();
        assert!(!map.shift_date(1));
    }

    #[test]
    fn test_load_classifies_and_counts() {
        let mut map = RiskMap::new();
        map.loading = true;
        map.load(vec![
            record("A", Some(0.0), 1, 0),
            record("B", Some(150.0), 3, 0),
            record("C", Some(10.0), 1, 2),
            record("D", Some(60.0), 3, 0),
        ]);
        assert!(!map.loading);
        assert_eq!(
            map.tier_counts(),
            TierCounts {
                low: 1,
                medium: 1,
                high: 2
            }
        );
        assert_eq!(map.tier_counts().total(), 4);
    }

    #[test]
    fn test_visible_sorted_by_probability_desc() {
        let mut map = RiskMap::new();
        map.load(vec![
            record("low", Some(0.0), 1, 0),
            record("high", Some(150.0), 3, 0),
            record("mid", Some(0.0), 3, 0),
        ]);
        let names: Vec<String> = map.visible("").iter().map(|d| d.district_label()).collect();
        assert_eq!(names, vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_visible_filter_and_district_sort() {
        let mut map = RiskMap::new();
        map.load(vec![
            record("Pua", Some(1.0), 1, 0),
            record("Mueang Nan", Some(2.0), 1, 0),
            record("Bo Kluea", Some(3.0), 1, 0),
        ]);
        map.cycle_sort();
        assert_eq!(map.sort, RiskMapSort::District);
        assert!(map.sort_ascending);
        let names: Vec<String> = map.visible("").iter().map(|d| d.district_label()).collect();
        assert_eq!(names, vec!["Bo Kluea", "Mueang Nan", "Pua"]);

        assert_eq!(map.visible("pua").len(), 1);
        assert_eq!(map.visible("nan").len(), 3);
    }

    #[test]
    fn test_rain_sort_treats_missing_as_zero() {
        let mut map = RiskMap::new();
        map.load(vec![record("dry", None, 1, 0), record("wet", Some(5.0), 1, 0)]);
        map.cycle_sort();
        map.cycle_sort();
        assert_eq!(map.sort, RiskMapSort::Rain);
        assert!(!map.sort_ascending);
        assert_eq!(map.visible("")[0].district_label(), "wet");
    }
}
