//! Wire types for the backend API.
//!
//! The backend owns and validates these schemas; fields that can come back
//! null from outer joins are optional here.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::risk::Observation;

/// The authenticated user returned by `/me` and `/auth/login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl User {
    /// Name shown in the header bar.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().filter(|n| !n.is_empty()).unwrap_or(&self.username)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    /// Page count; older backends omit it.
    #[serde(default)]
    pub all_page: Option<u32>,
    pub items: Vec<T>,
}

/// Reference-data lookup (`/list_province`, `/list_district`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lookup<T> {
    pub total: u64,
    pub items: Vec<T>,
}

/// Some listings are served either as a bare array or wrapped in `items`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Items<T> {
    Wrapped { items: Vec<T> },
    Bare(Vec<T>),
}

impl<T> Items<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Items::Wrapped { items } => items,
            Items::Bare(items) => items,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Province {
    pub province_id: i64,
    pub province_name: String,
    #[serde(default)]
    pub province_name_en: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct District {
    pub district_id: i64,
    pub district_name: String,
    #[serde(default)]
    pub district_name_en: String,
    #[serde(default)]
    pub province_id: Option<i64>,
}

/// Row of `/list_risk`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskArea {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub province_id: Option<i64>,
    #[serde(default)]
    pub district_id: Option<i64>,
    #[serde(default)]
    pub province_name: Option<String>,
    #[serde(default)]
    pub province_name_en: Option<String>,
    #[serde(default)]
    pub district_name: Option<String>,
    #[serde(default)]
    pub district_name_en: Option<String>,
    pub risk_level: u8,
}

/// Row of `/list_rain`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RainPoint {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub rain_mm_wmean: Option<f64>,
    #[serde(default)]
    pub province_id: Option<i64>,
    #[serde(default)]
    pub district_id: Option<i64>,
    #[serde(default)]
    pub province_name: Option<String>,
    #[serde(default)]
    pub province_name_en: Option<String>,
    #[serde(default)]
    pub district_name: Option<String>,
    #[serde(default)]
    pub district_name_en: Option<String>,
}

/// Row of `/list_province_district`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvinceDistrict {
    pub province_id: i64,
    pub district_id: i64,
    #[serde(default)]
    pub province_name: Option<String>,
    #[serde(default)]
    pub province_name_en: Option<String>,
    #[serde(default)]
    pub district_name: Option<String>,
    #[serde(default)]
    pub district_name_en: Option<String>,
}

/// Valid date range for time-filtered views (`/get_date_limit`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateLimit {
    #[serde(default, alias = "min_date", alias = "start_date")]
    pub date_start: Option<NaiveDate>,
    #[serde(default, alias = "max_date", alias = "end_date")]
    pub date_end: Option<NaiveDate>,
}

impl DateLimit {
    /// Clamp a date into the range; open ends are unbounded.
    pub fn clamp(&self, date: NaiveDate) -> NaiveDate {
        let date = self.date_start.map_or(date, |start| date.max(start));
        self.date_end.map_or(date, |end| date.min(end))
    }
}

/// Row of `/list_data_graph`: one district's observation on a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphRecord {
    #[serde(default)]
    pub district_id: Option<i64>,
    #[serde(default)]
    pub district_name: Option<String>,
    #[serde(default)]
    pub district_name_en: Option<String>,
    #[serde(default)]
    pub province_name: Option<String>,
    #[serde(default)]
    pub province_name_en: Option<String>,
    #[serde(flatten)]
    pub observation: Observation,
}

/// Ingested NetCDF file (`/datasets`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: i64,
    pub filename: String,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub time_coverage_start: Option<String>,
    #[serde(default)]
    pub time_coverage_end: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Ingested statistics spreadsheet (`/stats`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRecord {
    pub id: i64,
    pub filename: String,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub rows: Option<u64>,
    #[serde(default)]
    pub cols: Option<u64>,
    #[serde(default)]
    pub preview: Option<Vec<serde_json::Map<String, serde_json::Value>>>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Kinds of file the dashboard can ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UploadKind {
    /// Shapefile attribute table with risk areas.
    RiskAreaDbf,
    /// Gridded rainfall.
    RainNetCdf,
    /// Disaster statistics spreadsheet.
    DisasterStats,
}

impl UploadKind {
    pub fn endpoint(&self) -> &'static str {
        match self {
            UploadKind::RiskAreaDbf => "/upload_dbf",
            UploadKind::RainNetCdf => "/upload",
            UploadKind::DisasterStats => "/upload-stats",
        }
    }

    /// Accepted file extensions, lowercase without the dot.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            UploadKind::RiskAreaDbf => &["dbf"],
            UploadKind::RainNetCdf => &["nc"],
            UploadKind::DisasterStats => &["csv", "xlsx", "xls"],
        }
    }

    pub fn accepts(&self, path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions().contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// Whether the endpoint takes a `note` form field.
    pub fn takes_note(&self) -> bool {
        matches!(self, UploadKind::RainNetCdf)
    }

    /// Message shown after a successful upload.
    pub fn success_message(&self) -> &'static str {
        match self {
            UploadKind::RiskAreaDbf => "Upload Success",
            UploadKind::RainNetCdf => "NetCDF uploaded",
            UploadKind::DisasterStats => "Stats uploaded",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UploadKind::RiskAreaDbf => "Landslide risk area (.dbf)",
            UploadKind::RainNetCdf => "Rain (.nc)",
            UploadKind::DisasterStats => "Statistics (.csv/.xlsx/.xls)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_deserialize_page() {
        let json = r#"{
            "page": 2, "page_size": 10, "total": 31, "all_page": 4,
            "items": [{
                "id": 7, "province_id": 50, "district_id": 5001,
                "province_name": "เชียงใหม่", "province_name_en": "Chiang Mai",
                "district_name": "เมืองเชียงใหม่", "district_name_en": "Mueang Chiang Mai",
                "risk_level": 3
            }]
        }"#;
        let page: Page<RiskArea> = serde_json::from_str(json).unwrap();
        assert_eq!(page.page, 2);
        assert_eq!(page.all_page, Some(4));
        assert_eq!(page.items[0].risk_level, 3);
        assert_eq!(page.items[0].province_name_en.as_deref(), Some("Chiang Mai"));
    }

    #[test]
    fn test_page_without_all_page() {
        let page: Page<ProvinceDistrict> =
            serde_json::from_str(r#"{"page":1,"page_size":10,"total":0,"items":[]}"#).unwrap();
        assert!(page.all_page.is_none());
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_rain_point_nulls() {
        let json = r#"{"id": 1, "date": "2024-05-03", "rain_mm_wmean": null,
            "province_id": 50, "district_id": 5001, "province_name": null}"#;
        let p: RainPoint = serde_json::from_str(json).unwrap();
        assert_eq!(p.date, NaiveDate::from_ymd_opt(2024, 5, 3));
        assert!(p.rain_mm_wmean.is_none());
        assert!(p.province_name.is_none());
    }

    #[test]
    fn test_graph_record_flattens_observation() {
        let json = r#"{"district_id": 5001, "district_name": "เมือง",
            "rain_mm_wmean": 42.5, "risk_level": 2, "count_of_disasters": 1}"#;
        let r: GraphRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r.observation.rain_mm_wmean, Some(42.5));
        assert_eq!(r.observation.risk_level, 2);
        assert_eq!(r.observation.count_of_disasters, 1);
    }

    #[test]
    fn test_graph_records_with_null_disaster_count() {
        let json = r#"[
            {"district_id": 1, "rain_mm_wmean": 10.0, "risk_level": 1, "count_of_disasters": null},
            {"district_id": 2, "rain_mm_wmean": 10.0, "risk_level": 1, "count_of_disasters": 2}
        ]"#;
        let records: Vec<GraphRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].observation.count_of_disasters, 0);
        assert_eq!(records[1].observation.count_of_disasters, 2);
    }

    #[test]
    fn test_items_bare_or_wrapped() {
        let bare: Items<Dataset> =
            serde_json::from_str(r#"[{"id":1,"filename":"rain.nc"}]"#).unwrap();
        assert_eq!(bare.into_vec().len(), 1);

        let wrapped: Items<Dataset> =
            serde_json::from_str(r#"{"total":1,"items":[{"id":1,"filename":"rain.nc"}]}"#)
                .unwrap();
        assert_eq!(wrapped.into_vec()[0].filename, "rain.nc");
    }

    #[test]
    fn test_date_limit_aliases_and_clamp() {
        let limit: DateLimit =
            serde_json::from_str(r#"{"min_date":"2024-01-01","max_date":"2024-01-31"}"#).unwrap();
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        assert_eq!(limit.clamp(d(15)), d(15));
        assert_eq!(limit.clamp(NaiveDate::from_ymd_opt(2023, 12, 1).unwrap()), d(1));
        assert_eq!(limit.clamp(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()), d(31));
        assert_eq!(DateLimit::default().clamp(d(9)), d(9));
    }

    #[test]
    fn test_upload_kind_extensions() {
        assert!(UploadKind::RiskAreaDbf.accepts(Path::new("areas/RISK.DBF")));
        assert!(!UploadKind::RiskAreaDbf.accepts(Path::new("risk.shp")));
        assert!(UploadKind::RainNetCdf.accepts(Path::new("chirps.nc")));
        assert!(UploadKind::DisasterStats.accepts(Path::new("stats.xlsx")));
        assert!(!UploadKind::DisasterStats.accepts(Path::new("stats")));
        assert_eq!(UploadKind::DisasterStats.endpoint(), "/upload-stats");
    }

    #[test]
    fn test_user_label() {
        let mut user = User {
            id: 1,
            username: "admin".into(),
            display_name: None,
        };
        assert_eq!(user.label(), "admin");
        user.display_name = Some("Administrator".into());
        assert_eq!(user.label(), "Administrator");
    }
}
