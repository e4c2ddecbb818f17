//! JSON export of dashboard state.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};

use crate::api::{Dataset, StatRecord};
use crate::data::{Listing, RiskMap};

/// The classified risk map for its selected date.
pub fn risk_map_json(map: &RiskMap) -> Value {
    let counts = map.tier_counts();
    let districts: Vec<Value> = map
        .visible("")
        .iter()
        .map(|d| {
            json!({
                "district_id": d.record.district_id,
                "district": d.district_label(),
                "province": d.province_label(),
                "rain_mm_wmean": d.record.observation.rain_mm_wmean,
                "risk_level": d.record.observation.risk_level,
                "count_of_disasters": d.record.observation.count_of_disasters,
                "probability": d.classification.probability,
                "tier": d.classification.tier,
            })
        })
        .collect();

    json!({
        "date": map.date.map(format_date),
        "summary": {
            "total": counts.total(),
            "low": counts.low,
            "medium": counts.medium,
            "high": counts.high,
        },
        "districts": districts,
    })
}

/// The loaded page of a listing with the query that produced it.
pub fn listing_json<T: Serialize>(view: &str, listing: &Listing<T>) -> Value {
    json!({
        "view": view,
        "query": listing.query,
        "page": listing.pagination.page,
        "page_size": listing.pagination.page_size,
        "total": listing.pagination.total,
        "all_page": listing.pagination.page_count,
        "items": listing.rows,
    })
}

pub fn statistics_json(datasets: &[Dataset], stats: &[StatRecord]) -> Value {
    json!({
        "datasets": datasets,
        "stats": stats,
    })
}

/// Write pretty-printed JSON to `path`.
pub fn write_json(path: &Path, value: &Value) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let mut file = std::fs::File::create(path)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{GraphRecord, Page, RiskArea};
    use crate::data::Observation;

    fn record(name: &str, rain: f64, disasters: u32) -> GraphRecord {
        GraphRecord {
            district_id: Some(1),
            district_name: Some(name.to_string()),
            district_name_en: None,
            province_name: None,
            province_name_en: None,
            observation: Observation {
                rain_mm_wmean: Some(rain),
                risk_level: 1,
                count_of_disasters: disasters,
            },
        }
    }

    #[test]
    fn test_risk_map_json() {
        let mut map = RiskMap::new();
        map.date = NaiveDate::from_ymd_opt(2024, 8, 20);
        map.load(vec![record("calm", 0.0, 0), record("hit", 0.0, 1)]);

        let value = risk_map_json(&map);
        assert_eq!(value["date"], "2024-08-20");
        assert_eq!(value["summary"]["total"], 2);
        assert_eq!(value["summary"]["high"], 1);
        assert_eq!(value["districts"][0]["district"], "hit");
        assert_eq!(value["districts"][0]["tier"], "high");
        assert_eq!(value["districts"][0]["probability"], 80.0);
    }

    #[test]
    fn test_listing_json() {
        let mut listing: Listing<RiskArea> = Listing::new("date", &["risk_level"], 10);
        listing.apply(Page {
            page: 2,
            page_size: 10,
            total: 11,
            all_page: Some(2),
            items: vec![RiskArea {
                id: Some(11),
                province_id: None,
                district_id: None,
                province_name: None,
                province_name_en: None,
                district_name: None,
                district_name_en: None,
                risk_level: 3,
            }],
        });

        let value = listing_json("Risk area", &listing);
        assert_eq!(value["view"], "Risk area");
        assert_eq!(value["page"], 2);
        assert_eq!(value["total"], 11);
        assert_eq!(value["query"]["order_by"], "date");
        assert_eq!(value["items"][0]["risk_level"], 3);
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json(&path, &json!({ "ok": true })).unwrap();
        let read: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(read["ok"], true);
    }
}
