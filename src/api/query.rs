//! Query parameters for the paginated listing endpoints.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An id filter that is either `all` or one specific id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IdFilter {
    #[default]
    All,
    Id(i64),
}

impl IdFilter {
    pub fn is_all(&self) -> bool {
        matches!(self, IdFilter::All)
    }

    pub fn id(&self) -> Option<i64> {
        match self {
            IdFilter::All => None,
            IdFilter::Id(id) => Some(*id),
        }
    }
}

impl fmt::Display for IdFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdFilter::All => f.write_str("all"),
            IdFilter::Id(id) => write!(f, "{}", id),
        }
    }
}

/// Sort direction sent as `order_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            SortOrder::Asc => "↑",
            SortOrder::Desc => "↓",
        }
    }
}

/// Parameters of a paginated, sortable, filterable listing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    pub page: u32,
    pub page_size: u32,
    pub order_by: String,
    pub order_type: SortOrder,
    pub province_id: IdFilter,
    pub district_id: IdFilter,
    /// Only sent by listings that filter on risk level.
    pub risk_level: Option<IdFilter>,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
}

impl ListQuery {
    /// Create a first-page query sorted ascending by `order_by`.
    pub fn new(order_by: &str, page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            order_by: order_by.to_string(),
            order_type: SortOrder::Asc,
            province_id: IdFilter::All,
            district_id: IdFilter::All,
            risk_level: None,
            date_start: None,
            date_end: None,
        }
    }

    /// Enable the `risk_level` parameter (initially `all`).
    pub fn with_risk_level(mut self) -> Self {
        self.risk_level = Some(IdFilter::All);
        self
    }

    /// Query-string pairs in the order the backend documents them.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("page_size", self.page_size.to_string()),
            ("order_by", self.order_by.clone()),
            ("order_type", self.order_type.as_str().to_string()),
            ("province_id", self.province_id.to_string()),
            ("district_id", self.district_id.to_string()),
        ];
        if let Some(level) = self.risk_level {
            pairs.push(("risk_level", level.to_string()));
        }
        if let Some(start) = self.date_start {
            pairs.push(("date_start", start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = self.date_end {
            pairs.push(("date_end", end.format("%Y-%m-%d").to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get<'a>(pairs: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_default_risk_query() {
        let q = ListQuery::new("date", 10).with_risk_level();
        let pairs = q.pairs();
        assert_eq!(get(&pairs, "page"), Some("1"));
        assert_eq!(get(&pairs, "page_size"), Some("10"));
        assert_eq!(get(&pairs, "order_by"), Some("date"));
        assert_eq!(get(&pairs, "order_type"), Some("asc"));
        assert_eq!(get(&pairs, "province_id"), Some("all"));
        assert_eq!(get(&pairs, "district_id"), Some("all"));
        assert_eq!(get(&pairs, "risk_level"), Some("all"));
        assert_eq!(get(&pairs, "date_start"), None);
    }

    #[test]
    fn test_filters_and_dates() {
        let mut q = ListQuery::new("rain_mm_wmean", 20);
        q.order_type = SortOrder::Desc;
        q.province_id = IdFilter::Id(50);
        q.district_id = IdFilter::Id(5001);
        q.date_start = NaiveDate::from_ymd_opt(2024, 5, 3);
        let pairs = q.pairs();
        assert_eq!(get(&pairs, "order_type"), Some("desc"));
        assert_eq!(get(&pairs, "province_id"), Some("50"));
        assert_eq!(get(&pairs, "district_id"), Some("5001"));
        assert_eq!(get(&pairs, "risk_level"), None);
        assert_eq!(get(&pairs, "date_start"), Some("2024-05-03"));
        assert_eq!(get(&pairs, "date_end"), None);
    }

    #[test]
    fn test_page_size_never_zero() {
        assert_eq!(ListQuery::new("date", 0).page_size, 1);
    }

    #[test]
    fn test_sort_order_toggle() {
        assert_eq!(SortOrder::Asc.toggled(), SortOrder::Desc);
        assert_eq!(SortOrder::Desc.toggled().as_str(), "asc");
    }
}
