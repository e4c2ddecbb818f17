//! Data models and processing for the dashboard views.
//!
//! Wire records from [`crate::api`] are turned into view state here:
//! classified risk map districts, paginated listings and display strings.
//!
//! ## Submodules
//!
//! - [`risk`]: Probability estimation and color tiers ([`classify`], [`ColorTier`])
//! - [`risk_map`]: Classified districts for the selected date ([`RiskMap`])
//! - [`listing`]: Query and rows of a server-paginated table ([`Listing`])
//! - [`pagination`]: Page metadata and row numbering ([`Pagination`])
//! - [`format`]: Display helpers (thousands separators, bilingual names)
//!
//! ## Data Flow
//!
//! ```text
//! /list_data_graph (GraphRecord)
//!        │
//!        ▼
//! RiskMap::load() ──▶ classify() ──▶ ClassifiedDistrict (probability, tier)
//!
//! /list_risk, /list_rain, /list_province_district (Page<T>)
//!        │
//!        ▼
//! Listing::apply() ──▶ Pagination (row numbers, page count)
//! ```

pub mod format;
pub mod listing;
pub mod pagination;
pub mod risk;
pub mod risk_map;

pub use listing::{filter_rows, Listing, Searchable, RISK_LEVELS};
pub use pagination::{Pagination, PAGE_SIZES};
pub use risk::{classify, Classification, ColorTier, Observation};
pub use risk_map::{step_date, ClassifiedDistrict, RiskMap, RiskMapSort, TierCounts};
