//! Client for the landslide backend HTTP API.
//!
//! The backend owns authentication, pagination, file parsing and persistence.
//! This module only speaks its wire format: JSON for reads, multipart
//! form-data for uploads, and a session cookie on every request.

mod client;
mod error;
pub mod models;
pub mod query;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ApiClient, ApiClientBuilder, DEFAULT_API_BASE};
pub use error::ApiError;
pub use models::{
    Dataset, DateLimit, District, GraphRecord, Lookup, Page, Province, ProvinceDistrict,
    RainPoint, RiskArea, StatRecord, UploadKind, User,
};
pub use query::{IdFilter, ListQuery, SortOrder};
pub use session::{Credential, SessionStore};
