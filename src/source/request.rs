//! Requests the dashboard sends to a data source and the replies it gets back.

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::api::{
    ApiClient, ApiError, Dataset, DateLimit, District, GraphRecord, IdFilter, ListQuery, Lookup,
    Page, Province, ProvinceDistrict, RainPoint, RiskArea, StatRecord, UploadKind, User,
};

/// Tag attached to a request and echoed in its reply.
///
/// Tickets increase monotonically. A reply whose ticket is not the latest one
/// issued for its slot is stale and gets dropped.
pub type Ticket = u64;

/// One backend operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// `GET /me`.
    CheckSession,
    Login { username: String, password: String },
    Logout,
    RiskAreas(ListQuery),
    Rain(ListQuery),
    ProvinceDistricts(ListQuery),
    Provinces,
    Districts(IdFilter),
    DateLimit,
    Observations(NaiveDate),
    Datasets,
    Stats,
    Upload {
        kind: UploadKind,
        path: PathBuf,
        note: Option<String>,
    },
}

impl Request {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Request::CheckSession => "me",
            Request::Login { .. } => "login",
            Request::Logout => "logout",
            Request::RiskAreas(_) => "list_risk",
            Request::Rain(_) => "list_rain",
            Request::ProvinceDistricts(_) => "list_province_district",
            Request::Provinces => "list_province",
            Request::Districts(_) => "list_district",
            Request::DateLimit => "get_date_limit",
            Request::Observations(_) => "list_data_graph",
            Request::Datasets => "datasets",
            Request::Stats => "stats",
            Request::Upload { .. } => "upload",
        }
    }
}

/// Successful result of a [`Request`].
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Session(User),
    LoggedOut,
    RiskAreas(Page<RiskArea>),
    Rain(Page<RainPoint>),
    ProvinceDistricts(Page<ProvinceDistrict>),
    Provinces(Lookup<Province>),
    Districts(Lookup<District>),
    DateLimit(DateLimit),
    Observations(Vec<GraphRecord>),
    Datasets(Vec<Dataset>),
    Stats(Vec<StatRecord>),
    Uploaded {
        kind: UploadKind,
        receipt: serde_json::Value,
    },
}

/// Outcome of a request, tagged with its ticket.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub ticket: Ticket,
    pub outcome: Result<Payload, ApiError>,
}

impl Reply {
    pub fn ok(ticket: Ticket, payload: Payload) -> Self {
        Self {
            ticket,
            outcome: Ok(payload),
        }
    }

    pub fn err(ticket: Ticket, error: ApiError) -> Self {
        Self {
            ticket,
            outcome: Err(error),
        }
    }
}

/// Run a read-only or upload request against the backend.
///
/// Login and logout mutate the client's credential and are handled by the
/// caller.
pub(crate) async fn execute(client: &ApiClient, request: Request) -> Result<Payload, ApiError> {
    match request {
        Request::CheckSession => client.me().await.map(Payload::Session),
        Request::RiskAreas(query) => client.list_risk(&query).await.map(Payload::RiskAreas),
        Request::Rain(query) => client.list_rain(&query).await.map(Payload::Rain),
        Request::ProvinceDistricts(query) => client
            .list_province_district(&query)
            .await
            .map(Payload::ProvinceDistricts),
        Request::Provinces => client.list_province().await.map(Payload::Provinces),
        Request::Districts(province) => {
            client.list_district(province).await.map(Payload::Districts)
        }
        Request::DateLimit => client.date_limit().await.map(Payload::DateLimit),
        Request::Observations(date) => {
            client.list_data_graph(date).await.map(Payload::Observations)
        }
        Request::Datasets => client.datasets().await.map(Payload::Datasets),
        Request::Stats => client.stats().await.map(Payload::Stats),
        Request::Upload { kind, path, note } => client
            .upload(kind, &path, note.as_deref())
            .await
            .map(|receipt| Payload::Uploaded { kind, receipt }),
        Request::Login { .. } | Request::Logout => Err(ApiError::Request(
            "session requests must go through the session worker".to_string(),
        )),
    }
}
