//! HTTP client for the landslide backend.

use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::models::{
    DateLimit, District, GraphRecord, Items, LoginRequest, Lookup, Page, Province,
    ProvinceDistrict, RainPoint, RiskArea, StatRecord, UploadKind, User, Dataset,
};
use super::query::{IdFilter, ListQuery};
use super::session::Credential;
use super::ApiError;

/// Default backend address used by the dashboard.
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// Typed client for the backend API.
///
/// The session credential travels with the client: every request carries it
/// as a `Cookie` header. Cloning is cheap and shares the connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    credential: Option<Credential>,
}

impl ApiClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn set_credential(&mut self, credential: Option<Credential>) {
        self.credential = credential;
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_credential(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credential {
            Some(c) => request.header(COOKIE, c.header_value()),
            None => request,
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        debug!("GET {}", path);
        self.with_credential(self.http.get(self.url(path)))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        debug!("POST {}", path);
        self.with_credential(self.http.post(self.url(path)))
    }

    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = ApiError::from_status(status.as_u16(), &body);
        if status != StatusCode::UNAUTHORIZED {
            warn!("Request failed: {}", err);
        }
        Err(err)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = Self::check(request.send().await?).await?;
        response.json().await.map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Check that the current session is valid.
    pub async fn me(&self) -> Result<User, ApiError> {
        self.fetch(self.get("/me")).await
    }

    /// Log in and keep the session cookie the backend sets.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<User, ApiError> {
        let request = self.post("/auth/login").json(&LoginRequest { username, password });
        let response = Self::check(request.send().await?).await?;

        let cookies = response.headers().get_all(SET_COOKIE);
        if let Some(credential) =
            Credential::from_set_cookie(cookies.iter().filter_map(|v| v.to_str().ok()))
        {
            self.credential = Some(credential);
        }

        let user: User = response.json().await.map_err(|e| ApiError::Parse(e.to_string()))?;
        info!("Logged in as {}", user.username);
        Ok(user)
    }

    /// End the session. The local credential is dropped even if the call fails.
    pub async fn logout(&mut self) -> Result<(), ApiError> {
        let result = match self.post("/auth/logout").send().await {
            Ok(response) => Self::check(response).await.map(|_| ()),
            Err(e) => Err(e.into()),
        };
        self.credential = None;
        info!("Logged out");
        result
    }

    pub async fn list_risk(&self, query: &ListQuery) -> Result<Page<RiskArea>, ApiError> {
        self.fetch(self.get("/list_risk").query(&query.pairs())).await
    }

    pub async fn list_rain(&self, query: &ListQuery) -> Result<Page<RainPoint>, ApiError> {
        self.fetch(self.get("/list_rain").query(&query.pairs())).await
    }

    pub async fn list_province_district(
        &self,
        query: &ListQuery,
    ) -> Result<Page<ProvinceDistrict>, ApiError> {
        self.fetch(self.get("/list_province_district").query(&query.pairs())).await
    }

    pub async fn list_province(&self) -> Result<Lookup<Province>, ApiError> {
        self.fetch(self.get("/list_province")).await
    }

    /// Districts, optionally restricted to one province.
    pub async fn list_district(&self, province: IdFilter) -> Result<Lookup<District>, ApiError> {
        let request = self.get("/list_district");
        let request = match province {
            IdFilter::All => request,
            IdFilter::Id(id) => request.query(&[("province_id", id)]),
        };
        self.fetch(request).await
    }

    pub async fn date_limit(&self) -> Result<DateLimit, ApiError> {
        self.fetch(self.get("/get_date_limit")).await
    }

    /// Per-district observations for one date.
    pub async fn list_data_graph(&self, date: NaiveDate) -> Result<Vec<GraphRecord>, ApiError> {
        let date = date.format("%Y-%m-%d").to_string();
        let items: Items<GraphRecord> =
            self.fetch(self.get("/list_data_graph").query(&[("date", date)])).await?;
        Ok(items.into_vec())
    }

    pub async fn datasets(&self) -> Result<Vec<Dataset>, ApiError> {
        let items: Items<Dataset> = self.fetch(self.get("/datasets")).await?;
        Ok(items.into_vec())
    }

    pub async fn stats(&self) -> Result<Vec<StatRecord>, ApiError> {
        let items: Items<StatRecord> = self.fetch(self.get("/stats")).await?;
        Ok(items.into_vec())
    }

    /// Upload a file to the endpoint for `kind`.
    ///
    /// The extension is checked locally first. `note` is only sent to
    /// endpoints that take one (an empty note is sent when `None`).
    pub async fn upload(
        &self,
        kind: UploadKind,
        path: &Path,
        note: Option<&str>,
    ) -> Result<serde_json::Value, ApiError> {
        if !kind.accepts(path) {
            return Err(ApiError::Rejected(format!(
                "{} accepts only .{} files",
                kind.label(),
                kind.extensions().join(", .")
            )));
        }
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ApiError::Rejected(format!("Invalid file name: {}", path.display())))?
            .to_string();

        let bytes = tokio::fs::read(path).await?;
        let size = bytes.len();
        let mut form = Form::new().part("file", Part::bytes(bytes).file_name(file_name.clone()));
        if kind.takes_note() {
            form = form.text("note", note.unwrap_or_default().to_string());
        }

        let receipt = self.fetch(self.post(kind.endpoint()).multipart(form)).await?;
        info!("Uploaded {} ({} bytes) to {}", file_name, size, kind.endpoint());
        Ok(receipt)
    }
}

/// Builder for [`ApiClient`].
#[derive(Debug, Default)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    credential: Option<Credential>,
}

impl ApiClientBuilder {
    /// Set the backend base URL (e.g., "http://localhost:8000").
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the request timeout (default: 30 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Start with an existing session credential.
    pub fn credential(mut self, credential: Option<Credential>) -> Self {
        self.credential = credential;
        self
    }

    pub fn build(self) -> Result<ApiClient, ApiError> {
        let http = Client::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(30)))
            .build()
            .map_err(|e| ApiError::Request(e.to_string()))?;

        let base_url = self.base_url.unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Ok(ApiClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credential: self.credential,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::query::SortOrder;
    use crate::api::testing::{MockResponse, MockServer};
    use serde_json::json;
    use std::io::Write;

    fn client(server: &MockServer) -> ApiClient {
        ApiClient::builder().base_url(server.base_url.clone()).build().unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let client = ApiClient::builder().build().unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert!(client.credential().is_none());
    }

    #[test]
    fn test_builder_trims_trailing_slash() {
        let client = ApiClient::builder().base_url("http://api.local:9000/").build().unwrap();
        assert_eq!(client.base_url(), "http://api.local:9000");
    }

    #[tokio::test]
    async fn test_login_keeps_cookie_and_sends_it() {
        let server = MockServer::start(vec![
            (
                "/auth/login",
                MockResponse::json(200, json!({"id": 1, "username": "admin", "display_name": null}))
                    .with_header("Set-Cookie", "session=abc123; HttpOnly; Path=/"),
            ),
            ("/me", MockResponse::json(200, json!({"id": 1, "username": "admin"}))),
        ])
        .await;
        let mut client = client(&server);

        let user = client.login("admin", "secret").await.unwrap();
        assert_eq!(user.username, "admin");
        assert_eq!(client.credential().unwrap().header_value(), "session=abc123");

        client.me().await.unwrap();

        let login = &server.requests_to("/auth/login")[0];
        assert_eq!(login.method, "POST");
        let body: serde_json::Value = serde_json::from_str(&login.body).unwrap();
        assert_eq!(body, json!({"username": "admin", "password": "secret"}));

        let me = &server.requests_to("/me")[0];
        assert_eq!(me.header("cookie"), Some("session=abc123"));
    }

    #[tokio::test]
    async fn test_login_failure_surfaces_detail() {
        let server = MockServer::start(vec![(
            "/auth/login",
            MockResponse::json(401, json!({"detail": "Invalid username or password"})),
        )])
        .await;
        let mut client = client(&server);

        let err = client.login("admin", "wrong").await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "Invalid username or password");
        assert!(client.credential().is_none());
    }

    #[tokio::test]
    async fn test_me_unauthorized() {
        let server = MockServer::start(vec![(
            "/me",
            MockResponse::json(401, json!({"detail": "Not authenticated"})),
        )])
        .await;
        let err = client(&server).me().await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_logout_clears_credential() {
        let server =
            MockServer::start(vec![("/auth/logout", MockResponse::json(200, json!({"ok": true})))])
                .await;
        let mut client = client(&server);
        client.set_credential(Some(Credential::new("session=abc")));

        client.logout().await.unwrap();
        assert!(client.credential().is_none());
        let req = &server.requests_to("/auth/logout")[0];
        assert_eq!(req.header("cookie"), Some("session=abc"));
    }

    #[tokio::test]
    async fn test_list_risk_sends_query() {
        let server = MockServer::start(vec![(
            "/list_risk",
            MockResponse::json(
                200,
                json!({"page": 1, "page_size": 10, "total": 1, "all_page": 1,
                       "items": [{"id": 3, "province_name": "น่าน", "province_name_en": "Nan",
                                  "district_name": "ปัว", "district_name_en": "Pua", "risk_level": 2}]}),
            ),
        )])
        .await;

        let mut query = ListQuery::new("risk_level", 10).with_risk_level();
        query.order_type = SortOrder::Desc;
        query.province_id = IdFilter::Id(55);
        query.risk_level = Some(IdFilter::Id(2));

        let page = client(&server).list_risk(&query).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].district_name_en.as_deref(), Some("Pua"));

        let req = &server.requests_to("/list_risk")[0];
        let q = req.query();
        assert!(q.contains("page=1"));
        assert!(q.contains("order_by=risk_level"));
        assert!(q.contains("order_type=desc"));
        assert!(q.contains("province_id=55"));
        assert!(q.contains("district_id=all"));
        assert!(q.contains("risk_level=2"));
    }

    #[tokio::test]
    async fn test_list_district_by_province() {
        let server = MockServer::start(vec![(
            "/list_district",
            MockResponse::json(
                200,
                json!({"total": 1, "items": [{"district_id": 5501, "district_name": "เมืองน่าน",
                                             "district_name_en": "Mueang Nan"}]}),
            ),
        )])
        .await;
        let client = client(&server);

        let districts = client.list_district(IdFilter::Id(55)).await.unwrap();
        assert_eq!(districts.total, 1);
        client.list_district(IdFilter::All).await.unwrap();

        let reqs = server.requests_to("/list_district");
        assert_eq!(reqs.len(), 2);
        let queries: Vec<&str> = reqs.iter().map(|r| r.query()).collect();
        assert!(queries.contains(&"province_id=55"));
        assert!(queries.contains(&""));
    }

    #[tokio::test]
    async fn test_list_data_graph_accepts_bare_array() {
        let server = MockServer::start(vec![(
            "/list_data_graph",
            MockResponse::json(
                200,
                json!([{"district_name": "ปัว", "rain_mm_wmean": 120.0, "risk_level": 3,
                        "count_of_disasters": 0}]),
            ),
        )])
        .await;

        let date = NaiveDate::from_ymd_opt(2024, 8, 21).unwrap();
        let records = client(&server).list_data_graph(date).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].observation.risk_level, 3);
        assert_eq!(server.requests_to("/list_data_graph")[0].query(), "date=2024-08-21");
    }

    #[tokio::test]
    async fn test_server_error_is_http_error() {
        let server = MockServer::start(vec![(
            "/datasets",
            MockResponse::json(500, json!({"detail": "database unavailable"})),
        )])
        .await;
        let err = client(&server).datasets().await.unwrap_err();
        assert_eq!(
            err,
            ApiError::Http {
                status: 500,
                message: "database unavailable".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Bind then drop to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ApiClient::builder().base_url(format!("http://{}", addr)).build().unwrap();
        let err = client.me().await.unwrap_err();
        assert!(matches!(err, ApiError::Connection(_) | ApiError::Request(_)));
        assert!(!err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_upload_netcdf_sends_file_and_note() {
        let server =
            MockServer::start(vec![("/upload", MockResponse::json(200, json!({"id": 9})))]).await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chirps.nc");
        std::fs::File::create(&path).unwrap().write_all(b"CDF\x01payload").unwrap();

        let receipt = client(&server)
            .upload(UploadKind::RainNetCdf, &path, Some("august run"))
            .await
            .unwrap();
        assert_eq!(receipt["id"], 9);

        let req = &server.requests_to("/upload")[0];
        assert!(req.header("content-type").unwrap().starts_with("multipart/form-data"));
        assert!(req.body.contains("filename=\"chirps.nc\""));
        assert!(req.body.contains("name=\"note\""));
        assert!(req.body.contains("august run"));
        assert!(req.body.contains("payload"));
    }

    #[tokio::test]
    async fn test_upload_dbf_has_no_note() {
        let server =
            MockServer::start(vec![("/upload_dbf", MockResponse::json(200, json!({"rows": 12})))])
                .await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("risk.dbf");
        std::fs::write(&path, b"dbf-bytes").unwrap();

        client(&server).upload(UploadKind::RiskAreaDbf, &path, Some("ignored")).await.unwrap();

        let req = &server.requests_to("/upload_dbf")[0];
        assert!(req.body.contains("filename=\"risk.dbf\""));
        assert!(!req.body.contains("name=\"note\""));
    }

    #[tokio::test]
    async fn test_upload_rejects_wrong_extension_without_request() {
        let server = MockServer::start(vec![]).await;
        let err = client(&server)
            .upload(UploadKind::DisasterStats, Path::new("stats.txt"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Rejected(_)));
        assert!(server.requests().is_empty());
    }

    #[tokio::test]
    async fn test_upload_missing_file() {
        let server = MockServer::start(vec![]).await;
        let err = client(&server)
            .upload(UploadKind::RiskAreaDbf, Path::new("/nonexistent/risk.dbf"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Io(_)));
    }
}
