//! Error types for backend requests.

use thiserror::Error;

/// Errors that can occur when talking to the backend API.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The session is missing or expired (HTTP 401).
    #[error("{0}")]
    Unauthorized(String),

    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Connection to the backend failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Local file could not be read for upload.
    #[error("File error: {0}")]
    Io(String),

    /// Request refused before it was sent (bad extension, missing file name).
    #[error("{0}")]
    Rejected(String),

    /// Any other transport failure.
    #[error("Request failed: {0}")]
    Request(String),
}

impl ApiError {
    /// Whether this error should send the user back to the login form.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    /// Build an error from a failed response body.
    ///
    /// FastAPI reports failures as `{"detail": "..."}`; that message is
    /// preferred over the raw body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = detail_message(body).unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                format!("status {}", status)
            } else {
                trimmed.to_string()
            }
        });

        if status == 401 {
            ApiError::Unauthorized(message)
        } else {
            ApiError::Http { status, message }
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_connect() {
            ApiError::Connection(err.to_string())
        } else if err.is_decode() {
            ApiError::Parse(err.to_string())
        } else {
            ApiError::Request(err.to_string())
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Io(err.to_string())
    }
}

fn detail_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        // Validation errors come back as a list of objects with a "msg" field
        serde_json::Value::Array(items) => {
            let msgs: Vec<&str> =
                items.iter().filter_map(|i| i.get("msg").and_then(|m| m.as_str())).collect();
            (!msgs.is_empty()).then(|| msgs.join("; "))
        }
        other => Some(other.to_string()),
    }
}
