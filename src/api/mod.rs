//! REST client for the study-tracker API.
//!
//! Every call takes the caller's [`Credential`] explicitly; there is no
//! process-wide token. Responses are decoded into the typed shapes in
//! [`types`], and a body that doesn't fit is reported as
//! [`ApiError::Malformed`] instead of being half-trusted.

pub mod types;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::auth::{Credential, OAuthProvider};
use crate::calendar::{CalendarDate, DateRange};
use crate::config::ApiConfig;
use types::*;

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API base URL is not set (config [api] base_url or STUDYLOG_API_BASE_URL)")]
    MissingBaseUrl,

    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Network error while requesting {path}: {source}")]
    Network { path: String, #[source] source: reqwest::Error },

    /// 401 — the stored session is no longer accepted.
    #[error("{message}")]
    Unauthorized { message: String },

    #[error("{message}")]
    Status { status: u16, message: String, details: Option<Value> },

    #[error("malformed response from {path}: {source}")]
    Malformed { path: String, #[source] source: serde_json::Error },
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ─── Client ───────────────────────────────────────────────────────────────────

pub struct ApiClient {
    http:     Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("studylog/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Client)?;
        Self::with_client(http, config.base_url.as_deref())
    }

    fn with_client(http: Client, base_url: Option<&str>) -> Result<Self, ApiError> {
        let base_url = base_url
            .map(|u| u.trim().trim_end_matches('/'))
            .filter(|u| !u.is_empty())
            .ok_or(ApiError::MissingBaseUrl)?
            .to_owned();
        Ok(Self { http, base_url })
    }

    /// Where the browser goes to start an OAuth sign-in.
    pub fn oauth_start_url(&self, provider: OAuthProvider) -> String {
        format!("{}/auth/oauth/{}/start", self.base_url, provider.as_str())
    }

    // ── Plumbing ──────────────────────────────────────────────────────────────

    fn request(&self, method: Method, path: &str, cred: Option<&Credential>) -> RequestBuilder {
        let req = self.http.request(method, format!("{}{}", self.base_url, path));
        match cred {
            Some(c) => req.bearer_auth(c.token()),
            None    => req,
        }
    }

    async fn execute(&self, path: &str, req: RequestBuilder) -> Result<Response, ApiError> {
        tracing::debug!(path, "api request");
        let resp = req.send().await
            .map_err(|source| ApiError::Network { path: path.to_owned(), source })?;
        if resp.status().is_success() {
            return Ok(resp);
        }
        let err = error_from_response(resp).await;
        tracing::warn!(path, error = %err, "api request failed");
        Err(err)
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str, req: RequestBuilder) -> Result<T, ApiError> {
        let resp  = self.execute(path, req).await?;
        let bytes = resp.bytes().await
            .map_err(|source| ApiError::Network { path: path.to_owned(), source })?;
        serde_json::from_slice(&bytes)
            .map_err(|source| ApiError::Malformed { path: path.to_owned(), source })
    }

    /// For endpoints whose response body (if any) is not used.
    async fn submit(&self, path: &str, req: RequestBuilder) -> Result<(), ApiError> {
        self.execute(path, req).await.map(|_| ())
    }

    // ── Auth ──────────────────────────────────────────────────────────────────

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let path = "/auth/login";
        let req  = self.request(Method::POST, path, None).json(&LoginRequest { email, password });
        self.fetch(path, req).await
    }

    pub async fn me(&self, cred: &Credential) -> Result<UserProfile, ApiError> {
        let path = "/me";
        let resp: MeResponse = self.fetch(path, self.request(Method::GET, path, Some(cred))).await?;
        Ok(resp.user)
    }

    // ── Children ──────────────────────────────────────────────────────────────

    pub async fn list_children(&self, cred: &Credential) -> Result<Vec<Child>, ApiError> {
        let path = "/children";
        self.fetch(path, self.request(Method::GET, path, Some(cred))).await
    }

    pub async fn create_child(&self, cred: &Credential, child: &NewChild) -> Result<Child, ApiError> {
        let path = "/children";
        let req  = self.request(Method::POST, path, Some(cred)).json(child);
        self.fetch(path, req).await
    }

    pub async fn update_child(
        &self, cred: &Credential, child_id: &str, update: &ChildUpdate,
    ) -> Result<Child, ApiError> {
        let path = format!("/children/{}", pct(child_id));
        let req  = self.request(Method::PUT, &path, Some(cred)).json(update);
        self.fetch(&path, req).await
    }

    // ── Tasks ─────────────────────────────────────────────────────────────────

    pub async fn list_tasks(&self, cred: &Credential, child_id: &str) -> Result<Vec<Task>, ApiError> {
        let path = format!("/children/{}/tasks", pct(child_id));
        self.fetch(&path, self.request(Method::GET, &path, Some(cred))).await
    }

    pub async fn create_task(
        &self, cred: &Credential, child_id: &str, task: &TaskPayload,
    ) -> Result<(), ApiError> {
        let path = format!("/children/{}/tasks", pct(child_id));
        let req  = self.request(Method::POST, &path, Some(cred)).json(task);
        self.submit(&path, req).await
    }

    pub async fn update_task(
        &self, cred: &Credential, child_id: &str, task_id: &str, task: &TaskPayload,
    ) -> Result<(), ApiError> {
        let path = format!("/children/{}/tasks/{}", pct(child_id), pct(task_id));
        let req  = self.request(Method::PUT, &path, Some(cred)).json(task);
        self.submit(&path, req).await
    }

    // ── Daily ─────────────────────────────────────────────────────────────────

    pub async fn daily_view(
        &self, cred: &Credential, child_id: &str, date: CalendarDate,
    ) -> Result<DailyView, ApiError> {
        let path = format!("/children/{}/daily-view", pct(child_id));
        let req  = self.request(Method::GET, &path, Some(cred))
            .query(&[("date", date.to_string())]);
        self.fetch(&path, req).await
    }

    pub async fn save_daily(
        &self, cred: &Credential, child_id: &str, date: CalendarDate, save: &DailySave,
    ) -> Result<(), ApiError> {
        let path = format!("/children/{}/daily", pct(child_id));
        let req  = self.request(Method::PUT, &path, Some(cred))
            .query(&[("date", date.to_string())])
            .json(save);
        self.submit(&path, req).await
    }

    // ── Reporting ─────────────────────────────────────────────────────────────

    pub async fn calendar(
        &self, cred: &Credential, child_id: &str, range: DateRange,
    ) -> Result<CalendarStatus, ApiError> {
        let path = format!("/children/{}/calendar", pct(child_id));
        let req  = self.request(Method::GET, &path, Some(cred)).query(&range_query(range));
        self.fetch(&path, req).await
    }

    pub async fn summary(
        &self, cred: &Credential, child_id: &str, range: DateRange,
    ) -> Result<Summary, ApiError> {
        let path = format!("/children/{}/summary", pct(child_id));
        let req  = self.request(Method::GET, &path, Some(cred)).query(&range_query(range));
        self.fetch(&path, req).await
    }
}

fn range_query(range: DateRange) -> [(&'static str, String); 2] {
    [("from", range.from().to_string()), ("to", range.to().to_string())]
}

// ─── Error decoding ───────────────────────────────────────────────────────────

async fn error_from_response(resp: Response) -> ApiError {
    let status  = resp.status().as_u16();
    let is_json = resp.headers().get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.contains("application/json"))
        .unwrap_or(false);
    let text = resp.text().await.unwrap_or_default();
    let (message, details) = error_message(status, is_json, &text);
    if status == 401 {
        ApiError::Unauthorized { message }
    } else {
        ApiError::Status { status, message, details }
    }
}

/// The JSON body's `error` string, else its `message` string, else the plain
/// text body, else a generic line with the status code.
fn error_message(status: u16, is_json: bool, body: &str) -> (String, Option<Value>) {
    let fallback = format!("Request failed with status {status}");
    if is_json {
        return match serde_json::from_str::<Value>(body) {
            Ok(details) => {
                let message = ["error", "message"].iter()
                    .find_map(|k| details.get(k).and_then(Value::as_str))
                    .map(str::to_owned)
                    .unwrap_or(fallback);
                (message, Some(details))
            }
            Err(_) => (fallback, None),
        };
    }
    if body.is_empty() { (fallback, None) } else { (body.to_owned(), None) }
}

/// Minimal percent-encoding for URL path components.
fn pct(s: &str) -> String {
    s.bytes().map(|b| {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            (b as char).to_string()
        } else {
            format!("%{b:02X}")
        }
    }).collect()
}
