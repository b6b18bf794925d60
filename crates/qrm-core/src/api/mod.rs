//! QR-code API client.
//!
//! Two calls, both authenticated with an `api_key` query parameter:
//! - validate: `POST /api/1/validate` → `{success, data: {user_id}, message?}`
//! - list: `GET /api/1/list` → `{success, data: {content: [QrCode]}}`
//!
//! In `proxy` mode the local paths (`/api/`, `/api/list/`) are used instead and
//! a `qrm proxy` instance rewrites them.
//!
//! Server answers are classified into outcomes here; the controller decides
//! what to show. Only transport and parse failures are `ApiError`s.

mod error;

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
pub use error::{ApiError, ApiErrorKind};
use url::Url;

use crate::config::{ApiConfig, ApiMode, Config};
use crate::logging::mask_key;
use crate::models::{QrCode, scalar_text};

pub const DIRECT_VALIDATE_PATH: &str = "/api/1/validate";
pub const DIRECT_LIST_PATH: &str = "/api/1/list";
pub const PROXY_VALIDATE_PATH: &str = "/api/";
pub const PROXY_LIST_PATH: &str = "/api/list/";

const BASE_URL_ENV: &str = "QRM_API_BASE_URL";

/// Result of a validation call that reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidateOutcome {
    /// `success` was truthy and a user id came back.
    Accepted { user_id: String },
    /// Bad status, falsy `success`, or no user id. Carries `message` if the
    /// server sent one.
    Rejected { message: Option<String> },
}

/// Result of a list call that reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListOutcome {
    Loaded(Vec<QrCode>),
    /// `success` was truthy but `data.content` was absent.
    MissingContent,
    /// Bad status or falsy `success`.
    Failed { status: u16 },
}

/// Resolves the API base URL.
///
/// Resolution order:
/// 1. `QRM_API_BASE_URL` env var (if set and non-empty)
/// 2. `api.base_url` from config (if non-empty)
/// 3. Default: `https://g-qr.ru`
pub fn resolve_base_url(config: &ApiConfig) -> Result<String> {
    let candidate = std::env::var(BASE_URL_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(|| Some(config.base_url.clone()).filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| Config::DEFAULT_BASE_URL.to_string());
    let candidate = candidate.trim().trim_end_matches('/').to_string();

    let parsed =
        Url::parse(&candidate).with_context(|| format!("Invalid API base URL: {candidate}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("API base URL must be http or https: {candidate}");
    }
    Ok(candidate)
}

/// Concrete request URLs (without the `api_key` query).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub validate: Url,
    pub list: Url,
}

impl Endpoints {
    pub fn new(base_url: &str, mode: ApiMode) -> Result<Self> {
        let (validate, list) = match mode {
            ApiMode::Direct => (DIRECT_VALIDATE_PATH, DIRECT_LIST_PATH),
            ApiMode::Proxy => (PROXY_VALIDATE_PATH, PROXY_LIST_PATH),
        };
        let base = base_url.trim_end_matches('/');
        Ok(Self {
            validate: Url::parse(&format!("{base}{validate}"))
                .with_context(|| format!("Invalid validate URL for base {base}"))?,
            list: Url::parse(&format!("{base}{list}"))
                .with_context(|| format!("Invalid list URL for base {base}"))?,
        })
    }
}

/// Appends `api_key=<key>` (URL-encoded) to `url`.
pub fn with_api_key(url: &Url, api_key: &str) -> Url {
    let mut url = url.clone();
    url.query_pairs_mut().append_pair("api_key", api_key);
    url
}

/// JS-style truthiness, as the API's `success` flag is not always a bool.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

fn server_message(body: &Value) -> Option<String> {
    body.get("message")
        .and_then(scalar_text)
        .filter(|m| !m.trim().is_empty())
}

/// Classifies a validation response.
pub fn interpret_validate(status: StatusCode, body: &Value) -> ValidateOutcome {
    if status.is_success() && is_truthy(body.get("success")) {
        let user_id = body
            .pointer("/data/user_id")
            .and_then(scalar_text)
            .filter(|id| !id.is_empty());
        if let Some(user_id) = user_id {
            return ValidateOutcome::Accepted { user_id };
        }
    }
    ValidateOutcome::Rejected {
        message: server_message(body),
    }
}

/// Classifies a list response.
pub fn interpret_list(status: StatusCode, body: &Value) -> ListOutcome {
    if !(status.is_success() && is_truthy(body.get("success"))) {
        return ListOutcome::Failed {
            status: status.as_u16(),
        };
    }

    let items: Vec<&Value> = match body.pointer("/data/content") {
        Some(Value::Array(items)) => items.iter().collect(),
        // Some backends serialize keyed arrays as objects.
        Some(Value::Object(map)) => map.values().collect(),
        _ => return ListOutcome::MissingContent,
    };

    let codes = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<QrCode>(item.clone()) {
            Ok(code) => Some(code),
            Err(err) => {
                tracing::warn!(error = %err, "Skipping malformed QR code record");
                None
            }
        })
        .collect();
    ListOutcome::Loaded(codes)
}

/// QR-code API client.
#[derive(Debug, Clone)]
pub struct QrApiClient {
    http: reqwest::Client,
    base_url: String,
    endpoints: Endpoints,
}

impl QrApiClient {
    /// Creates a client from config, honouring `QRM_API_BASE_URL`.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let base_url = resolve_base_url(config)?;
        Self::new(&base_url, config.mode, config.timeout())
    }

    /// Creates a client for an explicit base URL.
    ///
    /// Refuses the production API in unit test builds, and at runtime when
    /// `QRM_BLOCK_REAL_API=1`, so tests cannot reach the real service.
    pub fn new(base_url: &str, mode: ApiMode, timeout: Option<Duration>) -> Result<Self> {
        let is_production = base_url.trim_end_matches('/') == Config::DEFAULT_BASE_URL;

        #[cfg(test)]
        if is_production {
            anyhow::bail!(
                "Tests must not use the production QR API!\n\
                 Point the client at a mock server (e.g., wiremock).\n\
                 Found base_url: {base_url}"
            );
        }

        #[cfg(not(test))]
        if is_production && std::env::var("QRM_BLOCK_REAL_API").is_ok_and(|v| v == "1") {
            anyhow::bail!(
                "QRM_BLOCK_REAL_API=1 but trying to use the production QR API!\n\
                 Set QRM_API_BASE_URL to a mock server.\n\
                 Found base_url: {base_url}"
            );
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            endpoints: Endpoints::new(base_url, mode)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Validates an API key.
    pub async fn validate(&self, api_key: &str) -> Result<ValidateOutcome, ApiError> {
        let url = with_api_key(&self.endpoints.validate, api_key);
        tracing::debug!(key = %mask_key(api_key), "Validating API key");

        let (status, body) = self.send(self.http.post(url)).await?;
        let outcome = interpret_validate(status, &body);
        tracing::debug!(status = status.as_u16(), ?outcome, "Validate response");
        Ok(outcome)
    }

    /// Fetches the QR code list for an API key.
    pub async fn list(&self, api_key: &str) -> Result<ListOutcome, ApiError> {
        let url = with_api_key(&self.endpoints.list, api_key);
        tracing::debug!(key = %mask_key(api_key), "Fetching QR code list");

        let (status, body) = self.send(self.http.get(url)).await?;
        let outcome = interpret_list(status, &body);
        match &outcome {
            ListOutcome::Loaded(codes) => {
                tracing::debug!(count = codes.len(), "QR code list loaded");
            }
            other => tracing::debug!(status = status.as_u16(), outcome = ?other, "List response"),
        }
        Ok(outcome)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<(StatusCode, Value), ApiError> {
        let response = request
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        let body = serde_json::from_str::<Value>(&text)
            .map_err(|e| ApiError::parse(format!("HTTP {status}: body is not JSON: {e}")))?;
        Ok((status, body))
    }
}
