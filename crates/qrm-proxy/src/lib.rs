//! Development proxy.
//!
//! Serves the local API paths (`/api/`, `/api/list/`) and forwards them to the
//! remote QR API with the paths rewritten (see `rewrite`). The `Host` header is
//! replaced by the target's, so the remote sees a same-origin request.

pub mod rewrite;

use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::header::{self, HeaderMap, HeaderName};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use qrm_core::config::ProxyConfig;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use url::Url;

pub use rewrite::{RULES, RewriteRule, rewrite_path};

/// Maximum request body forwarded upstream.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Headers that describe one connection and must not be forwarded.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Resolved proxy settings.
#[derive(Debug, Clone)]
pub struct ProxySettings {
    pub listen: SocketAddr,
    pub target: Url,
    pub allowed_hosts: Vec<String>,
    pub timeout: Option<Duration>,
}

impl ProxySettings {
    /// Builds settings from config, with optional command-line overrides.
    pub fn from_config(
        config: &ProxyConfig,
        listen: Option<&str>,
        target: Option<&str>,
    ) -> Result<Self> {
        let listen = listen.unwrap_or(&config.listen);
        let listen: SocketAddr = listen
            .parse()
            .with_context(|| format!("Invalid proxy listen address: {listen}"))?;

        let target = target.unwrap_or(&config.target);
        let target =
            Url::parse(target).with_context(|| format!("Invalid proxy target URL: {target}"))?;
        if !matches!(target.scheme(), "http" | "https") || target.host_str().is_none() {
            anyhow::bail!("Proxy target must be an http(s) URL with a host: {target}");
        }

        let timeout =
            (config.timeout_secs > 0).then(|| Duration::from_secs(u64::from(config.timeout_secs)));

        Ok(Self {
            listen,
            target,
            allowed_hosts: config.allowed_hosts.clone(),
            timeout,
        })
    }
}

#[derive(Clone)]
struct ProxyState {
    client: reqwest::Client,
    target: Arc<Url>,
    allowed_hosts: Arc<Vec<String>>,
}

/// Builds the proxy router.
pub fn router(settings: &ProxySettings) -> Result<Router> {
    let mut builder = reqwest::Client::builder().redirect(reqwest::redirect::Policy::none());
    if let Some(timeout) = settings.timeout {
        builder = builder.timeout(timeout);
    }
    let client = builder.build().context("Failed to build proxy HTTP client")?;

    let state = ProxyState {
        client,
        target: Arc::new(settings.target.clone()),
        allowed_hosts: Arc::new(settings.allowed_hosts.clone()),
    };

    let mut app = Router::new()
        .fallback(forward)
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES));
    if let Some(timeout) = settings.timeout {
        app = app.layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            timeout,
        ));
    }
    Ok(app)
}

/// Binds the listen address and serves until Ctrl+C.
pub async fn run(settings: ProxySettings) -> Result<()> {
    let listener = TcpListener::bind(settings.listen)
        .await
        .with_context(|| format!("Failed to bind {}", settings.listen))?;
    serve(listener, &settings, shutdown_signal()).await
}

/// Serves on an already-bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, settings: &ProxySettings, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(settings)?;
    let local = listener.local_addr()?;
    tracing::info!(listen = %local, target = %settings.target, "Proxy listening");
    for rule in RULES {
        tracing::info!(from = rule.prefix, to = rule.replacement, "Proxy rule");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Proxy server failed")?;
    tracing::info!("Proxy stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

fn text_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, message.into()).into_response()
}

async fn forward(State(state): State<ProxyState>, request: Request) -> Response {
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);
    if let Some(host) = host.as_deref()
        && !host_allowed(host, &state.allowed_hosts)
    {
        tracing::warn!(%host, "Rejected request for a host that is not allowed");
        return text_response(
            StatusCode::FORBIDDEN,
            format!(
                "Blocked request. This host (\"{host}\") is not allowed.\n\
                 Add it to proxy.allowed_hosts in config.toml."
            ),
        );
    }

    let original = request.uri().clone();
    let Some(upstream) = upstream_url(&state.target, &original) else {
        tracing::debug!(uri = %original, "No proxy rule matches");
        return text_response(StatusCode::NOT_FOUND, "Not found");
    };

    let (parts, body) = request.into_parts();
    let body: Bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(error = %err, "Failed to read request body");
            return text_response(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
        }
    };

    tracing::info!(method = %parts.method, from = %original, to = %upstream, "Proxying request");

    let response = state
        .client
        .request(parts.method, upstream.clone())
        .headers(forward_headers(&parts.headers))
        .body(body)
        .send()
        .await;

    let response = match response {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(to = %upstream, error = %err, "Upstream request failed");
            return text_response(StatusCode::BAD_GATEWAY, "Bad gateway: upstream request failed");
        }
    };

    let status = response.status();
    let headers = forward_headers(response.headers());
    match response.bytes().await {
        Ok(bytes) => {
            tracing::debug!(status = status.as_u16(), bytes = bytes.len(), "Upstream responded");
            let mut out = Response::new(Body::from(bytes));
            *out.status_mut() = status;
            *out.headers_mut() = headers;
            out
        }
        Err(err) => {
            tracing::warn!(to = %upstream, error = %err, "Failed to read upstream body");
            text_response(StatusCode::BAD_GATEWAY, "Bad gateway: upstream body unreadable")
        }
    }
}

/// Remote URL for a local request URI, or `None` if no rule matches.
pub fn upstream_url(target: &Url, uri: &Uri) -> Option<Url> {
    let rewritten = rewrite_path(uri.path())?;
    let mut url = target.clone();
    let base = target.path().trim_end_matches('/');
    url.set_path(&format!("{base}{rewritten}"));
    url.set_query(uri.query());
    Some(url)
}

/// Copies end-to-end headers. `Host` and `Content-Length` are recomputed by
/// the client for the new request.
fn forward_headers(source: &HeaderMap) -> HeaderMap {
    let mut connection_tokens: Vec<HeaderName> = source
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|token| HeaderName::try_from(token.trim()).ok())
        .collect();
    connection_tokens.extend(HOP_BY_HOP.iter().map(|h| HeaderName::from_static(h)));
    connection_tokens.push(header::HOST);
    connection_tokens.push(header::CONTENT_LENGTH);

    let mut headers = HeaderMap::new();
    for (name, value) in source {
        if !connection_tokens.contains(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}

/// Hostname part of a `Host` header value.
fn hostname(host: &str) -> &str {
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

/// Loopback names, IP literals and configured hosts are allowed. A configured
/// entry starting with `.` also allows its subdomains.
pub fn host_allowed(host: &str, allowed_hosts: &[String]) -> bool {
    let name = hostname(host).trim_end_matches('.').to_ascii_lowercase();
    if name == "localhost" || name.ends_with(".localhost") || name.parse::<IpAddr>().is_ok() {
        return true;
    }
    allowed_hosts.iter().any(|entry| {
        let entry = entry.trim().to_ascii_lowercase();
        match entry.strip_prefix('.') {
            Some(domain) => name == domain || name.ends_with(&format!(".{domain}")),
            None => name == entry,
        }
    })
}
