//! Authenticated HTTP calls against the broker-fronting API.
//!
//! Every attempt is bounded by the configured timeout. Transport failures and
//! the statuses in [`RETRYABLE_STATUSES`] are retried up to `retries`
//! times, so one call takes at most `timeout * (retries + 1)` plus the backoff
//! sleeps, each of which is itself capped at `timeout`. Sleeps within one call
//! never get shorter. A bad url scheme or proxy setting fails on the first
//! attempt, and any non-2xx response that is not retried is an `APIError`.

mod retry;
mod transport;

pub use retry::{RetryPolicy, RETRYABLE_STATUSES};

use crate::error::SyncCastError;
use crate::types::SyncCastConfig;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

pub type HeaderMap = BTreeMap<String, String>;
/// Query string pairs, appended in key order.
pub type QueryParams = BTreeMap<String, String>;

pub const DEFAULT_AUTH_HEADER: &str = "Authorization";
pub const DEFAULT_APP_ID_HEADER: &str = "X-App-Id";
pub const DEFAULT_APP_SECRET_HEADER: &str = "X-App-Secret";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded body of a 2xx response.
#[derive(Clone, Debug, PartialEq)]
pub enum DispatchResponse {
    Json(JsonValue),
    Text(String),
}

impl DispatchResponse {
    pub fn as_json(&self) -> Option<&JsonValue> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    pub fn into_value(self) -> JsonValue {
        match self {
            Self::Json(value) => value,
            Self::Text(text) => JsonValue::String(text),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DispatcherConfig {
    pub base_url: String,
    pub headers: HeaderMap,
    pub timeout: Duration,
    pub retries: u32,
    pub backoff_factor: f64,
}

impl From<&SyncCastConfig> for DispatcherConfig {
    fn from(config: &SyncCastConfig) -> Self {
        Self {
            base_url: config.api_base.trim_end_matches('/').to_owned(),
            headers: HeaderMap::new(),
            timeout: config.timeout(),
            retries: config.max_network_retries,
            backoff_factor: config.backoff_factor,
        }
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self::from(&SyncCastConfig::default())
    }
}

/// Safe to share across threads once configured. The `with_*` mutators take
/// `&mut self` and are meant for setup before concurrent use.
#[derive(Debug)]
pub struct Dispatcher {
    config: DispatcherConfig,
    agent: ureq::Agent,
}

impl Dispatcher {
    /// Builds a dispatcher from `config`, injecting app credentials when both are present.
    pub fn new(config: &SyncCastConfig) -> Self {
        let mut dispatcher = Self::from_config(DispatcherConfig::from(config));
        if let Some((app_id, app_secret)) = config.credentials() {
            dispatcher.with_secret(app_id, app_secret);
        }
        dispatcher
    }

    pub fn from_config(mut config: DispatcherConfig) -> Self {
        config.base_url = config.base_url.trim_end_matches('/').to_owned();
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self { config, agent }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.config.headers
    }

    pub fn with_base_url(&mut self, base_url: &str) -> &mut Self {
        self.config.base_url = base_url.trim_end_matches('/').to_owned();
        self
    }

    pub fn with_headers<I, K, V>(&mut self, headers: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.config
            .headers
            .extend(headers.into_iter().map(|(name, value)| (name.into(), value.into())));
        self
    }

    pub fn with_auth_token(&mut self, token: &str) -> &mut Self {
        self.with_auth_token_header(token, DEFAULT_AUTH_HEADER)
    }

    pub fn with_auth_token_header(&mut self, token: &str, header: &str) -> &mut Self {
        self.config.headers.insert(header.to_owned(), format!("Bearer {token}"));
        self
    }

    pub fn with_secret(&mut self, app_id: &str, app_secret: &str) -> &mut Self {
        self.with_secret_headers(app_id, app_secret, DEFAULT_APP_ID_HEADER, DEFAULT_APP_SECRET_HEADER)
    }

    pub fn with_secret_headers(
        &mut self,
        app_id: &str,
        app_secret: &str,
        id_header: &str,
        secret_header: &str,
    ) -> &mut Self {
        self.config.headers.insert(id_header.to_owned(), app_id.to_owned());
        self.config.headers.insert(secret_header.to_owned(), app_secret.to_owned());
        self
    }

    pub fn with_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.config.timeout = timeout;
        self
    }

    pub fn with_retries(&mut self, retries: u32) -> &mut Self {
        self.config.retries = retries;
        self
    }

    pub fn with_backoff_factor(&mut self, backoff_factor: f64) -> &mut Self {
        self.config.backoff_factor = backoff_factor;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.config.retries, self.config.backoff_factor, self.config.timeout)
    }

    /// Joins base url and endpoint with exactly one `/`.
    pub fn url_for(&self, endpoint: &str) -> String {
        let endpoint = endpoint.trim_start_matches('/');
        if endpoint.is_empty() {
            return self.config.base_url.clone();
        }
        format!("{}/{}", self.config.base_url, endpoint)
    }

    pub fn post(
        &self,
        endpoint: &str,
        body: Option<&JsonValue>,
        headers: Option<&HeaderMap>,
    ) -> Result<DispatchResponse, SyncCastError> {
        self.execute(Method::Post, endpoint, None, body, headers)
    }

    pub fn put(
        &self,
        endpoint: &str,
        body: Option<&JsonValue>,
        headers: Option<&HeaderMap>,
    ) -> Result<DispatchResponse, SyncCastError> {
        self.execute(Method::Put, endpoint, None, body, headers)
    }

    pub fn get(
        &self,
        endpoint: &str,
        query: Option<&QueryParams>,
        headers: Option<&HeaderMap>,
    ) -> Result<DispatchResponse, SyncCastError> {
        self.execute(Method::Get, endpoint, query, None, headers)
    }

    pub fn delete(
        &self,
        endpoint: &str,
        headers: Option<&HeaderMap>,
    ) -> Result<DispatchResponse, SyncCastError> {
        self.execute(Method::Delete, endpoint, None, None, headers)
    }

    pub fn execute(
        &self,
        method: Method,
        endpoint: &str,
        query: Option<&QueryParams>,
        body: Option<&JsonValue>,
        headers: Option<&HeaderMap>,
    ) -> Result<DispatchResponse, SyncCastError> {
        let url = self.url_for(endpoint);
        let mut merged = self.config.headers.clone();
        if let Some(headers) = headers {
            merged.extend(headers.iter().map(|(name, value)| (name.clone(), value.clone())));
        }
        let body = body.map(JsonValue::to_string);
        let policy = self.retry_policy();
        log::debug!(
            "dispatch: {method} {url} headers={:?}",
            transport::redact_headers(&merged)
        );

        let mut attempt = 0_u32;
        let mut delay = Duration::ZERO;
        loop {
            let mut request = self.agent.request(method.as_str(), &url).timeout(self.config.timeout);
            for (name, value) in &merged {
                request = request.set(name, value);
            }
            for (name, value) in query.into_iter().flatten() {
                request = request.query(name, value);
            }
            let result = match body.as_deref() {
                Some(body) => request.set("Content-Type", "application/json").send_string(body),
                None => request.call(),
            };

            match result {
                Ok(response) => return transport::classify_success(&url, response),
                Err(ureq::Error::Status(status, response)) => {
                    if policy.retries_status(status) && policy.allows_retry(attempt) {
                        let hint = transport::retry_after_ms(&response);
                        delay = policy.next_delay(attempt, hint, delay);
                        log::warn!(
                            "dispatch: {method} {url} returned {status}; retry {} of {} in {delay:?}",
                            attempt + 1,
                            policy.retries()
                        );
                        std::thread::sleep(delay);
                        attempt += 1;
                        continue;
                    }
                    log::error!("dispatch: {method} {url} failed with status {status}");
                    let err = SyncCastError::api(format!("request failed with status {status}"))
                        .with_detail("status_code", status)
                        .with_detail("url", url.as_str())
                        .with_detail("attempts", attempt + 1);
                    return Err(match transport::read_body(response) {
                        Ok(body) => err.with_detail("body", body),
                        Err(read_err) => err
                            .with_detail("body", "")
                            .with_detail("body_error", read_err.to_string())
                            .with_source(read_err),
                    });
                }
                Err(ureq::Error::Transport(transport_err)) => {
                    let summary = transport::summarize_transport_error(&transport_err);
                    let terminal = transport::is_terminal(transport_err.kind());
                    if !terminal && policy.allows_retry(attempt) {
                        delay = policy.next_delay(attempt, None, delay);
                        log::warn!(
                            "dispatch: {method} {url} failed ({summary}); retry {} of {} in {delay:?}",
                            attempt + 1,
                            policy.retries()
                        );
                        std::thread::sleep(delay);
                        attempt += 1;
                        continue;
                    }
                    log::error!("dispatch: {method} {url} failed: {summary}");
                    return Err(SyncCastError::dispatch(format!("request failed: {summary}"))
                        .with_detail("url", url)
                        .with_detail("error", summary)
                        .with_detail("attempts", attempt + 1)
                        .with_source(transport_err));
                }
            }
        }
    }
}
