use super::{DispatchResponse, HeaderMap};
use crate::error::SyncCastError;
use ureq::ErrorKind;

const REDACTED: &str = "<redacted>";

pub(super) fn read_body(response: ureq::Response) -> std::io::Result<String> {
    response.into_string()
}

/// Sorts a response ureq did not flag as an error. Anything outside 2xx
/// (an unfollowed redirect, for one) is an `APIError`.
pub(super) fn classify_success(
    url: &str,
    response: ureq::Response,
) -> Result<DispatchResponse, SyncCastError> {
    let status = response.status();
    let declared_json = response
        .header("Content-Type")
        .map(|value| value.to_ascii_lowercase().contains("json"))
        .unwrap_or(false);
    let body = read_body(response).map_err(|err| unreadable_body(url, status, err))?;

    if !(200..300).contains(&status) {
        return Err(SyncCastError::api(format!("unexpected status {status}"))
            .with_detail("status_code", status)
            .with_detail("body", body)
            .with_detail("url", url));
    }
    if body.trim().is_empty() {
        return Ok(DispatchResponse::Text(body));
    }
    match serde_json::from_str(&body) {
        Ok(value) => Ok(DispatchResponse::Json(value)),
        Err(err) if declared_json => Err(SyncCastError::api(format!(
            "malformed json response: {err}"
        ))
        .with_detail("status_code", status)
        .with_detail("body", body)
        .with_detail("url", url)
        .with_source(err)),
        Err(_) => Ok(DispatchResponse::Text(body)),
    }
}

/// A response arrived but its body could not be read.
pub(super) fn unreadable_body(url: &str, status: u16, err: std::io::Error) -> SyncCastError {
    SyncCastError::api(format!("failed to read response body: {err}"))
        .with_detail("status_code", status)
        .with_detail("url", url)
        .with_detail("error", err.to_string())
        .with_source(err)
}

/// `Retry-After` in whole seconds, as milliseconds. Date forms are ignored.
pub(super) fn retry_after_ms(response: &ureq::Response) -> Option<u64> {
    response
        .header("Retry-After")
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(|seconds| seconds.saturating_mul(1_000))
}

pub(super) fn is_sensitive_header(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    name == "authorization" || name.contains("secret") || name.contains("token")
}

pub(super) fn redact_headers(headers: &HeaderMap) -> HeaderMap {
    headers
        .iter()
        .map(|(name, value)| {
            let value = if is_sensitive_header(name) { REDACTED.to_owned() } else { value.clone() };
            (name.clone(), value)
        })
        .collect()
}

/// Transport kinds caused by the request itself; retrying cannot help.
pub(super) fn is_terminal(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::InvalidUrl
            | ErrorKind::UnknownScheme
            | ErrorKind::InvalidProxyUrl
            | ErrorKind::ProxyUnauthorized
            | ErrorKind::InsecureRequestHttpsOnly
    )
}

fn category(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::ConnectionFailed => "connection refused or api unavailable",
        ErrorKind::Dns => "dns lookup failed",
        ErrorKind::Io => "network i/o error",
        ErrorKind::InvalidUrl | ErrorKind::UnknownScheme => "unusable api url",
        ErrorKind::TooManyRedirects => "too many redirects",
        ErrorKind::ProxyConnect | ErrorKind::ProxyUnauthorized | ErrorKind::InvalidProxyUrl => {
            "proxy failure"
        }
        ErrorKind::InsecureRequestHttpsOnly => "plain http refused by https-only agent",
        ErrorKind::BadStatus | ErrorKind::BadHeader | ErrorKind::HTTP => {
            "malformed response from api"
        }
    }
}

/// One line for logs and `details.error`: the kind's category plus whatever
/// ureq and the underlying io error said, without repeats.
pub(super) fn summarize_transport_error(transport: &ureq::Transport) -> String {
    let mut parts: Vec<String> = Vec::new();
    let source = std::error::Error::source(transport).map(ToString::to_string);
    for text in transport.message().map(str::to_owned).into_iter().chain(source) {
        let cleaned = strip_ureq_prefixes(&text);
        if !cleaned.is_empty() && !parts.contains(&cleaned) {
            parts.push(cleaned);
        }
    }
    let category = category(transport.kind());
    if parts.is_empty() {
        category.to_owned()
    } else {
        format!("{category}: {}", parts.join(": "))
    }
}

const UREQ_PREFIXES: [&str; 3] = ["network error:", "connection failed:", "error encountered:"];

fn strip_ureq_prefixes(input: &str) -> String {
    let mut text = input.trim();
    while let Some(prefix) = UREQ_PREFIXES.iter().find(|prefix| {
        text.get(..prefix.len()).is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    }) {
        text = text[prefix.len()..].trim_start();
    }
    text.to_owned()
}
