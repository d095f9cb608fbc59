//! Helpers for reading vendor HTTP responses.

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::constants::HTTP_TIMEOUT_SECS;
use crate::error::{CalSyncError, CalSyncResult};

/// Shared client settings for every vendor.
pub fn build_client() -> CalSyncResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .user_agent(concat!("calsync/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(CalSyncError::Http)
}

/// Pass 2xx responses through; turn anything else into `CalSyncError::Upstream`
/// carrying the vendor's body and any `Retry-After` hint.
pub async fn check_response(service: &'static str, response: Response) -> CalSyncResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = parse_retry_after(response.headers());
    let body = response.text().await.unwrap_or_default();

    Err(CalSyncError::Upstream {
        service,
        status: status.as_u16(),
        body,
        retry_after,
    })
}

/// Decode a JSON body, treating an empty body (e.g. `204 No Content`) as `T::default()`.
pub async fn read_json_or_default<T>(service: &'static str, response: Response) -> CalSyncResult<T>
where
    T: DeserializeOwned + Default,
{
    let bytes = response.bytes().await?;
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(T::default());
    }
    serde_json::from_slice(&bytes).map_err(|e| CalSyncError::decode(service, e))
}

/// Decode a JSON body that must be present.
pub async fn read_json<T: DeserializeOwned>(
    service: &'static str,
    response: Response,
) -> CalSyncResult<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| CalSyncError::decode(service, e))
}

/// `Retry-After` in delta-seconds form. HTTP-date values are ignored.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && (0.0..86_400.0).contains(secs))
        .map(Duration::from_secs_f64)
}
