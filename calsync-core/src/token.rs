//! Per-vendor OAuth access token cache.
//!
//! Each vendor gets one `TokenCache`. It hands out the cached bearer token
//! while it is fresh and redeems the refresh token otherwise. Nothing is
//! persisted; the cache starts empty on every process start.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::constants::{
    DEFAULT_TOKEN_LIFETIME_SECS, MAX_TOKEN_LIFETIME_SECS, TOKEN_EXPIRY_MARGIN_SECS,
};
use crate::error::{CalSyncError, CalSyncResult};
use crate::http::{check_response, read_json};

/// Client credentials plus the long-lived refresh token for one vendor.
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub token_url: String,
    pub scope: Option<String>,
}

/// A bearer token and the instant we stop trusting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// `expires_in` is shortened by a safety margin so a token never expires mid-request,
    /// and capped at one day.
    pub fn new(access_token: String, expires_in: i64, now: DateTime<Utc>) -> Self {
        let lifetime = expires_in
            .saturating_sub(TOKEN_EXPIRY_MARGIN_SECS)
            .clamp(0, MAX_TOKEN_LIFETIME_SECS);
        let expires_at = Duration::try_seconds(lifetime)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .unwrap_or(now);

        CachedToken {
            access_token,
            expires_at,
        }
    }

    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<serde_json::Value>,
    refresh_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl TokenResponse {
    /// Microsoft and Zoho send a number; some gateways send a string.
    fn lifetime_secs(&self) -> i64 {
        match &self.expires_in {
            Some(serde_json::Value::Number(n)) => n.as_i64(),
            Some(serde_json::Value::String(s)) => s.parse().ok(),
            _ => None,
        }
        .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)
    }
}

struct CacheState {
    token: Option<CachedToken>,
    refresh_token: String,
}

pub struct TokenCache {
    service: &'static str,
    http: Client,
    credentials: OAuthCredentials,
    state: Mutex<CacheState>,
}

impl TokenCache {
    pub fn new(service: &'static str, credentials: OAuthCredentials, http: Client) -> Self {
        let state = CacheState {
            token: None,
            refresh_token: credentials.refresh_token.clone(),
        };

        TokenCache {
            service,
            http,
            credentials,
            state: Mutex::new(state),
        }
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    /// Return the cached token if fresh, else refresh and cache a new one.
    pub async fn access_token(&self) -> CalSyncResult<String> {
        if let Some(token) = self.cached() {
            if token.is_fresh_at(Utc::now()) {
                debug!(service = self.service, "Using cached access token");
                return Ok(token.access_token);
            }
        }

        let token = self.refresh().await?;
        Ok(token.access_token)
    }

    /// Forget the cached token so the next call refreshes (e.g. after a 401).
    pub fn invalidate(&self) {
        self.lock().token = None;
    }

    pub fn cached(&self) -> Option<CachedToken> {
        self.lock().token.clone()
    }

    async fn refresh(&self) -> CalSyncResult<CachedToken> {
        let refresh_token = self.lock().refresh_token.clone();

        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", refresh_token.as_str()),
        ];
        if let Some(scope) = &self.credentials.scope {
            form.push(("scope", scope.as_str()));
        }

        let response = self
            .http
            .post(&self.credentials.token_url)
            .form(&form)
            .send()
            .await?;
        let response = check_response(self.service, response).await?;
        let body: TokenResponse = read_json(self.service, response).await?;

        // Zoho reports bad grants as HTTP 200 with an `error` field
        if let Some(error) = &body.error {
            let message = match &body.error_description {
                Some(desc) => format!("{error}: {desc}"),
                None => error.clone(),
            };
            return Err(CalSyncError::Auth {
                service: self.service,
                message,
            });
        }

        let lifetime = body.lifetime_secs();
        let Some(access_token) = body.access_token else {
            return Err(CalSyncError::Auth {
                service: self.service,
                message: "token response has no access_token".to_string(),
            });
        };

        let token = CachedToken::new(access_token, lifetime, Utc::now());

        let mut state = self.lock();
        // Microsoft rotates refresh tokens on every redemption
        if let Some(rotated) = body.refresh_token.filter(|t| !t.is_empty()) {
            state.refresh_token = rotated;
        }
        state.token = Some(token.clone());
        drop(state);

        info!(
            service = self.service,
            expires_at = %token.expires_at,
            "Refreshed access token"
        );

        Ok(token)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn cache_for(server: &mockito::ServerGuard) -> TokenCache {
        let credentials = OAuthCredentials {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            refresh_token: "rt-1".to_string(),
            token_url: format!("{}/oauth/token", server.url()),
            scope: None,
        };
        TokenCache::new("zoho", credentials, Client::new())
    }

    #[test]
    fn margin_is_applied_and_clamped() {
        let now = Utc::now();
        let token = CachedToken::new("t".into(), 3600, now);
        assert_eq!(token.expires_at, now + Duration::seconds(3540));
        assert!(token.is_fresh_at(now));

        let short = CachedToken::new("t".into(), 30, now);
        assert_eq!(short.expires_at, now);
        assert!(!short.is_fresh_at(now));
    }

    #[test]
    fn extreme_lifetimes_are_bounded() {
        let now = Utc::now();

        let huge = CachedToken::new("t".into(), i64::MAX, now);
        assert_eq!(huge.expires_at, now + Duration::seconds(MAX_TOKEN_LIFETIME_SECS));

        let negative = CachedToken::new("t".into(), i64::MIN, now);
        assert_eq!(negative.expires_at, now);
    }

    #[tokio::test]
    async fn oversized_expires_in_from_vendor_is_capped() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/oauth/token")
            .with_status(200)
            .with_body(r#"{"access_token":"at","expires_in":9223372036854775807}"#)
            .create_async()
            .await;

        let cache = cache_for(&server);
        let before = Utc::now();
        assert_eq!(cache.access_token().await.unwrap(), "at");

        let expires_at = cache.cached().unwrap().expires_at;
        assert!(expires_at <= Utc::now() + Duration::seconds(MAX_TOKEN_LIFETIME_SECS));
        assert!(expires_at > before);
    }

    #[tokio::test]
    async fn missing_expires_in_defaults_to_an_hour() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/oauth/token")
            .with_status(200)
            .with_body(r#"{"access_token":"at"}"#)
            .create_async()
            .await;

        let cache = cache_for(&server);
        let before = Utc::now();
        cache.access_token().await.unwrap();
        let after = Utc::now();

        let lifetime = Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS - TOKEN_EXPIRY_MARGIN_SECS);
        let expires_at = cache.cached().unwrap().expires_at;
        assert!(expires_at >= before + lifetime);
        assert!(expires_at <= after + lifetime);
    }

    #[tokio::test]
    async fn fresh_token_is_reused_without_network_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth/token")
            .match_body(Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"at-1","expires_in":3600,"api_domain":"zohoapis.com"}"#)
            .expect(1)
            .create_async()
            .await;

        let cache = cache_for(&server);
        assert_eq!(cache.access_token().await.unwrap(), "at-1");
        assert_eq!(cache.access_token().await.unwrap(), "at-1");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn invalidate_forces_refresh_with_rotated_token() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("POST", "/oauth/token")
            .match_body(Matcher::UrlEncoded("refresh_token".into(), "rt-1".into()))
            .with_status(200)
            .with_body(r#"{"access_token":"at-1","expires_in":3600,"refresh_token":"rt-2"}"#)
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("POST", "/oauth/token")
            .match_body(Matcher::UrlEncoded("refresh_token".into(), "rt-2".into()))
            .with_status(200)
            .with_body(r#"{"access_token":"at-2","expires_in":"3600"}"#)
            .expect(1)
            .create_async()
            .await;

        let cache = cache_for(&server);
        assert_eq!(cache.access_token().await.unwrap(), "at-1");
        cache.invalidate();
        assert!(cache.cached().is_none());
        assert_eq!(cache.access_token().await.unwrap(), "at-2");

        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn error_field_in_ok_response_is_auth_failure() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/oauth/token")
            .with_status(200)
            .with_body(r#"{"error":"invalid_code"}"#)
            .create_async()
            .await;

        let cache = cache_for(&server);
        let err = cache.access_token().await.unwrap_err();

        assert!(matches!(err, CalSyncError::Auth { message, .. } if message == "invalid_code"));
        assert!(cache.cached().is_none());
    }

    #[tokio::test]
    async fn rejected_refresh_carries_upstream_body() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/oauth/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant","error_description":"AADSTS70000"}"#)
            .create_async()
            .await;

        let cache = cache_for(&server);
        let err = cache.access_token().await.unwrap_err();

        assert_eq!(err.status(), Some(400));
        assert!(err.upstream_body().unwrap().contains("invalid_grant"));
    }
}
