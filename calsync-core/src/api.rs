//! Authorized, retrying HTTP access to one vendor API.

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::warn;

use crate::error::CalSyncResult;
use crate::http::{build_client, check_response};
use crate::retry::{RetryPolicy, retry_with_backoff};
use crate::token::{OAuthCredentials, TokenCache};

/// How the access token goes into the `Authorization` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Bearer <token>` (Microsoft Graph)
    Bearer,
    /// `Authorization: Zoho-oauthtoken <token>` (Zoho CRM)
    ZohoOAuthToken,
}

impl AuthScheme {
    fn header_value(self, token: &str) -> String {
        match self {
            AuthScheme::Bearer => format!("Bearer {token}"),
            AuthScheme::ZohoOAuthToken => format!("Zoho-oauthtoken {token}"),
        }
    }
}

pub struct ApiClient {
    service: &'static str,
    http: Client,
    tokens: TokenCache,
    scheme: AuthScheme,
    base_url: String,
    retry: RetryPolicy,
}

impl ApiClient {
    pub fn new(
        service: &'static str,
        credentials: OAuthCredentials,
        scheme: AuthScheme,
        base_url: &str,
        retry: RetryPolicy,
    ) -> CalSyncResult<Self> {
        let http = build_client()?;
        let tokens = TokenCache::new(service, credentials, http.clone());

        Ok(ApiClient {
            service,
            http,
            tokens,
            scheme,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &TokenCache {
        &self.tokens
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Absolute URL for a path relative to the API base.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send the request built by `build` with a valid token, retrying per the
    /// retry policy. Only 2xx responses are returned.
    pub async fn send<F>(&self, operation: &str, build: F) -> CalSyncResult<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let build = &build;
        retry_with_backoff(&self.retry, operation, move || async move {
            let response = self.send_authorized(build).await?;
            check_response(self.service, response).await
        })
        .await
    }

    /// A 401 means the cached token was revoked early: refresh once and resend.
    async fn send_authorized<F>(&self, build: &F) -> CalSyncResult<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let token = self.tokens.access_token().await?;
        let response = build(&self.http)
            .header(AUTHORIZATION, self.scheme.header_value(&token))
            .send()
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        warn!(service = self.service, "Access token rejected, refreshing");
        self.tokens.invalidate();
        let token = self.tokens.access_token().await?;

        Ok(build(&self.http)
            .header(AUTHORIZATION, self.scheme.header_value(&token))
            .send()
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(server: &mockito::ServerGuard, scheme: AuthScheme) -> ApiClient {
        let credentials = OAuthCredentials {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            refresh_token: "refresh".to_string(),
            token_url: format!("{}/token", server.url()),
            scope: None,
        };
        ApiClient::new(
            "test",
            credentials,
            scheme,
            &format!("{}/api/", server.url()),
            RetryPolicy::immediate(3),
        )
        .unwrap()
    }

    async fn token_mock(
        server: &mut mockito::ServerGuard,
        token: &str,
        hits: usize,
    ) -> mockito::Mock {
        server
            .mock("POST", "/token")
            .with_status(200)
            .with_body(format!(r#"{{"access_token":"{token}","expires_in":3600}}"#))
            .expect(hits)
            .create_async()
            .await
    }

    #[test]
    fn url_joins_without_double_slashes() {
        let credentials = OAuthCredentials {
            client_id: String::new(),
            client_secret: String::new(),
            refresh_token: String::new(),
            token_url: "http://localhost/token".to_string(),
            scope: None,
        };
        let api = ApiClient::new(
            "test",
            credentials,
            AuthScheme::Bearer,
            "https://graph.microsoft.com/v1.0/",
            RetryPolicy::default(),
        )
        .unwrap();

        assert_eq!(api.url("/me/events"), "https://graph.microsoft.com/v1.0/me/events");
        assert_eq!(api.url("$batch"), "https://graph.microsoft.com/v1.0/$batch");
    }

    #[tokio::test]
    async fn uses_zoho_authorization_scheme() {
        let mut server = mockito::Server::new_async().await;
        let tokens = token_mock(&mut server, "zt", 1).await;
        let call = server
            .mock("GET", "/api/Leads")
            .match_header("authorization", "Zoho-oauthtoken zt")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let api = client_for(&server, AuthScheme::ZohoOAuthToken);
        api.send("list leads", |http| http.get(api.url("Leads"))).await.unwrap();

        tokens.assert_async().await;
        call.assert_async().await;
    }

    #[tokio::test]
    async fn rate_limited_call_is_retried() {
        let mut server = mockito::Server::new_async().await;
        let _tokens = token_mock(&mut server, "t", 1).await;
        let limited = server
            .mock("GET", "/api/me/events")
            .with_status(429)
            .with_header("Retry-After", "0")
            .expect(1)
            .create_async()
            .await;

        let ok = server
            .mock("GET", "/api/me/events")
            .with_status(200)
            .with_body(r#"{"value":[]}"#)
            .expect(1)
            .create_async()
            .await;

        let api = client_for(&server, AuthScheme::Bearer);
        let response = api
            .send("list events", |http| http.get(api.url("me/events")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        limited.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn unauthorized_refreshes_token_once() {
        let mut server = mockito::Server::new_async().await;
        let tokens = token_mock(&mut server, "t", 2).await;
        let rejected = server
            .mock("GET", "/api/me")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;
        let accepted = server
            .mock("GET", "/api/me")
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        let api = client_for(&server, AuthScheme::Bearer);
        let response = api.send("me", |http| http.get(api.url("me"))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        tokens.assert_async().await;
        rejected.assert_async().await;
        accepted.assert_async().await;
    }
}
