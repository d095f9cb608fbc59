//! Per-vendor connection settings.

use serde::Deserialize;

use crate::error::{CalSyncError, CalSyncResult};
use crate::token::OAuthCredentials;

/// `[outlook]`: Microsoft Graph app registration and the delegated refresh token.
#[derive(Debug, Clone, Deserialize)]
pub struct OutlookConfig {
    pub tenant: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub scope: String,
    pub api_base: String,
    /// Overrides the token endpoint derived from `tenant`.
    #[serde(default)]
    pub token_url: Option<String>,
}

impl OutlookConfig {
    pub fn token_url(&self) -> String {
        self.token_url.clone().unwrap_or_else(|| {
            format!(
                "https://login.microsoftonline.com/{}/oauth2/v2.0/token",
                self.tenant
            )
        })
    }

    pub fn credentials(&self) -> OAuthCredentials {
        OAuthCredentials {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            refresh_token: self.refresh_token.clone(),
            token_url: self.token_url(),
            scope: Some(self.scope.clone()),
        }
    }

    pub(crate) fn validate(&self) -> CalSyncResult<()> {
        require("outlook.client_id", &self.client_id)?;
        require("outlook.client_secret", &self.client_secret)?;
        require("outlook.refresh_token", &self.refresh_token)
    }
}

/// `[zoho]`: Zoho CRM self-client credentials. `accounts_url` and `api_base`
/// select the data center (`.com`, `.eu`, `.in`, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct ZohoConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub accounts_url: String,
    pub api_base: String,
}

impl ZohoConfig {
    pub fn credentials(&self) -> OAuthCredentials {
        OAuthCredentials {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            refresh_token: self.refresh_token.clone(),
            token_url: format!("{}/oauth/v2/token", self.accounts_url.trim_end_matches('/')),
            scope: None,
        }
    }

    pub(crate) fn validate(&self) -> CalSyncResult<()> {
        require("zoho.client_id", &self.client_id)?;
        require("zoho.client_secret", &self.client_secret)?;
        require("zoho.refresh_token", &self.refresh_token)
    }
}

fn require(key: &str, value: &str) -> CalSyncResult<()> {
    if value.trim().is_empty() {
        return Err(CalSyncError::Config(format!("{key} must not be empty")));
    }
    Ok(())
}
