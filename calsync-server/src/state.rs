use std::sync::Arc;

use calsync_core::config::SyncConfig;
use calsync_core::{AppConfig, CalSyncResult, RetryPolicy};
use calsync_provider_outlook::OutlookClient;
use calsync_provider_zoho::ZohoClient;

/// Shared application state. Each client owns its token cache, so cloning the
/// state shares one token per vendor across all requests.
#[derive(Clone)]
pub struct AppState {
    pub outlook: Arc<OutlookClient>,
    pub zoho: Arc<ZohoClient>,
    pub sync: SyncConfig,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> CalSyncResult<Self> {
        let retry = RetryPolicy::from(&config.retry);

        Ok(AppState {
            outlook: Arc::new(OutlookClient::new(&config.outlook, retry)?),
            zoho: Arc::new(ZohoClient::new(&config.zoho, retry)?),
            sync: config.sync.clone(),
        })
    }
}
