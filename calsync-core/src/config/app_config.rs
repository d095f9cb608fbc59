//! Global calsync configuration.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

use super::vendors::{OutlookConfig, ZohoConfig};
use crate::constants::DEFAULT_SYNC_DAYS;
use crate::error::{CalSyncError, CalSyncResult};
use crate::retry::RetryConfig;

const ENV_PREFIX: &str = "CALSYNC";
const ENV_SEPARATOR: &str = "__";
const CONFIG_PATH_VAR: &str = "CALSYNC_CONFIG";

/// `[server]`
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> CalSyncResult<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| {
                CalSyncError::Config(format!("server.host '{}' is not an IP address", self.host))
            })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// `[sync]`
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Days ahead of today covered by an event sync without explicit bounds.
    pub window_days: i64,
}

/// Configuration assembled from, lowest precedence first: built-in defaults,
/// the TOML file at `$CALSYNC_CONFIG` or `~/.config/calsync/config.toml`, and
/// `CALSYNC__SECTION__KEY` environment variables.
///
/// Vendor credentials have no defaults and must come from the file or the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub outlook: OutlookConfig,
    pub zoho: ZohoConfig,
    pub retry: RetryConfig,
    pub sync: SyncConfig,
}

impl AppConfig {
    pub fn load() -> CalSyncResult<Self> {
        Self::load_with(Self::config_path()?, false)
    }

    /// Like [`AppConfig::load`], but with an explicit file that must exist.
    pub fn load_file(path: &Path) -> CalSyncResult<Self> {
        Self::load_with(path.to_path_buf(), true)
    }

    fn load_with(config_path: PathBuf, required: bool) -> CalSyncResult<Self> {
        let builder = Self::defaults()
            .map_err(|e| CalSyncError::Config(e.to_string()))?
            .add_source(File::from(config_path).required(required))
            .add_source(env_source());

        Self::build(builder)
    }

    pub fn config_path() -> CalSyncResult<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_VAR) {
            return Ok(PathBuf::from(path));
        }

        let config_dir = dirs::config_dir()
            .ok_or_else(|| CalSyncError::Config("Could not determine config directory".into()))?
            .join("calsync");

        Ok(config_dir.join("config.toml"))
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 4096)?
            .set_default("outlook.tenant", "common")?
            .set_default(
                "outlook.scope",
                "offline_access https://graph.microsoft.com/.default",
            )?
            .set_default("outlook.api_base", "https://graph.microsoft.com/v1.0")?
            .set_default("zoho.accounts_url", "https://accounts.zoho.com")?
            .set_default("zoho.api_base", "https://www.zohoapis.com/crm/v2")?
            .set_default("retry.max_attempts", 3)?
            .set_default("retry.base_delay_ms", 1000)?
            .set_default("retry.max_delay_ms", 30_000)?
            .set_default("sync.window_days", DEFAULT_SYNC_DAYS)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> CalSyncResult<Self> {
        let config: AppConfig = builder
            .build()
            .map_err(|e| CalSyncError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CalSyncError::Config(e.to_string()))?;

        config.outlook.validate()?;
        config.zoho.validate()?;

        Ok(config)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX).separator(ENV_SEPARATOR)
}
