//! Configuration types for calsync.

mod app_config;
mod vendors;

pub use app_config::{AppConfig, ServerConfig, SyncConfig};
pub use vendors::{OutlookConfig, ZohoConfig};
