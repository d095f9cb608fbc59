//! Core plumbing for the calsync ecosystem.
//!
//! This crate provides what both vendor clients and the server share:
//! - `config` for layered configuration (defaults, TOML file, environment)
//! - `token` for the per-vendor OAuth access token cache
//! - `retry` for retry-with-backoff around rate-limited calls
//! - `http` for turning non-2xx vendor responses into errors
//! - `api` for authorized, retrying calls against one vendor

pub mod api;
pub mod config;
pub mod constants;
pub mod date_range;
pub mod error;
pub mod http;
pub mod retry;
pub mod token;

pub use api::{ApiClient, AuthScheme};
pub use crate::config::AppConfig;
pub use date_range::DateRange;
pub use error::{CalSyncError, CalSyncResult};
pub use retry::{RetryPolicy, retry_with_backoff};
pub use token::{OAuthCredentials, TokenCache};
