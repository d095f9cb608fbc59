/// Days ahead of today that an event sync covers when no range is given.
pub const DEFAULT_SYNC_DAYS: i64 = 7;

/// Tokens are treated as expired this many seconds before the vendor says so.
pub const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// Used when a token response omits `expires_in`.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Longest lifetime trusted from a token response.
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 86_400;

/// Timeout for every outbound vendor call.
pub const HTTP_TIMEOUT_SECS: u64 = 30;
