//! Keys under which session state is persisted.
//!
//! Each key is read and written independently; there is no transactional
//! guarantee across keys.

/// Access token.
pub const ACCESS_TOKEN: &str = "chef_bot_token";

/// Refresh token.
pub const REFRESH_TOKEN: &str = "chef_bot_refresh_token";

/// Access-token expiry as Unix epoch milliseconds.
pub const TOKEN_EXPIRY: &str = "chef_bot_token_expiry";

/// Cached user record JSON.
pub const USER: &str = "chef_bot_user";

/// Device identity JSON. Never cleared by logout.
pub const DEVICE_ID: &str = "chef_bot_device_id";

/// Keys removed on logout, in clearing order.
pub const SESSION_KEYS: &[&str] = &[ACCESS_TOKEN, REFRESH_TOKEN, TOKEN_EXPIRY, USER];
