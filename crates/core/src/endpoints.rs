//! REST endpoint paths consumed by the client, relative to a base URL.

pub const HEALTH: &str = "/api/health";

pub const SIGNUP: &str = "/api/auth/signup";
pub const LOGIN: &str = "/api/auth/login";

/// Device-aware login. Older backends answer 404 here; callers fall back
/// to [`LOGIN`].
pub const SECURE_LOGIN: &str = "/api/auth/secure-login";

pub const REFRESH: &str = "/api/auth/refresh";
pub const LOGOUT: &str = "/api/auth/logout";
pub const PROFILE: &str = "/api/auth/me";
pub const GOOGLE_AUTH: &str = "/api/auth/google";

/// Multipart image upload: `file` part plus a `prompt` text field.
pub const ANALYZE: &str = "/api/analyze";
