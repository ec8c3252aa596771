//! Classification of backend error responses.
//!
//! The backend reports failures as a status code plus a FastAPI-style
//! `{"detail": "..."}` body. [`classify`] decodes that pair once into an
//! [`ApiErrorCode`] so callers branch on a machine-checkable value instead
//! of searching message text.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Error codes
// ---------------------------------------------------------------------------

/// Machine-checkable reason for a rejected request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorCode {
    /// Signup with an email that already has an account.
    EmailAlreadyRegistered,
    /// Wrong email/password combination.
    InvalidCredentials,
    /// Missing, expired, or rejected bearer token.
    NotAuthenticated,
    /// The account already holds a session on another device.
    DeviceConflict,
    /// Any other 409.
    Conflict,
    /// Free-plan monthly analysis quota exhausted.
    UsageLimitReached,
    /// Per-hour request rate exceeded.
    RateLimited,
    /// Malformed or rejected input (400/422).
    InvalidRequest,
    NotFound,
    /// 5xx from the backend.
    #[serde(rename = "SERVER_ERROR")]
    Server,
    Unknown,
}

/// User-facing follow-up a front end can offer for an [`ApiErrorCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    SwitchToLogin,
    SwitchToSignup,
    Reauthenticate,
    UpgradePlan,
    RetryLater,
}

impl ApiErrorCode {
    /// Stable string form, e.g. `"EMAIL_ALREADY_REGISTERED"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmailAlreadyRegistered => "EMAIL_ALREADY_REGISTERED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::DeviceConflict => "DEVICE_CONFLICT",
            Self::Conflict => "CONFLICT",
            Self::UsageLimitReached => "USAGE_LIMIT_REACHED",
            Self::RateLimited => "RATE_LIMITED",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::NotFound => "NOT_FOUND",
            Self::Server => "SERVER_ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// The recovery a front end should offer, if any.
    pub fn suggested_action(self) -> Option<RecoveryAction> {
        match self {
            Self::EmailAlreadyRegistered => Some(RecoveryAction::SwitchToLogin),
            Self::InvalidCredentials => Some(RecoveryAction::SwitchToSignup),
            Self::NotAuthenticated => Some(RecoveryAction::Reauthenticate),
            Self::UsageLimitReached => Some(RecoveryAction::UpgradePlan),
            Self::RateLimited | Self::Server => Some(RecoveryAction::RetryLater),
            Self::DeviceConflict
            | Self::Conflict
            | Self::InvalidRequest
            | Self::NotFound
            | Self::Unknown => None,
        }
    }
}

impl std::fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Extract the human-readable message from an error body.
///
/// Returns the `detail` string of a FastAPI error object, or the first
/// `msg` of a 422 validation array. Anything else yields `None`.
pub fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => items
            .iter()
            .find_map(|item| item.get("msg").and_then(|m| m.as_str()))
            .map(str::to_string),
        _ => None,
    }
}

/// Decode a failed response into its error code and optional detail text.
///
/// Detail matching is case-insensitive. When the body carries no JSON
/// detail the raw text is matched instead.
pub fn classify(status: u16, body: &str) -> (ApiErrorCode, Option<String>) {
    let detail = extract_detail(body);
    let haystack = detail.as_deref().unwrap_or(body).to_lowercase();

    let code = match status {
        409 if haystack.contains("already registered") => ApiErrorCode::EmailAlreadyRegistered,
        409 if haystack.contains("another device") => ApiErrorCode::DeviceConflict,
        409 => ApiErrorCode::Conflict,
        401 if haystack.contains("email or password") || haystack.contains("credentials") => {
            ApiErrorCode::InvalidCredentials
        }
        401 | 403 => ApiErrorCode::NotAuthenticated,
        429 if haystack.contains("limit reached") => ApiErrorCode::UsageLimitReached,
        429 => ApiErrorCode::RateLimited,
        400 | 422 => ApiErrorCode::InvalidRequest,
        404 => ApiErrorCode::NotFound,
        500..=599 => ApiErrorCode::Server,
        _ => ApiErrorCode::Unknown,
    };

    (code, detail)
}
