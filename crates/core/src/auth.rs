//! Request and response payloads of the `/api/auth/*` endpoints.

use serde::{Deserialize, Serialize};

use crate::device::DeviceIdentity;

/// Body of signup and plain login.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialsRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of the device-aware login.
#[derive(Debug, Clone, Serialize)]
pub struct SecureLoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub device_id: &'a str,
    pub device_info: serde_json::Value,
}

impl<'a> SecureLoginRequest<'a> {
    pub fn new(email: &'a str, password: &'a str, device: &'a DeviceIdentity) -> Self {
        Self {
            email,
            password,
            device_id: &device.device_id,
            device_info: device.device_info(),
        }
    }
}

/// Body of refresh and logout.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshTokenRequest<'a> {
    pub refresh_token: &'a str,
}

/// Profile obtained from a completed Google sign-in, bridged to the
/// backend via `POST /api/auth/google`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoogleProfile {
    pub email: String,
    pub name: String,
    #[serde(rename = "googleId")]
    pub google_id: String,
    #[serde(rename = "idToken")]
    pub id_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

/// Response of every endpoint that issues tokens.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthResponse {
    /// Access token.
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: serde_json::Value,
    /// Access-token lifetime in seconds, when the backend declares one.
    #[serde(default)]
    pub expires_in: Option<i64>,
}
