//! The backend's user record.
//!
//! The record is opaque to the client: it is stored and returned exactly
//! as received, with typed accessors for the fields front ends display.

use serde::{Deserialize, Serialize};

/// Plan tier assumed when the backend omits one.
pub const DEFAULT_PLAN: &str = "free";

/// User record as returned by login, signup, refresh, and `/api/auth/me`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRecord(serde_json::Map<String, serde_json::Value>);

impl UserRecord {
    /// Wrap a JSON value. Returns `None` unless it is a non-empty object.
    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Object(map) if !map.is_empty() => Some(Self(map)),
            _ => None,
        }
    }

    /// User id rendered as a string; numeric ids are formatted.
    pub fn id(&self) -> Option<String> {
        match self.0.get("id")? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn email(&self) -> Option<&str> {
        self.0.get("email").and_then(|v| v.as_str())
    }

    /// Plan tier, defaulting to [`DEFAULT_PLAN`].
    pub fn plan(&self) -> &str {
        self.0
            .get("plan")
            .and_then(|v| v.as_str())
            .unwrap_or(DEFAULT_PLAN)
    }

    /// Analyses used in the current month.
    pub fn monthly_usage(&self) -> Option<u64> {
        self.0.get("monthly_usage").and_then(|v| v.as_u64())
    }

    /// Month the usage counter applies to, as `YYYY-MM`.
    pub fn usage_month(&self) -> Option<&str> {
        self.0.get("usage_month").and_then(|v| v.as_str())
    }

    /// Raw field access for anything without a typed accessor.
    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.0.get(field)
    }
}
