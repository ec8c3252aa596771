//! Per-install device identity.
//!
//! The backend binds refresh tokens to a device id so a session can be
//! revoked per installation. The id is advisory metadata, not a security
//! boundary: it only needs practical collision avoidance.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Length of the random base-36 suffix.
pub const SUFFIX_LEN: usize = 9;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Identity generated once per install and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub device_id: String,
    pub platform: String,
}

impl DeviceIdentity {
    /// Generate a fresh identity for `platform` using the current time and
    /// the thread-local RNG.
    pub fn generate(platform: &str) -> Self {
        Self::generate_with(platform, crate::types::now_millis(), &mut rand::rng())
    }

    /// Generate an identity of the form `<platform>_<epoch-ms>_<suffix>`.
    pub fn generate_with<R: Rng + ?Sized>(platform: &str, now_millis: i64, rng: &mut R) -> Self {
        let platform = normalize_platform(platform);
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
            .collect();

        Self {
            device_id: format!("{platform}_{now_millis}_{suffix}"),
            platform,
        }
    }

    /// Whether a persisted identity is usable. Empty ids or platforms are
    /// treated as corrupt and regenerated by the caller.
    pub fn is_well_formed(&self) -> bool {
        !self.device_id.trim().is_empty() && !self.platform.trim().is_empty()
    }

    /// Metadata sent alongside the id on device-aware login.
    pub fn device_info(&self) -> serde_json::Value {
        serde_json::json!({
            "platform": self.platform,
            "client": "chefbot-rs",
            "version": env!("CARGO_PKG_VERSION"),
        })
    }
}

/// Lowercase the platform name and replace separators so it cannot
/// collide with the `_` delimiter. Empty input becomes `"unknown"`.
pub fn normalize_platform(platform: &str) -> String {
    let normalized: String = platform
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();

    if normalized.is_empty() {
        "unknown".to_string()
    } else {
        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn id_has_platform_timestamp_and_suffix() {
        let mut rng = StdRng::seed_from_u64(7);
        let identity = DeviceIdentity::generate_with("iOS", 1_700_000_000_000, &mut rng);

        assert_eq!(identity.platform, "ios");
        let parts: Vec<&str> = identity.device_id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ios");
        assert_eq!(parts[1], "1700000000000");
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(parts[2].bytes().all(|b| BASE36.contains(&b)));
    }

    #[test]
    fn different_seeds_give_different_ids() {
        let a = DeviceIdentity::generate_with("linux", 1, &mut StdRng::seed_from_u64(1));
        let b = DeviceIdentity::generate_with("linux", 1, &mut StdRng::seed_from_u64(2));
        assert_ne!(a.device_id, b.device_id);
    }

    #[test]
    fn platform_is_normalized() {
        assert_eq!(normalize_platform(" Mac_OS "), "mac-os");
        assert_eq!(normalize_platform(""), "unknown");
    }

    #[test]
    fn empty_identity_is_not_well_formed() {
        let identity = DeviceIdentity {
            device_id: String::new(),
            platform: "android".into(),
        };
        assert!(!identity.is_well_formed());
        assert!(DeviceIdentity::generate("android").is_well_formed());
    }

    #[test]
    fn device_info_reports_platform() {
        let identity = DeviceIdentity::generate("android");
        assert_eq!(identity.device_info()["platform"], "android");
    }
}
