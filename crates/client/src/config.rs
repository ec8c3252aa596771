use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ClientError, ClientResult};

/// Production API host.
pub const DEFAULT_API_URL: &str = "https://app-chef-bot-api.onrender.com";
/// Retries against the primary URL after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 2;
/// Fixed pause between primary attempts.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2_000;
/// Hard deadline for a single attempt.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// Client-assumed access-token lifetime when the backend declares none.
pub const DEFAULT_TOKEN_LIFETIME_HOURS: i64 = 24;
/// Upper bound accepted for `CHEFBOT_MAX_RETRIES`.
pub const MAX_RETRIES_LIMIT: u32 = 10;
/// Upper bound accepted for `CHEFBOT_TOKEN_LIFETIME_HOURS` (one year).
pub const MAX_TOKEN_LIFETIME_HOURS: i64 = 24 * 365;

/// Client configuration loaded from environment variables.
///
/// All fields have defaults matching the production mobile app.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Primary base URL, without trailing slash.
    pub base_url: String,
    /// Base URL tried once after the primary is exhausted.
    pub fallback_url: String,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub request_timeout: Duration,
    pub token_lifetime: chrono::Duration,
    /// Platform name used for the device identity.
    pub platform: String,
    /// Directory for persisted session state.
    pub data_dir: PathBuf,
    pub oauth: OAuthClientIds,
}

/// Platform-specific Google OAuth client IDs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OAuthClientIds {
    pub android: Option<String>,
    pub ios: Option<String>,
    pub web: Option<String>,
}

impl OAuthClientIds {
    /// Client ID for `platform`.
    ///
    /// Android and iOS use their own IDs. Every other platform uses the web
    /// ID and falls back to the iOS one, which the mobile app configured as
    /// its web client.
    pub fn for_platform(&self, platform: &str) -> Option<&str> {
        match platform {
            "android" => self.android.as_deref(),
            "ios" => self.ios.as_deref(),
            _ => self.web.as_deref().or(self.ios.as_deref()),
        }
    }
}

impl ClientConfig {
    /// Configuration pointing both primary and fallback at `base_url`,
    /// with every other field at its default.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = trim_base_url(&base_url.into());
        Self {
            fallback_url: base_url.clone(),
            base_url,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            token_lifetime: chrono::Duration::hours(DEFAULT_TOKEN_LIFETIME_HOURS),
            platform: std::env::consts::OS.to_string(),
            data_dir: default_data_dir(),
            oauth: OAuthClientIds::default(),
        }
    }

    /// Builder-style override of the fallback URL.
    pub fn with_fallback(mut self, fallback_url: impl Into<String>) -> Self {
        self.fallback_url = trim_base_url(&fallback_url.into());
        self
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default                                 |
    /// |---------------------------------|-----------------------------------------|
    /// | `CHEFBOT_API_URL`               | `https://app-chef-bot-api.onrender.com` |
    /// | `CHEFBOT_FALLBACK_URL`          | value of `CHEFBOT_API_URL`              |
    /// | `CHEFBOT_MAX_RETRIES`           | `2`                                     |
    /// | `CHEFBOT_RETRY_DELAY_MS`        | `2000`                                  |
    /// | `CHEFBOT_REQUEST_TIMEOUT_SECS`  | `30`                                    |
    /// | `CHEFBOT_TOKEN_LIFETIME_HOURS`  | `24`                                    |
    /// | `CHEFBOT_PLATFORM`              | host OS                                 |
    /// | `CHEFBOT_DATA_DIR`              | `<local data dir>/chefbot`              |
    /// | `GOOGLE_CLIENT_ID_ANDROID`      | --                                      |
    /// | `GOOGLE_CLIENT_ID_IOS`          | --                                      |
    /// | `GOOGLE_CLIENT_ID_WEB`          | --                                      |
    pub fn from_env() -> ClientResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> ClientResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = var("CHEFBOT_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into());
        validate_url("CHEFBOT_API_URL", &base_url)?;
        let mut config = Self::new(base_url);

        if let Some(fallback) = var("CHEFBOT_FALLBACK_URL") {
            validate_url("CHEFBOT_FALLBACK_URL", &fallback)?;
            config = config.with_fallback(fallback);
        }

        if let Some(v) = var("CHEFBOT_MAX_RETRIES") {
            let retries: u32 = parse_var("CHEFBOT_MAX_RETRIES", &v)?;
            if retries > MAX_RETRIES_LIMIT {
                return Err(ClientError::Config(format!(
                    "CHEFBOT_MAX_RETRIES must be at most {MAX_RETRIES_LIMIT}, got {retries}"
                )));
            }
            config.max_retries = retries;
        }
        if let Some(v) = var("CHEFBOT_RETRY_DELAY_MS") {
            config.retry_delay = Duration::from_millis(parse_var("CHEFBOT_RETRY_DELAY_MS", &v)?);
        }
        if let Some(v) = var("CHEFBOT_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = parse_var("CHEFBOT_REQUEST_TIMEOUT_SECS", &v)?;
            if secs == 0 {
                return Err(ClientError::Config(
                    "CHEFBOT_REQUEST_TIMEOUT_SECS must be greater than zero".into(),
                ));
            }
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(v) = var("CHEFBOT_TOKEN_LIFETIME_HOURS") {
            let hours: i64 = parse_var("CHEFBOT_TOKEN_LIFETIME_HOURS", &v)?;
            if !(1..=MAX_TOKEN_LIFETIME_HOURS).contains(&hours) {
                return Err(ClientError::Config(format!(
                    "CHEFBOT_TOKEN_LIFETIME_HOURS must be between 1 and {MAX_TOKEN_LIFETIME_HOURS}, got {hours}"
                )));
            }
            config.token_lifetime = chrono::Duration::try_hours(hours).ok_or_else(|| {
                ClientError::Config(format!("CHEFBOT_TOKEN_LIFETIME_HOURS out of range: {hours}"))
            })?;
        }
        if let Some(platform) = var("CHEFBOT_PLATFORM") {
            config.platform = platform.trim().to_lowercase();
        }
        if let Some(dir) = var("CHEFBOT_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        config.oauth = OAuthClientIds {
            android: var("GOOGLE_CLIENT_ID_ANDROID"),
            ios: var("GOOGLE_CLIENT_ID_IOS"),
            web: var("GOOGLE_CLIENT_ID_WEB"),
        };

        Ok(config)
    }

    /// Total attempts against the primary URL.
    pub fn primary_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// OAuth client ID for the configured platform.
    pub fn oauth_client_id(&self) -> Option<&str> {
        self.oauth.for_platform(&self.platform)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("chefbot")
}

fn trim_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn validate_url(key: &str, url: &str) -> ClientResult<()> {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ClientError::Config(format!(
            "{key} must be an http(s) URL, got '{url}'"
        )))
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> ClientResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ClientError::Config(format!("{key} has invalid value '{value}'")))
}
