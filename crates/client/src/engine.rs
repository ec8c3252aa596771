//! Request/retry engine.
//!
//! [`RequestEngine`] builds requests against the primary base URL,
//! attaches the active bearer token, retries transport failures with a
//! fixed delay, and finally makes exactly one attempt against the fallback
//! base URL. HTTP error statuses end the request immediately.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use chefbot_core::error::CoreError;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

// ---------------------------------------------------------------------------
// Request description
// ---------------------------------------------------------------------------

/// One file attached to a multipart body.
#[derive(Debug, Clone)]
pub struct FilePart {
    /// Form field name, e.g. `file`.
    pub field: String,
    pub file_name: String,
    /// MIME type, e.g. `image/jpeg`.
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Multipart payload kept in owned form so it can be rebuilt for every
/// attempt.
#[derive(Debug, Clone, Default)]
pub struct MultipartPayload {
    pub text: Vec<(String, String)>,
    pub files: Vec<FilePart>,
}

impl MultipartPayload {
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.text.push((name.into(), value.into()));
        self
    }

    pub fn file(mut self, part: FilePart) -> Self {
        self.files.push(part);
        self
    }

    fn to_form(&self) -> ClientResult<Form> {
        let mut form = Form::new();
        for (name, value) in &self.text {
            form = form.text(name.clone(), value.clone());
        }
        for file in &self.files {
            let part = Part::bytes(file.bytes.clone())
                .file_name(file.file_name.clone())
                .mime_str(&file.mime)
                .map_err(|_| {
                    CoreError::Validation(format!("Invalid MIME type '{}'", file.mime))
                })?;
            form = form.part(file.field.clone(), part);
        }
        Ok(form)
    }
}

#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(MultipartPayload),
}

/// Method, body, extra headers, and retry policy of a request.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: RequestBody,
    /// Merged over the defaults; a caller-supplied `Content-Type` or
    /// `Authorization` replaces the engine's.
    pub headers: HeaderMap,
    /// When false the request makes a single attempt against the primary
    /// URL and never touches the fallback.
    pub retry: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: RequestBody::Empty,
            headers: HeaderMap::new(),
            retry: true,
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post_json(body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            body: RequestBody::Json(body),
            ..Self::default()
        }
    }

    pub fn post_multipart(payload: MultipartPayload) -> Self {
        Self {
            method: Method::POST,
            body: RequestBody::Multipart(payload),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Disable retries and the fallback.
    pub fn single_attempt(mut self) -> Self {
        self.retry = false;
        self
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// HTTP engine shared by every API call of a client instance.
///
/// Holds the active bearer token behind an async `RwLock`; designed to be
/// wrapped in `Arc`.
pub struct RequestEngine {
    http: reqwest::Client,
    base_url: String,
    fallback_url: String,
    max_retries: u32,
    retry_delay: Duration,
    timeout: Duration,
    token: RwLock<Option<String>>,
}

impl RequestEngine {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create an engine reusing an existing [`reqwest::Client`].
    pub fn with_client(http: reqwest::Client, config: &ClientConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
            fallback_url: config.fallback_url.clone(),
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
            timeout: config.request_timeout,
            token: RwLock::new(None),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn fallback_url(&self) -> &str {
        &self.fallback_url
    }

    /// Replace the active bearer token. `None` makes requests anonymous.
    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Send a request and decode the JSON response into `T`.
    ///
    /// The bearer token is read once, so every attempt of this request
    /// carries the same credential.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: &RequestOptions,
    ) -> ClientResult<T> {
        let token = self.token().await;
        let attempts = if options.retry {
            self.max_retries.saturating_add(1)
        } else {
            1
        };

        let mut attempt = 1;
        let primary_err = loop {
            tracing::debug!(endpoint, attempt, attempts, "API request to primary URL");

            match self.attempt(&self.base_url, endpoint, options, token.as_deref()).await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) if attempt >= attempts => break e,
                Err(e) => {
                    tracing::warn!(
                        endpoint,
                        attempt,
                        error = %e,
                        delay_ms = self.retry_delay.as_millis() as u64,
                        "Primary URL failed, retrying",
                    );
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
            }
        };

        if !options.retry {
            return Err(primary_err);
        }

        tracing::info!(
            endpoint,
            fallback = %self.fallback_url,
            error = %primary_err,
            "Primary URL exhausted, trying fallback",
        );

        match self
            .attempt(&self.fallback_url, endpoint, options, token.as_deref())
            .await
        {
            Ok(value) => Ok(value),
            Err(fallback_err) => {
                tracing::error!(
                    endpoint,
                    error = %fallback_err,
                    "Both primary and fallback URLs failed",
                );
                Err(primary_err)
            }
        }
    }

    /// [`request`](Self::request) returning raw JSON.
    pub async fn request_json(
        &self,
        endpoint: &str,
        options: &RequestOptions,
    ) -> ClientResult<serde_json::Value> {
        self.request(endpoint, options).await
    }

    // ---- private helpers ----

    /// One attempt against one base URL, bounded by the attempt timeout.
    async fn attempt<T: DeserializeOwned>(
        &self,
        base: &str,
        endpoint: &str,
        options: &RequestOptions,
        token: Option<&str>,
    ) -> ClientResult<T> {
        let url = format!("{base}{endpoint}");
        let builder = self.build(&url, options, token)?;

        match tokio::time::timeout(self.timeout, Self::execute(builder)).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout {
                url,
                after: self.timeout,
            }),
        }
    }

    fn build(
        &self,
        url: &str,
        options: &RequestOptions,
        token: Option<&str>,
    ) -> ClientResult<reqwest::RequestBuilder> {
        let mut builder = self.http.request(options.method.clone(), url);

        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        builder = match &options.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => {
                let builder = if options.headers.contains_key(CONTENT_TYPE) {
                    builder
                } else {
                    builder.header(CONTENT_TYPE, "application/json")
                };
                builder.body(serde_json::to_vec(value)?)
            }
            RequestBody::Multipart(payload) => builder.multipart(payload.to_form()?),
        };

        Ok(builder.headers(options.headers.clone()))
    }

    async fn execute<T: DeserializeOwned>(builder: reqwest::RequestBuilder) -> ClientResult<T> {
        let response = builder.send().await?;
        let status = response.status();
        tracing::debug!(status = status.as_u16(), url = %response.url(), "API response");

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::warn!(status = status.as_u16(), body = %body, "API error response");
            return Err(ClientError::from_response(status.as_u16(), body));
        }

        let text = response.text().await?;
        let text = if text.trim().is_empty() { "null" } else { &text };
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_retrying_get() {
        let options = RequestOptions::get();
        assert_eq!(options.method, Method::GET);
        assert!(options.retry);
        assert!(matches!(options.body, RequestBody::Empty));
    }

    #[test]
    fn single_attempt_disables_retry() {
        let options = RequestOptions::post_json(serde_json::json!({})).single_attempt();
        assert_eq!(options.method, Method::POST);
        assert!(!options.retry);
    }

    #[test]
    fn multipart_rejects_bad_mime() {
        let payload = MultipartPayload::default().file(FilePart {
            field: "file".into(),
            file_name: "x.jpg".into(),
            mime: "not a mime".into(),
            bytes: vec![1, 2, 3],
        });
        assert!(matches!(payload.to_form(), Err(ClientError::Validation(_))));
    }

    #[tokio::test]
    async fn token_can_be_set_and_cleared() {
        let engine = RequestEngine::new(&ClientConfig::new("http://localhost:1"));
        assert!(engine.token().await.is_none());
        engine.set_token(Some("T1".into())).await;
        assert_eq!(engine.token().await.as_deref(), Some("T1"));
        engine.set_token(None).await;
        assert!(engine.token().await.is_none());
    }
}
