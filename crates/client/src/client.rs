//! High-level API facade.

use std::path::Path;
use std::sync::Arc;

use chefbot_core::error::CoreError;
use chefbot_core::endpoints;
use chefbot_core::recipe::AnalyzeResult;

use crate::config::ClientConfig;
use crate::engine::{FilePart, MultipartPayload, RequestEngine, RequestOptions};
use crate::error::{ClientError, ClientResult};
use crate::session::SessionManager;
use crate::storage::{FileStorage, SessionStorage};

/// Default prompt sent with every photo.
pub const DEFAULT_ANALYZE_PROMPT: &str =
    "Identify the ingredients in this fridge photo and suggest recipes I can cook with them.";

/// File name used when the caller provides none.
const DEFAULT_IMAGE_NAME: &str = "fridge.jpg";

/// Entry point for talking to the ChefBot backend.
///
/// Owns the shared [`RequestEngine`] and the [`SessionManager`] that keeps
/// its bearer token current.
pub struct ChefBotClient<S: SessionStorage> {
    config: ClientConfig,
    engine: Arc<RequestEngine>,
    session: SessionManager<S>,
}

impl ChefBotClient<FileStorage> {
    /// Client persisting its session under `config.data_dir`.
    pub async fn open(config: ClientConfig) -> ClientResult<Self> {
        let storage = FileStorage::new(config.data_dir.clone()).await?;
        Ok(Self::with_storage(config, Arc::new(storage)))
    }
}

impl<S: SessionStorage> ChefBotClient<S> {
    pub fn with_storage(config: ClientConfig, storage: Arc<S>) -> Self {
        let engine = Arc::new(RequestEngine::new(&config));
        let session = SessionManager::new(engine.clone(), storage, &config);
        Self {
            config,
            engine,
            session,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn engine(&self) -> &RequestEngine {
        &self.engine
    }

    pub fn session(&self) -> &SessionManager<S> {
        &self.session
    }

    /// `GET /api/health`.
    pub async fn health(&self) -> ClientResult<serde_json::Value> {
        self.engine
            .request_json(endpoints::HEALTH, &RequestOptions::get())
            .await
    }

    /// Upload an image file for ingredient detection and recipe suggestions.
    ///
    /// The MIME type is guessed from the extension and must be an image
    /// type.
    pub async fn analyze_image(
        &self,
        path: impl AsRef<Path>,
        prompt: Option<&str>,
    ) -> ClientResult<AnalyzeResult> {
        let path = path.as_ref();
        let mime = mime_guess::from_path(path).first().ok_or_else(|| {
            CoreError::Validation(format!("Cannot determine image type of {}", path.display()))
        })?;
        if mime.type_() != mime_guess::mime::IMAGE {
            return Err(CoreError::Validation(format!(
                "{} is not an image ({mime})",
                path.display()
            ))
            .into());
        }

        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(DEFAULT_IMAGE_NAME);

        self.analyze_image_bytes(bytes, file_name, mime.essence_str(), prompt)
            .await
    }

    /// Upload in-memory image bytes.
    ///
    /// Requires a session; an expired token is refreshed first. The upload
    /// is a single attempt: every analysis counts against the monthly quota.
    pub async fn analyze_image_bytes(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        mime: &str,
        prompt: Option<&str>,
    ) -> ClientResult<AnalyzeResult> {
        if bytes.is_empty() {
            return Err(CoreError::Validation("Image is empty".into()).into());
        }
        if !mime.starts_with("image/") {
            return Err(CoreError::Validation(format!("'{mime}' is not an image type")).into());
        }

        if self.session.get_valid_token().await?.is_none() {
            return Err(ClientError::Auth("sign in to analyze images".into()));
        }

        let size = bytes.len();
        let payload = MultipartPayload::default()
            .file(FilePart {
                field: "file".into(),
                file_name: file_name.to_string(),
                mime: mime.to_string(),
                bytes,
            })
            .text("prompt", prompt.unwrap_or(DEFAULT_ANALYZE_PROMPT));

        tracing::info!(file_name, size, mime, "Uploading image for analysis");
        let result: AnalyzeResult = self
            .engine
            .request(
                endpoints::ANALYZE,
                &RequestOptions::post_multipart(payload).single_attempt(),
            )
            .await?;
        tracing::info!(
            ingredients = result.ingredients.len(),
            recipes = result.recipes.len(),
            "Image analyzed",
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::storage::MemoryStorage;

    fn client() -> ChefBotClient<MemoryStorage> {
        ChefBotClient::with_storage(
            ClientConfig::new("http://127.0.0.1:1"),
            Arc::new(MemoryStorage::new()),
        )
    }

    #[tokio::test]
    async fn non_image_files_are_rejected() {
        let err = client().analyze_image("notes.txt", None).await.unwrap_err();
        assert_matches!(err, ClientError::Validation(_));
    }

    #[tokio::test]
    async fn empty_upload_is_rejected() {
        let err = client()
            .analyze_image_bytes(Vec::new(), "fridge.jpg", "image/jpeg", None)
            .await
            .unwrap_err();
        assert_matches!(err, ClientError::Validation(_));
    }

    #[tokio::test]
    async fn analysis_requires_a_session() {
        let err = client()
            .analyze_image_bytes(vec![0xff, 0xd8], "fridge.jpg", "image/jpeg", None)
            .await
            .unwrap_err();
        assert_matches!(err, ClientError::Auth(_));
    }
}
