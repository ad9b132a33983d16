//! OpenAI images API client for multi-image edit requests

use crate::config::ServiceConfig;
use crate::error::{ImageEditError, Result};
use crate::services::{EditRequest, EditedImage, ImageEditService};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct EditResponseBody {
    data: Vec<EditResponseItem>,
}

#[derive(Debug, Deserialize)]
struct EditResponseItem {
    b64_json: Option<String>,
}

/// Client for `POST {base_url}/images/edits`
///
/// One `reqwest::Client` is built per instance and reused for every call.
#[derive(Debug, Clone)]
pub struct OpenAiImageClient {
    client: Client,
    config: ServiceConfig,
}

impl OpenAiImageClient {
    /// Create a client from validated service settings
    ///
    /// # Errors
    /// - Invalid service settings
    /// - Failed to create HTTP client
    pub fn new(config: ServiceConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ImageEditError::network_error("Failed to create HTTP client", e))?;

        Ok(Self { client, config })
    }

    fn edits_url(&self) -> String {
        format!("{}/images/edits", self.config.base_url.trim_end_matches('/'))
    }

    fn build_form(request: EditRequest) -> Result<Form> {
        let mut form = Form::new()
            .text("model", request.model)
            .text("prompt", request.prompt);

        for image in request.images {
            let part = Part::bytes(image.bytes.to_vec())
                .file_name(image.file_name)
                .mime_str(image.mime)
                .map_err(|e| ImageEditError::network_error("Invalid image MIME type", e))?;
            form = form.part("image[]", part);
        }

        Ok(form)
    }
}

#[async_trait]
impl ImageEditService for OpenAiImageClient {
    async fn edit(&self, request: EditRequest) -> Result<Vec<EditedImage>> {
        if !self.config.has_credential() {
            tracing::warn!("OpenAI API key is not configured; the request will likely be rejected");
        }

        let url = self.edits_url();
        let image_count = request.images.len();
        let form = Self::build_form(request)?;

        tracing::debug!(url = %url, image_count, "Sending image edit request");

        let mut builder = self.client.post(&url).multipart(form);
        if let Some(key) = self.config.api_key.as_deref() {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ImageEditError::network_error(format!("Edit request to {} failed", url), e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ImageEditError::network_error("Failed to read edit response", e))?;

        if !status.is_success() {
            return Err(ImageEditError::Api {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let parsed: EditResponseBody = serde_json::from_slice(&body).map_err(|e| {
            ImageEditError::unexpected_response(format!(
                "edit response is not the expected JSON ({}): {}",
                e,
                String::from_utf8_lossy(&body)
            ))
        })?;

        tracing::debug!(result_count = parsed.data.len(), "Edit request completed");

        // Items without a payload are kept as empty strings so result indices stay
        // aligned with input indices; they fail later at decode time.
        Ok(parsed
            .data
            .into_iter()
            .map(|item| EditedImage {
                b64_json: item.b64_json.unwrap_or_default(),
            })
            .collect())
    }
}
