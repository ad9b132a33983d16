//! Picsart background removal API client

use crate::config::BackgroundRemovalConfig;
use crate::error::{ImageEditError, Result};
use crate::response::RawResponse;
use crate::services::{BackgroundRemovalService, DownloadResponse, InputImage};
use async_trait::async_trait;
use futures::stream::{StreamExt, TryStreamExt};
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};

/// Header carrying the Picsart access key
const API_KEY_HEADER: &str = "x-picsart-api-key";

/// Client for the Picsart `removebg` tool and its result downloads
#[derive(Debug, Clone)]
pub struct PicsartClient {
    client: Client,
    config: BackgroundRemovalConfig,
}

impl PicsartClient {
    /// Create a client from validated settings
    ///
    /// # Errors
    /// - Invalid configuration
    /// - Failed to create HTTP client
    pub fn new(config: BackgroundRemovalConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.service.timeout)
            .build()
            .map_err(|e| ImageEditError::network_error("Failed to create HTTP client", e))?;

        Ok(Self { client, config })
    }

    /// Settings this client was created with
    pub fn config(&self) -> &BackgroundRemovalConfig {
        &self.config
    }

    fn build_form(&self, image: InputImage) -> Result<Form> {
        let part = Part::bytes(image.bytes.to_vec())
            .file_name(image.file_name)
            .mime_str(image.mime)
            .map_err(|e| ImageEditError::network_error("Invalid image MIME type", e))?;

        Ok(Form::new()
            .part("image", part)
            .text("format", self.config.output_format.clone())
            .text("output_type", self.config.output_type.clone()))
    }
}

#[async_trait]
impl BackgroundRemovalService for PicsartClient {
    fn is_configured(&self) -> bool {
        self.config.service.has_credential()
    }

    async fn submit(&self, image: InputImage) -> Result<RawResponse> {
        let api_key = self
            .config
            .service
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ImageEditError::MissingCredential { service: "Picsart" })?;
        let url = &self.config.service.base_url;
        let form = self.build_form(image)?;

        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .header(API_KEY_HEADER, api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ImageEditError::network_error(format!("Upload to {} failed", url), e))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ImageEditError::network_error("Failed to read removal response", e))?;

        tracing::debug!(status, size = body.len(), "Removal response received");
        Ok(RawResponse { status, body })
    }

    async fn download(&self, url: &str) -> Result<DownloadResponse> {
        let response =
            self.client.get(url).send().await.map_err(|e| {
                ImageEditError::network_error(format!("Failed to download {}", url), e)
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            return Ok(DownloadResponse::Failed {
                status: status.as_u16(),
                text,
            });
        }

        let stream = response
            .bytes_stream()
            .map_err(|e| ImageEditError::network_error("Failed to read download stream", e))
            .boxed();

        Ok(DownloadResponse::Stream(stream))
    }
}
