//! Service layer: remote API clients and local file I/O
//!
//! Each external API sits behind an async trait so the pipelines can be driven by
//! the real HTTP clients in production and by in-memory doubles in tests.

pub mod io;
pub mod openai;
pub mod picsart;

use crate::error::Result;
use crate::response::RawResponse;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::path::PathBuf;

pub use openai::OpenAiImageClient;
pub use picsart::PicsartClient;

/// An input image loaded into memory, ready to upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputImage {
    /// Path the image was read from
    pub path: PathBuf,
    /// File name sent in the multipart part
    pub file_name: String,
    /// Detected MIME type
    pub mime: &'static str,
    pub bytes: Bytes,
}

/// One edit request carrying every input image
#[derive(Debug, Clone)]
pub struct EditRequest {
    pub model: String,
    pub prompt: String,
    pub images: Vec<InputImage>,
}

/// One result of an edit request, still base64-encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditedImage {
    pub b64_json: String,
}

/// Result of fetching a processed image from its download URL
pub enum DownloadResponse {
    /// Status 200; the body arrives as a stream of chunks
    Stream(BoxStream<'static, Result<Bytes>>),
    /// Any other status, with the response text for diagnostics
    Failed { status: u16, text: String },
}

impl std::fmt::Debug for DownloadResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stream(_) => f.write_str("DownloadResponse::Stream(..)"),
            Self::Failed { status, text } => f
                .debug_struct("DownloadResponse::Failed")
                .field("status", status)
                .field("text", text)
                .finish(),
        }
    }
}

/// Image generation service able to edit a batch of images from one instruction
#[async_trait]
pub trait ImageEditService: Send + Sync {
    /// Send one edit request and return its results in order
    ///
    /// # Errors
    /// - Transport failures
    /// - Non-success HTTP status
    /// - Response body without the expected `data` list
    async fn edit(&self, request: EditRequest) -> Result<Vec<EditedImage>>;
}

/// Background removal service with a two-step submit/download protocol
#[async_trait]
pub trait BackgroundRemovalService: Send + Sync {
    /// Whether an access credential is available; nothing is sent without one
    fn is_configured(&self) -> bool;

    /// Upload an image for background removal
    ///
    /// # Errors
    /// - Transport failures (a non-200 status is not an error here)
    async fn submit(&self, image: InputImage) -> Result<RawResponse>;

    /// Fetch the processed image from the URL returned by [`Self::submit`]
    ///
    /// # Errors
    /// - Transport failures before a status line was received
    async fn download(&self, url: &str) -> Result<DownloadResponse>;
}
