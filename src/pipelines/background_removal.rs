//! Remove the background of one image through a submit/download service
//!
//! Every failure is turned into a logged diagnostic: [`BackgroundRemovalPipeline::run`]
//! never returns an error, it returns `None` instead.

use crate::error::{ImageEditError, Result};
use crate::response::RemovalOutcome;
use crate::services::{io, BackgroundRemovalService, DownloadResponse};
use std::path::{Path, PathBuf};
use tracing::Instrument;

/// Default streaming buffer size for downloads
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Input image and destination of one removal run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalJob {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub file_name: String,
}

impl RemovalJob {
    pub fn new<I, O, N>(input: I, output_dir: O, file_name: N) -> Self
    where
        I: Into<PathBuf>,
        O: Into<PathBuf>,
        N: Into<String>,
    {
        Self {
            input: input.into(),
            output_dir: output_dir.into(),
            file_name: file_name.into(),
        }
    }

    /// Full path of the output file
    pub fn destination(&self) -> PathBuf {
        self.output_dir.join(&self.file_name)
    }
}

/// Background-removal pipeline bound to one removal service
pub struct BackgroundRemovalPipeline<S> {
    service: S,
    chunk_size: usize,
}

impl<S: BackgroundRemovalService> BackgroundRemovalPipeline<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set the buffer size used while streaming downloads to disk
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Run the job, logging any failure instead of returning it
    ///
    /// Returns the written file on success.
    pub async fn run(&self, job: &RemovalJob) -> Option<PathBuf> {
        let span = tracing::info_span!(
            "remove_background",
            input = %job.input.display(),
            destination = %job.destination().display()
        );

        match self.process(job).instrument(span).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::error!(error = %e, "Background removal failed");
                None
            },
        }
    }

    /// Run the job and return the first failure
    ///
    /// # Errors
    /// - No credential configured (nothing is sent)
    /// - Input image missing or unreadable (nothing is sent)
    /// - Transport failure on upload or download
    /// - Non-200 status, unexpected JSON, or an empty body
    /// - Output directory or file cannot be written
    pub async fn process(&self, job: &RemovalJob) -> Result<PathBuf> {
        if !self.service.is_configured() {
            return Err(ImageEditError::MissingCredential { service: "Picsart" });
        }

        if !job.input.is_file() {
            return Err(ImageEditError::InputNotFound(job.input.clone()));
        }
        let image = io::read_input(&job.input).await?;

        tracing::info!("Removing background from {}...", image.file_name);
        let response = self.service.submit(image).await?;
        let outcome = RemovalOutcome::classify(&response);
        tracing::debug!(status = response.status, outcome = outcome.kind(), "Classified response");

        let destination = job.destination();
        match outcome {
            RemovalOutcome::HttpError { status, text } => {
                Err(ImageEditError::Api { status, body: text })
            },
            RemovalOutcome::Malformed { body } => Err(ImageEditError::unexpected_response(
                format!("API success, but unexpected JSON structure in response: {}", body),
            )),
            RemovalOutcome::Empty => Err(ImageEditError::unexpected_response(
                "response was not JSON and carried no content to save",
            )),
            RemovalOutcome::RawBytes { content } => {
                tracing::warn!(
                    size = content.len(),
                    "Response was not valid JSON; saving raw content"
                );
                io::ensure_dir(&job.output_dir).await?;
                io::write_file(&destination, &content).await?;
                tracing::info!("Saved raw API response content to: {}", destination.display());
                Ok(destination)
            },
            RemovalOutcome::Success { url } => {
                tracing::info!("Image processed successfully. Downloading from: {}", url);
                self.download_to(&url, &job.output_dir, &destination).await?;
                tracing::info!("Image downloaded and saved to: {}", destination.display());
                Ok(destination)
            },
        }
    }

    async fn download_to(&self, url: &str, output_dir: &Path, destination: &Path) -> Result<u64> {
        match self.service.download(url).await? {
            DownloadResponse::Failed { status, text } => {
                Err(ImageEditError::DownloadFailed { status, text })
            },
            DownloadResponse::Stream(stream) => {
                io::ensure_dir(output_dir).await?;
                let written = io::write_stream(destination, stream, self.chunk_size).await?;
                tracing::debug!(bytes = written, "Download complete");
                Ok(written)
            },
        }
    }
}
