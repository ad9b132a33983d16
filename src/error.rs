//! Error types for image editing operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for image editing operations
pub type Result<T> = std::result::Result<T, ImageEditError>;

/// Error types covering local preconditions, transport and payload failures
#[derive(Error, Debug)]
pub enum ImageEditError {
    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A required access key is not configured
    #[error("Missing credential: {service} API key is not configured")]
    MissingCredential { service: &'static str },

    /// An input image does not exist
    #[error("Image file not found at {}", .0.display())]
    InputNotFound(PathBuf),

    /// Connection, timeout or other transport failures
    #[error("Network error: {context}: {source}")]
    Network {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    /// The remote service answered with a non-success status
    #[error("API error: status {status}: {body}")]
    Api { status: u16, body: String },

    /// Fetching a processed image from its result URL failed
    #[error("Error downloading processed image: status {status}: {text}")]
    DownloadFailed { status: u16, text: String },

    /// The response body did not have the expected shape
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// A base64 image payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ImageEditError {
    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new unexpected response error
    pub fn unexpected_response<S: Into<String>>(msg: S) -> Self {
        Self::UnexpectedResponse(msg.into())
    }

    /// Create a transport error with request context
    pub fn network_error<S: Into<String>>(context: S, source: reqwest::Error) -> Self {
        Self::Network {
            context: context.into(),
            source,
        }
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }

    /// Create configuration error with the accepted values
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
    ) -> Self {
        Self::InvalidConfig(format!(
            "Invalid {}: {} (valid range: {})",
            parameter, value, valid_range
        ))
    }

    /// Whether the failure happened before any request was sent
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential { .. } | Self::InputNotFound(_) | Self::InvalidConfig(_)
        )
    }
}
